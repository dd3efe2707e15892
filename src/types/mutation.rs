use std::fmt;
use std::str::FromStr;

use crate::template::Template;

/// Where a mutation writes its rendered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MutationKind {
    Attribute,
    SessionAttribute,
    Parameter,
    Header,
    Cookie,
    Status,
    ContentType,
    Charset,
    Locale,
    Method,
}

impl MutationKind {
    /// Kinds that address a named slot and therefore need a key.
    #[must_use]
    pub fn requires_key(self) -> bool {
        matches!(
            self,
            MutationKind::Attribute
                | MutationKind::SessionAttribute
                | MutationKind::Parameter
                | MutationKind::Header
                | MutationKind::Cookie
        )
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationKind::Attribute => "attribute",
            MutationKind::SessionAttribute => "session-attribute",
            MutationKind::Parameter => "parameter",
            MutationKind::Header => "header",
            MutationKind::Cookie => "cookie",
            MutationKind::Status => "status",
            MutationKind::ContentType => "content-type",
            MutationKind::Charset => "charset",
            MutationKind::Locale => "locale",
            MutationKind::Method => "method",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MutationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "attribute" | "request" => Ok(MutationKind::Attribute),
            "session-attribute" | "session" => Ok(MutationKind::SessionAttribute),
            "parameter" | "param" => Ok(MutationKind::Parameter),
            "header" => Ok(MutationKind::Header),
            "cookie" => Ok(MutationKind::Cookie),
            "status" => Ok(MutationKind::Status),
            "content-type" => Ok(MutationKind::ContentType),
            "charset" => Ok(MutationKind::Charset),
            "locale" => Ok(MutationKind::Locale),
            "method" => Ok(MutationKind::Method),
            other => Err(format!("unknown mutation kind '{other}'")),
        }
    }
}

/// Writes a rendered value into request or response state after a rule
/// matches and before its actions run.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub(crate) kind: MutationKind,
    pub(crate) key: Option<String>,
    pub(crate) value: Template,
}

impl Mutation {
    pub fn new(kind: MutationKind, key: Option<&str>, value: &str) -> Self {
        Self {
            kind,
            key: key.map(str::to_owned),
            value: Template::new(value),
        }
    }

    /// Set a request attribute.
    pub fn attribute(key: &str, value: &str) -> Self {
        Self::new(MutationKind::Attribute, Some(key), value)
    }

    /// Replace a request parameter.
    pub fn parameter(key: &str, value: &str) -> Self {
        Self::new(MutationKind::Parameter, Some(key), value)
    }

    /// Add a response header.
    pub fn header(key: &str, value: &str) -> Self {
        Self::new(MutationKind::Header, Some(key), value)
    }

    /// Set the response status.
    pub fn status(value: &str) -> Self {
        Self::new(MutationKind::Status, None, value)
    }

    #[must_use]
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> &str {
        self.value.source()
    }

    /// Why this mutation cannot run, if anything.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let has_key = self.key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if self.kind.requires_key() && !has_key {
            return Err(format!("{} requires a name", self.kind));
        }
        Ok(())
    }
}
