use std::fmt;
use std::str::FromStr;

use super::error::SelectorError;

/// A named contextual value a condition or `%{...}` variable can look up.
///
/// Parsed from text as `name` or `name:key`, e.g. `server-name`, `header:Host`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Selector {
    Header(String),
    Cookie(String),
    Param(String),
    Attribute(String),
    SessionAttribute(String),
    UserInRole(String),
    ServerName,
    Port,
    ContextPath,
    ContentType,
    ContentLength,
    CharacterEncoding,
    RemoteHost,
    RemoteAddr,
    RemoteUser,
    RequestUri,
    RequestUrl,
    Method,
    Scheme,
    Protocol,
    QueryString,
    AuthType,
    PathInfo,
}

impl Selector {
    /// Selectors whose values are compared as integers.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Selector::Port | Selector::ContentLength)
    }

    /// The key part of a keyed selector.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Selector::Header(k)
            | Selector::Cookie(k)
            | Selector::Param(k)
            | Selector::Attribute(k)
            | Selector::SessionAttribute(k)
            | Selector::UserInRole(k) => Some(k),
            _ => None,
        }
    }

    /// Build a selector from a type name and an optional key, the way condition
    /// definitions carry them separately.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for unknown names or keyed names without a key.
    pub fn with_key(name: &str, key: Option<&str>) -> Result<Self, SelectorError> {
        let name = name.trim();
        let keyed = |build: fn(String) -> Selector| {
            key.map(|k| build(k.to_owned()))
                .ok_or_else(|| SelectorError::MissingKey(name.to_owned()))
        };
        match name.to_ascii_lowercase().as_str() {
            "header" => keyed(Selector::Header),
            "cookie" => keyed(Selector::Cookie),
            "param" | "parameter" => keyed(Selector::Param),
            "attribute" => keyed(Selector::Attribute),
            "session-attribute" => keyed(Selector::SessionAttribute),
            // the role may come from the condition value instead
            "user-in-role" => Ok(Selector::UserInRole(key.unwrap_or_default().to_owned())),
            "server-name" => Ok(Selector::ServerName),
            "port" => Ok(Selector::Port),
            "context-path" => Ok(Selector::ContextPath),
            "content-type" => Ok(Selector::ContentType),
            "content-length" => Ok(Selector::ContentLength),
            "character-encoding" => Ok(Selector::CharacterEncoding),
            "remote-host" => Ok(Selector::RemoteHost),
            "remote-addr" => Ok(Selector::RemoteAddr),
            "remote-user" => Ok(Selector::RemoteUser),
            "request-uri" => Ok(Selector::RequestUri),
            "request-url" => Ok(Selector::RequestUrl),
            "method" => Ok(Selector::Method),
            "scheme" => Ok(Selector::Scheme),
            "protocol" => Ok(Selector::Protocol),
            "query-string" => Ok(Selector::QueryString),
            "auth-type" => Ok(Selector::AuthType),
            "path-info" => Ok(Selector::PathInfo),
            _ => Err(SelectorError::Unknown(name.to_owned())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Selector::Header(_) => "header",
            Selector::Cookie(_) => "cookie",
            Selector::Param(_) => "param",
            Selector::Attribute(_) => "attribute",
            Selector::SessionAttribute(_) => "session-attribute",
            Selector::UserInRole(_) => "user-in-role",
            Selector::ServerName => "server-name",
            Selector::Port => "port",
            Selector::ContextPath => "context-path",
            Selector::ContentType => "content-type",
            Selector::ContentLength => "content-length",
            Selector::CharacterEncoding => "character-encoding",
            Selector::RemoteHost => "remote-host",
            Selector::RemoteAddr => "remote-addr",
            Selector::RemoteUser => "remote-user",
            Selector::RequestUri => "request-uri",
            Selector::RequestUrl => "request-url",
            Selector::Method => "method",
            Selector::Scheme => "scheme",
            Selector::Protocol => "protocol",
            Selector::QueryString => "query-string",
            Selector::AuthType => "auth-type",
            Selector::PathInfo => "path-info",
        }
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, key)) => Selector::with_key(name, Some(key)),
            None => Selector::with_key(s, None),
        }
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Selector> for String {
    fn from(s: Selector) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "{}:{key}", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}
