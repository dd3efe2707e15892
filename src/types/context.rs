use std::collections::{HashMap, HashSet};

use super::mutation::MutationKind;
use super::selector::Selector;

/// The host container's view of one request/response exchange.
///
/// Conditions and `%{...}` variables read through [`lookup`](Self::lookup);
/// mutations write through [`apply`](Self::apply). The same object is handed to
/// actions wherever they declare a request-like or response-like parameter.
pub trait RequestContext {
    /// Resolve a contextual value. `None` (absent) is distinct from `Some("")`.
    fn lookup(&self, selector: &Selector) -> Option<String>;

    /// Whether the current user holds `role`.
    fn is_user_in_role(&self, role: &str) -> bool {
        let _ = role;
        false
    }

    /// Apply a rendered mutation to request or response state.
    fn apply(&mut self, kind: MutationKind, key: Option<&str>, value: &str);
}

/// Response-side state collected from mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub locale: Option<String>,
}

/// In-memory [`RequestContext`] mapping selectors to values.
///
/// Header names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<Selector, String>,
    roles: HashSet<String>,
    response: Response,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for a selector.
    #[must_use]
    pub fn set(mut self, selector: Selector, value: impl Into<String>) -> Self {
        self.insert(selector, value);
        self
    }

    /// Set the value for a selector (mutable reference version).
    pub fn insert(&mut self, selector: Selector, value: impl Into<String>) {
        self.values.insert(normalize(selector), value.into());
    }

    /// Remove a value, making the selector absent again.
    pub fn remove(&mut self, selector: &Selector) -> Option<String> {
        self.values.remove(&normalize(selector.clone()))
    }

    #[must_use]
    pub fn get(&self, selector: &Selector) -> Option<&str> {
        self.values
            .get(&normalize(selector.clone()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn header(self, name: &str, value: impl Into<String>) -> Self {
        self.set(Selector::Header(name.to_owned()), value)
    }

    #[must_use]
    pub fn cookie(self, name: &str, value: impl Into<String>) -> Self {
        self.set(Selector::Cookie(name.to_owned()), value)
    }

    #[must_use]
    pub fn param(self, name: &str, value: impl Into<String>) -> Self {
        self.set(Selector::Param(name.to_owned()), value)
    }

    #[must_use]
    pub fn port(self, port: u16) -> Self {
        self.set(Selector::Port, port.to_string())
    }

    #[must_use]
    pub fn server_name(self, name: impl Into<String>) -> Self {
        self.set(Selector::ServerName, name)
    }

    #[must_use]
    pub fn context_path(self, path: impl Into<String>) -> Self {
        self.set(Selector::ContextPath, path)
    }

    #[must_use]
    pub fn request_uri(self, uri: impl Into<String>) -> Self {
        self.set(Selector::RequestUri, uri)
    }

    /// Grant the current user a role.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }
}

impl RequestContext for Context {
    fn lookup(&self, selector: &Selector) -> Option<String> {
        if let Selector::UserInRole(role) = selector {
            return Some(self.is_user_in_role(role).to_string());
        }
        self.get(selector).map(str::to_owned)
    }

    fn is_user_in_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    fn apply(&mut self, kind: MutationKind, key: Option<&str>, value: &str) {
        let key = key.unwrap_or_default().to_owned();
        match kind {
            MutationKind::Attribute => self.insert(Selector::Attribute(key), value),
            MutationKind::SessionAttribute => self.insert(Selector::SessionAttribute(key), value),
            MutationKind::Parameter => self.insert(Selector::Param(key), value),
            MutationKind::Method => self.insert(Selector::Method, value),
            MutationKind::Header => self.response.headers.push((key, value.to_owned())),
            MutationKind::Cookie => self.response.cookies.push((key, value.to_owned())),
            MutationKind::Status => match value.trim().parse() {
                Ok(status) => self.response.status = Some(status),
                Err(_) => tracing::warn!(value, "ignoring non-numeric status"),
            },
            MutationKind::ContentType => self.response.content_type = Some(value.to_owned()),
            MutationKind::Charset => self.response.charset = Some(value.to_owned()),
            MutationKind::Locale => self.response.locale = Some(value.to_owned()),
        }
    }
}

fn normalize(selector: Selector) -> Selector {
    match selector {
        Selector::Header(name) => Selector::Header(name.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_lookup() {
        let ctx = Context::new().server_name("example.com").port(8080);
        assert_eq!(
            ctx.lookup(&Selector::ServerName),
            Some("example.com".to_owned())
        );
        assert_eq!(ctx.lookup(&Selector::Port), Some("8080".to_owned()));
    }

    #[test]
    fn missing_is_absent_not_empty() {
        let ctx = Context::new().header("x-empty", "");
        assert_eq!(ctx.lookup(&Selector::Header("x-empty".into())), Some(String::new()));
        assert_eq!(ctx.lookup(&Selector::Header("x-missing".into())), None);
    }

    #[test]
    fn header_names_ignore_case() {
        let ctx = Context::new().header("Host", "short.com");
        assert_eq!(
            ctx.lookup(&Selector::Header("HOST".into())),
            Some("short.com".to_owned())
        );
    }

    #[test]
    fn overwrite_value() {
        let ctx = Context::new().param("id", "1").param("id", "2");
        assert_eq!(ctx.get(&Selector::Param("id".into())), Some("2"));
    }

    #[test]
    fn remove_value() {
        let mut ctx = Context::new().port(80);
        assert_eq!(ctx.remove(&Selector::Port), Some("80".to_owned()));
        assert_eq!(ctx.lookup(&Selector::Port), None);
    }

    #[test]
    fn roles_render_as_bool() {
        let ctx = Context::new().role("admin");
        assert!(ctx.is_user_in_role("admin"));
        assert_eq!(
            ctx.lookup(&Selector::UserInRole("boss".into())),
            Some("false".to_owned())
        );
    }

    #[test]
    fn apply_request_side() {
        let mut ctx = Context::new().param("param1", "foo");
        ctx.apply(MutationKind::Parameter, Some("param1"), "bar");
        ctx.apply(MutationKind::Attribute, Some("seen"), "yes");
        assert_eq!(ctx.get(&Selector::Param("param1".into())), Some("bar"));
        assert_eq!(ctx.get(&Selector::Attribute("seen".into())), Some("yes"));
    }

    #[test]
    fn apply_response_side() {
        let mut ctx = Context::new();
        ctx.apply(MutationKind::Status, None, "302");
        ctx.apply(MutationKind::Header, Some("x-rewritten"), "1");
        ctx.apply(MutationKind::ContentType, None, "text/plain");
        assert_eq!(ctx.response().status, Some(302));
        assert_eq!(
            ctx.response().headers,
            vec![("x-rewritten".to_owned(), "1".to_owned())]
        );
        assert_eq!(ctx.response().content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn bad_status_is_ignored() {
        let mut ctx = Context::new();
        ctx.apply(MutationKind::Status, None, "abc");
        assert_eq!(ctx.response().status, None);
    }
}
