use crate::action::ParamSpec;

/// A parsed action method string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    /// `None` when no parentheses were given and the default signatures
    /// should be probed; `Some(vec![])` for an explicit `name()`.
    pub params: Option<Vec<ParamSpec>>,
}
