use thiserror::Error;

use crate::parse::ParseError;
use crate::Dialect;

/// Boxed error raised by externally supplied action behavior.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A `from` or condition pattern the engine could not compile.
#[derive(Debug, Clone, Error)]
#[error("{dialect} pattern '{pattern}' is invalid: {message}")]
pub struct PatternSyntaxError {
    pub pattern: String,
    pub dialect: Dialect,
    pub message: String,
}

/// Problems found while initializing a rule. They are collected on the rule,
/// never thrown; a rule with any of them is marked invalid and skipped.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("from is not valid because it is blank")]
    BlankFrom,

    #[error(transparent)]
    Pattern(#[from] PatternSyntaxError),

    #[error("to is not valid because it is blank and the rule has no mutations or actions")]
    BlankTarget,

    #[error("condition {index} is invalid: {reason}")]
    Condition { index: usize, reason: String },

    #[error("mutation {index} is invalid: {reason}")]
    Mutation { index: usize, reason: String },

    #[error("action {index} could not be resolved: {source}")]
    Action {
        index: usize,
        #[source]
        source: ActionResolutionError,
    },
}

/// Failure to bind an action name and signature to a registered behavior.
#[derive(Debug, Error)]
pub enum ActionResolutionError {
    #[error("action name is blank")]
    BlankName,

    #[error("no behavior registered under '{name}'")]
    UnknownBehavior { name: String },

    #[error("could not find method '{method}' with a matching signature on '{name}'")]
    NoMatchingSignature { name: String, method: String },

    #[error(transparent)]
    Signature(#[from] ParseError),

    #[error("could not construct '{name}': {source}")]
    Construct {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// An action failed while running. This is the only error that escapes
/// [`Rule::evaluate`](crate::Rule::evaluate).
#[derive(Debug, Error)]
#[error("action '{action}' failed in '{method}': {source}")]
pub struct ActionInvocationError {
    pub action: String,
    pub method: String,
    #[source]
    pub source: BoxError,
}

/// Unknown selector text such as `header` without a key or `wibble`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unknown selector '{0}'")]
    Unknown(String),

    #[error("selector '{0}' requires a key")]
    MissingKey(String),
}
