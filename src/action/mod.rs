//! Externally supplied behavior invoked when a rule fires.
//!
//! Behaviors are registered up front in an [`ActionRegistry`]; rule
//! initialization binds each [`Action`] to one of their methods, either by an
//! explicit signature such as `run(int id, str)` or by probing the default
//! `(request, response)` and `(request, response, chain)` signatures.

mod args;
mod dispatch;
mod registry;

use std::collections::BTreeMap;

pub use args::{Arg, Continuation, Invocation, ParamKind, ParamSpec};
pub use dispatch::ResolvedAction;
pub use registry::{ActionRegistry, ActionResolver, Behavior, BehaviorBuilder, SkipLoading};

/// Parameters handed to a behavior's init hook.
pub type InitParams = BTreeMap<String, String>;

/// An action attached to a rule: which behavior to call and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub(crate) name: String,
    pub(crate) method: String,
    pub(crate) per_call: bool,
    pub(crate) init_params: InitParams,
}

impl Action {
    /// Method name used when none is given.
    pub const DEFAULT_METHOD: &'static str = "run";

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            method: Self::DEFAULT_METHOD.to_owned(),
            per_call: false,
            init_params: InitParams::new(),
        }
    }

    /// Method to call, optionally with an explicit signature:
    /// `run`, `run()`, `record(int id, str header:Host)`.
    #[must_use]
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_owned();
        self
    }

    /// Construct a fresh instance for every call instead of sharing one.
    #[must_use]
    pub fn per_call(mut self, per_call: bool) -> Self {
        self.per_call = per_call;
        self
    }

    #[must_use]
    pub fn init_param(mut self, name: &str, value: &str) -> Self {
        self.init_params.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method_str(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn init_params(&self) -> &InitParams {
        &self.init_params
    }
}
