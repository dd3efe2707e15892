use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque value returned by an action, handed back to the container.
#[derive(Clone)]
pub struct ActionResult(Arc<dyn Any + Send + Sync>);

impl ActionResult {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionResult(..)")
    }
}

/// What a single rule evaluation decided.
#[derive(Debug, Clone)]
#[must_use]
pub enum RuleOutcome {
    /// The rule fired and rewrote the path.
    Matched {
        target: String,
        action_result: Option<ActionResult>,
    },
    /// The rule fired but only mutated state or ran actions.
    MatchedNoRewrite { action_result: Option<ActionResult> },
    /// The rule fired and no further rules should run.
    StopChain { action_result: Option<ActionResult> },
    /// The rule did not apply, or was not eligible to run.
    NoMatch,
}

impl RuleOutcome {
    /// The rewritten target, if the rule produced one.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            RuleOutcome::Matched { target, .. } => Some(target),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        !matches!(self, RuleOutcome::NoMatch)
    }

    #[must_use]
    pub fn stops_chain(&self) -> bool {
        matches!(self, RuleOutcome::StopChain { .. })
    }

    /// Result of the last action that produced one.
    #[must_use]
    pub fn action_result(&self) -> Option<&ActionResult> {
        match self {
            RuleOutcome::Matched { action_result, .. }
            | RuleOutcome::MatchedNoRewrite { action_result }
            | RuleOutcome::StopChain { action_result } => action_result.as_ref(),
            RuleOutcome::NoMatch => None,
        }
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Matched { target, .. } => write!(f, "matched -> {target}"),
            RuleOutcome::MatchedNoRewrite { .. } => write!(f, "matched, no rewrite"),
            RuleOutcome::StopChain { .. } => write!(f, "matched, stop chain"),
            RuleOutcome::NoMatch => write!(f, "no match"),
        }
    }
}
