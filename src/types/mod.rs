mod chain_report;
mod condition;
mod context;
mod error;
mod mutation;
mod outcome;
mod rule;
mod ruleset;
mod selector;

pub use chain_report::{ChainReport, RuleStep};
pub use condition::{Combinator, Condition, ConditionMatch, Operator};
pub use context::{Context, RequestContext, Response};
pub use error::{
    ActionInvocationError, ActionResolutionError, BoxError, InitError, PatternSyntaxError,
    SelectorError,
};
pub use mutation::{Mutation, MutationKind};
pub use outcome::{ActionResult, RuleOutcome};
pub use rule::{Rule, Target};
pub use ruleset::{ChainOutcome, RuleSet, RuleSetBuilder};
pub use selector::Selector;

pub(crate) use condition::CompiledCondition;
pub(crate) use rule::{CompiledRule, RuleState};
