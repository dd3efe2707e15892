//! Declarative request path rewriting.
//!
//! A [`Rule`] matches a request path against a regex or wildcard pattern,
//! checks [`Condition`]s on the request, applies [`Mutation`]s, runs
//! [`Action`]s and renders a rewritten target. A [`RuleSet`] runs rules in
//! order, feeding each rewritten target into the next.
//!
//! ```
//! use rewrite_rules::{Condition, Context, RuleSetBuilder, SkipLoading};
//!
//! let ruleset = RuleSetBuilder::new()
//!     .rule("/blog/**", |r| r.wildcard().to("/archive/$1"))
//!     .rule("^/archive/(.*)$", |r| {
//!         r.to("/mobile/$1")
//!             .condition(Condition::header("user-agent", "mobile"))
//!     })
//!     .compile(&SkipLoading);
//!
//! let mut ctx = Context::new().header("user-agent", "Mobile Safari");
//! let outcome = ruleset.process("/blog/2024/post", &mut ctx).unwrap();
//! assert_eq!(outcome.target(), Some("/mobile/2024/post"));
//! ```

pub mod action;
mod compile;
mod error;
mod evaluate;
pub mod parse;
mod pattern;
mod template;
mod types;

pub use action::{
    Action, ActionRegistry, ActionResolver, Arg, Behavior, BehaviorBuilder, Continuation,
    InitParams, Invocation, ParamKind, ParamSpec, ResolvedAction, SkipLoading,
};
pub use error::RewriteError;
pub use pattern::{Dialect, MatchResult, Pattern};
pub use template::Template;
pub use types::{
    ActionInvocationError, ActionResolutionError, ActionResult, BoxError, ChainOutcome,
    ChainReport, Combinator, Condition, ConditionMatch, Context, InitError, Mutation,
    MutationKind, Operator, PatternSyntaxError, RequestContext, Response, Rule, RuleOutcome,
    RuleSet, RuleSetBuilder, RuleStep, Selector, SelectorError, Target,
};
