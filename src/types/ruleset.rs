use std::fmt;

use super::chain_report::ChainReport;
use super::context::RequestContext;
use super::error::{ActionInvocationError, InitError};
use super::outcome::ActionResult;
use super::rule::Rule;
use crate::action::{ActionResolver, Continuation};

/// Builder for an ordered [`RuleSet`].
///
/// Rules are defined via closures over a fresh [`Rule`] and get ordinal ids in
/// definition order.
///
/// # Example
///
/// ```
/// use rewrite_rules::{Context, RuleSetBuilder, SkipLoading};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("^/old/(.*)$", |r| r.to("/new/$1"))
///     .rule("^/new/admin", |r| r.to("null"))
///     .compile(&SkipLoading);
///
/// let outcome = ruleset.process("/old/page", &mut Context::new()).unwrap();
/// assert_eq!(outcome.target(), Some("/new/page"));
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule matching `from`. The closure sets everything else.
    #[must_use]
    pub fn rule(mut self, from: &str, f: impl FnOnce(Rule) -> Rule) -> Self {
        let id = self.rules.len();
        self.rules.push(f(Rule::new(from).id(id)));
        self
    }

    /// Append a rule built elsewhere, keeping its own id.
    #[must_use]
    pub fn push(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Initialize every rule against `resolver`.
    ///
    /// Invalid rules are kept, but never fire; inspect them through
    /// [`RuleSet::errors`].
    pub fn compile(self, resolver: &dyn ActionResolver) -> RuleSet {
        let mut rules = self.rules;
        for rule in &mut rules {
            rule.initialize(resolver);
        }
        let ruleset = RuleSet { rules };
        tracing::debug!(%ruleset, "compiled ruleset");
        ruleset
    }
}

/// Result of running a request path through every rule in order.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ChainOutcome {
    pub(crate) target: Option<String>,
    pub(crate) stopped: bool,
    pub(crate) matched: Vec<usize>,
    pub(crate) action_results: Vec<ActionResult>,
}

impl ChainOutcome {
    /// The last rewritten target, if any rule rewrote the path.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Whether a rule with a `null` target ended the chain.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Ids of the rules that fired, in order.
    #[must_use]
    pub fn matched(&self) -> &[usize] {
        &self.matched
    }

    #[must_use]
    pub fn action_results(&self) -> &[ActionResult] {
        &self.action_results
    }
}

/// An initialized, ordered list of rules. Read-only during evaluation, so it
/// can be shared behind `Arc`.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
}

impl RuleSet {
    /// Run `path` through the rules. Each rewritten target becomes the input
    /// of the next rule; a `null` target or a terminal rule ends the chain.
    ///
    /// # Errors
    ///
    /// Returns [`ActionInvocationError`] if an action fails; no later rule runs.
    pub fn process(
        &self,
        path: &str,
        ctx: &mut dyn RequestContext,
    ) -> Result<ChainOutcome, ActionInvocationError> {
        crate::evaluate::process(&self.rules, path, ctx, None, |_, _| {})
    }

    /// Like [`process`](Self::process), handing `chain` to filtering actions.
    ///
    /// # Errors
    ///
    /// As for [`process`](Self::process).
    pub fn process_with_chain(
        &self,
        path: &str,
        ctx: &mut dyn RequestContext,
        chain: &mut dyn Continuation,
    ) -> Result<ChainOutcome, ActionInvocationError> {
        crate::evaluate::process(&self.rules, path, ctx, Some(chain), |_, _| {})
    }

    /// Process with diagnostics: which rules fired, in which order, and how
    /// long it took.
    ///
    /// # Errors
    ///
    /// As for [`process`](Self::process).
    pub fn process_detailed(
        &self,
        path: &str,
        ctx: &mut dyn RequestContext,
    ) -> Result<ChainReport, ActionInvocationError> {
        crate::evaluate::process_detailed(&self.rules, path, ctx)
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look a rule up by its name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.rule_name() == Some(name))
    }

    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_valid()).count()
    }

    /// Initialization errors, per rule id, for every rule that has any.
    #[must_use]
    pub fn errors(&self) -> Vec<(usize, &[InitError])> {
        self.rules
            .iter()
            .filter(|r| !r.errors().is_empty())
            .map(|r| (r.rule_id(), r.errors()))
            .collect()
    }

    /// Whether any valid rule runs a filtering action.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        self.rules.iter().any(Rule::is_filter)
    }

    /// Tear every rule down. Idempotent; the set matches nothing afterwards.
    pub fn destroy(&mut self) {
        for rule in &mut self.rules {
            rule.destroy();
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} valid)",
            self.rules.len(),
            self.valid_count(),
        )
    }
}
