use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use super::condition::{CompiledCondition, Condition};
use super::context::RequestContext;
use super::error::{ActionInvocationError, InitError};
use super::mutation::Mutation;
use super::outcome::RuleOutcome;
use crate::action::{Action, ActionResolver, Continuation, ResolvedAction};
use crate::pattern::{Dialect, Pattern};
use crate::template::Template;

/// What a rule produces when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// Rewrite the path by rendering this template.
    Template(Template),
    /// Fire without rewriting; the rule only mutates state or runs actions.
    #[default]
    Empty,
    /// Fire and stop the chain.
    Stop,
}

impl Target {
    /// `null` (any case) stops the chain, blank text is empty, anything else
    /// is a template.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            Target::Stop
        } else if trimmed.is_empty() {
            Target::Empty
        } else {
            Target::Template(Template::new(text))
        }
    }
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        Target::parse(text)
    }
}

/// Compiled form of a valid rule.
#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) from: Pattern,
    pub(crate) conditions: Vec<CompiledCondition>,
    pub(crate) actions: Vec<ResolvedAction>,
}

#[derive(Debug, Default)]
pub(crate) enum RuleState {
    #[default]
    Uninitialized,
    Valid(CompiledRule),
    Invalid,
}

/// A single rewrite rule.
///
/// Built with consuming setters, then [`initialize`](Self::initialize)d once
/// before it can evaluate anything. After initialization the rule is read-only
/// apart from its [`enabled`](Self::set_enabled) flag, so it can be shared
/// across threads.
///
/// # Example
///
/// ```
/// use rewrite_rules::{Context, Rule, SkipLoading};
///
/// let mut rule = Rule::new("^/products/([0-9]+)$").to("/product.jsp?id=$1");
/// rule.initialize(&SkipLoading);
///
/// let outcome = rule.evaluate(Some("/products/42"), &mut Context::new()).unwrap();
/// assert_eq!(outcome.target(), Some("/product.jsp?id=42"));
/// ```
#[derive(Debug)]
pub struct Rule {
    pub(crate) id: usize,
    pub(crate) name: Option<String>,
    pub(crate) note: Option<String>,
    pub(crate) enabled: AtomicBool,
    pub(crate) from: String,
    pub(crate) dialect: Dialect,
    pub(crate) case_sensitive: bool,
    pub(crate) to: Target,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) mutations: Vec<Mutation>,
    pub(crate) actions: Vec<Action>,
    pub(crate) terminal: bool,
    pub(crate) state: RuleState,
    pub(crate) errors: Vec<InitError>,
}

impl Rule {
    pub fn new(from: &str) -> Self {
        Self {
            id: 0,
            name: None,
            note: None,
            enabled: AtomicBool::new(true),
            from: from.to_owned(),
            dialect: Dialect::Regex,
            case_sensitive: false,
            to: Target::Empty,
            conditions: Vec::new(),
            mutations: Vec::new(),
            actions: Vec::new(),
            terminal: false,
            state: RuleState::Uninitialized,
            errors: Vec::new(),
        }
    }

    /// Set the target from text; see [`Target::parse`].
    #[must_use]
    pub fn to(mut self, to: &str) -> Self {
        self.to = Target::parse(to);
        self
    }

    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.to = target;
        self
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn wildcard(self) -> Self {
        self.dialect(Dialect::Wildcard)
    }

    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn mutation(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Stop evaluating further rules once this one fires.
    #[must_use]
    pub fn terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    #[must_use]
    pub fn id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_owned());
        self
    }

    #[must_use]
    pub fn enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    /// Toggle the rule. Takes effect for evaluations that start afterwards.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn rule_id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn rule_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn rule_note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// The name if one was given, otherwise `Rule {id}`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Rule {}", self.id),
        }
    }

    #[must_use]
    pub fn from_source(&self) -> &str {
        &self.from
    }

    #[must_use]
    pub fn target_kind(&self) -> &Target {
        &self.to
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !matches!(self.state, RuleState::Uninitialized)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self.state, RuleState::Valid(_))
    }

    /// Whether any resolved action takes a continuation handle.
    #[must_use]
    pub fn is_filter(&self) -> bool {
        match &self.state {
            RuleState::Valid(compiled) => compiled.actions.iter().any(ResolvedAction::is_filter),
            _ => false,
        }
    }

    /// Errors collected by the last [`initialize`](Self::initialize).
    #[must_use]
    pub fn errors(&self) -> &[InitError] {
        &self.errors
    }

    /// Compile patterns and resolve actions. Errors are collected on the rule
    /// rather than returned; returns whether the rule is now valid.
    ///
    /// Calling it again re-initializes from scratch.
    pub fn initialize(&mut self, resolver: &dyn ActionResolver) -> bool {
        crate::compile::initialize(self, resolver)
    }

    /// Release action instances and return to the uninitialized state.
    /// Idempotent.
    pub fn destroy(&mut self) {
        if let RuleState::Valid(compiled) = &mut self.state {
            for action in &mut compiled.actions {
                action.destroy();
            }
        }
        self.state = RuleState::Uninitialized;
    }

    /// Evaluate the rule against `path`. `None` means an earlier rule already
    /// consumed the path, and the rule is skipped.
    ///
    /// # Errors
    ///
    /// Only action failures propagate; everything else that prevents the rule
    /// from firing yields [`RuleOutcome::NoMatch`].
    pub fn evaluate(
        &self,
        path: Option<&str>,
        ctx: &mut dyn RequestContext,
    ) -> Result<RuleOutcome, ActionInvocationError> {
        crate::evaluate::evaluate_rule(self, path, ctx, None)
    }

    /// Like [`evaluate`](Self::evaluate), handing `chain` to filtering actions.
    ///
    /// # Errors
    ///
    /// As for [`evaluate`](Self::evaluate).
    pub fn evaluate_with_chain(
        &self,
        path: Option<&str>,
        ctx: &mut dyn RequestContext,
        chain: &mut dyn Continuation,
    ) -> Result<RuleOutcome, ActionInvocationError> {
        crate::evaluate::evaluate_rule(self, path, ctx, Some(chain))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.display_name(), self.dialect, self.from)?;
        match &self.to {
            Target::Template(t) => write!(f, " -> {t}"),
            Target::Empty => Ok(()),
            Target::Stop => write!(f, " -> null"),
        }
    }
}
