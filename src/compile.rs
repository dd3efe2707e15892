use crate::action::ActionResolver;
use crate::pattern::Pattern;
use crate::types::{CompiledRule, InitError, Rule, RuleState, Target};

/// Compile a rule's patterns and resolve its actions.
///
/// Every problem is recorded on the rule; one bad rule never stops others
/// from loading. Returns whether the rule ended up valid.
pub(crate) fn initialize(rule: &mut Rule, resolver: &dyn ActionResolver) -> bool {
    rule.destroy();
    let mut errors = Vec::new();

    let mut conditions = Vec::with_capacity(rule.conditions.len());
    for (index, condition) in rule.conditions.iter().enumerate() {
        match condition.compile(rule.dialect) {
            Ok(compiled) => conditions.push(compiled),
            Err(reason) => errors.push(InitError::Condition { index, reason }),
        }
    }

    let mut actions = Vec::with_capacity(rule.actions.len());
    for (index, action) in rule.actions.iter().enumerate() {
        match resolver.resolve(action) {
            Ok(resolved) => actions.push(resolved),
            Err(source) => errors.push(InitError::Action { index, source }),
        }
    }

    for (index, mutation) in rule.mutations.iter().enumerate() {
        if let Err(reason) = mutation.validate() {
            errors.push(InitError::Mutation { index, reason });
        }
    }

    let from = if rule.from.trim().is_empty() {
        errors.push(InitError::BlankFrom);
        None
    } else {
        match Pattern::compile(&rule.from, rule.dialect, rule.case_sensitive) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                errors.push(e.into());
                None
            }
        }
    };

    let blank_target = match &rule.to {
        Target::Empty => true,
        Target::Template(t) => t.is_blank(),
        Target::Stop => false,
    };
    if blank_target && rule.mutations.is_empty() && rule.actions.is_empty() {
        errors.push(InitError::BlankTarget);
    }

    for error in &errors {
        tracing::warn!(rule = %rule.display_name(), %error, "rule initialization error");
    }

    rule.state = match from {
        Some(from) if errors.is_empty() => {
            tracing::debug!(rule = %rule, "loaded rule");
            RuleState::Valid(CompiledRule {
                from,
                conditions,
                actions,
            })
        }
        _ => RuleState::Invalid,
    };
    rule.errors = errors;
    rule.is_valid()
}
