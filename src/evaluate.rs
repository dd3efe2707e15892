use std::time::Instant;

use crate::action::Continuation;
use crate::pattern::MatchResult;
use crate::types::{
    ActionInvocationError, ChainOutcome, ChainReport, CompiledCondition, Combinator,
    ConditionMatch, RequestContext, Rule, RuleOutcome, RuleState, RuleStep, Target,
};

/// Run one rule: gate, match, conditions, mutations, actions, target.
pub(crate) fn evaluate_rule(
    rule: &Rule,
    path: Option<&str>,
    ctx: &mut dyn RequestContext,
    mut chain: Option<&mut dyn Continuation>,
) -> Result<RuleOutcome, ActionInvocationError> {
    let compiled = match &rule.state {
        RuleState::Valid(compiled) => compiled,
        RuleState::Uninitialized => {
            tracing::debug!(rule = rule.id, "not initialised, skipping");
            return Ok(RuleOutcome::NoMatch);
        }
        RuleState::Invalid => {
            tracing::debug!(rule = rule.id, "not valid, skipping");
            return Ok(RuleOutcome::NoMatch);
        }
    };
    if !rule.is_enabled() {
        tracing::debug!(rule = rule.id, "not enabled, skipping");
        return Ok(RuleOutcome::NoMatch);
    }
    let Some(path) = path else {
        tracing::debug!(rule = rule.id, "path consumed by an earlier rule, skipping");
        return Ok(RuleOutcome::NoMatch);
    };

    let primary = compiled.from.find(path);
    if !primary.found() {
        tracing::trace!(rule = rule.id, from = %compiled.from, path, "no match on from");
        return Ok(RuleOutcome::NoMatch);
    }
    tracing::debug!(rule = rule.id, path, "matched from");

    let (passed, last_condition) = evaluate_conditions(&compiled.conditions, &*ctx);
    if !passed {
        tracing::debug!(rule = rule.id, "conditions do not match");
        return Ok(RuleOutcome::NoMatch);
    }

    for mutation in &rule.mutations {
        let value = mutation
            .value
            .render_value(&primary, last_condition.as_ref(), &*ctx);
        tracing::trace!(rule = rule.id, kind = %mutation.kind, key = ?mutation.key, %value, "applying mutation");
        ctx.apply(mutation.kind, mutation.key.as_deref(), &value);
    }

    let mut action_result = None;
    if !compiled.actions.is_empty() {
        let groups = positional_groups(&primary, last_condition.as_ref());
        for action in &compiled.actions {
            if let Some(result) = action.invoke(&groups, &mut *ctx, reborrow(&mut chain))? {
                action_result = Some(result);
            }
        }
    }

    let outcome = match &rule.to {
        Target::Stop => RuleOutcome::StopChain { action_result },
        Target::Empty => RuleOutcome::MatchedNoRewrite { action_result },
        Target::Template(template) => {
            let target = template.render(&compiled.from, path, last_condition.as_ref(), &*ctx);
            RuleOutcome::Matched {
                target,
                action_result,
            }
        }
    };
    tracing::debug!(rule = rule.id, %outcome, "rule fired");
    Ok(outcome)
}

/// Fold conditions left to right. The combinator on condition `i` decides
/// how condition `i + 1` joins the running result. Every condition is
/// evaluated, and the last one that matched is kept for `%N` references.
pub(crate) fn evaluate_conditions(
    conditions: &[CompiledCondition],
    ctx: &dyn RequestContext,
) -> (bool, Option<ConditionMatch>) {
    let mut result = true;
    let mut next_is_or = false;
    let mut last = None;
    for (index, condition) in conditions.iter().enumerate() {
        let matched = condition.check(index, ctx);
        let holds = matched.is_some();
        tracing::trace!(index, selector = %condition.selector, holds, "condition");
        if matched.is_some() {
            last = matched;
        }
        if next_is_or {
            result |= holds;
        } else {
            result &= holds;
        }
        next_is_or = condition.combinator == Combinator::Or;
    }
    (result, last)
}

/// Primary groups followed by the last condition's groups.
fn positional_groups(primary: &MatchResult, condition: Option<&ConditionMatch>) -> Vec<String> {
    let mut groups = primary.groups().to_vec();
    if let Some(condition) = condition {
        groups.extend_from_slice(condition.groups());
    }
    groups
}

fn reborrow<'s>(chain: &'s mut Option<&mut dyn Continuation>) -> Option<&'s mut dyn Continuation> {
    match chain {
        Some(chain) => {
            let chain: &'s mut dyn Continuation = &mut **chain;
            Some(chain)
        }
        None => None,
    }
}

/// Drive `rules` in order, feeding each rewritten target into the next rule.
pub(crate) fn process(
    rules: &[Rule],
    path: &str,
    ctx: &mut dyn RequestContext,
    mut chain: Option<&mut dyn Continuation>,
    mut on_evaluated: impl FnMut(&Rule, &RuleOutcome),
) -> Result<ChainOutcome, ActionInvocationError> {
    let mut current = Some(path.to_owned());
    let mut outcome = ChainOutcome::default();
    for rule in rules {
        let result = evaluate_rule(rule, current.as_deref(), &mut *ctx, reborrow(&mut chain))?;
        on_evaluated(rule, &result);
        if !result.is_matched() {
            continue;
        }
        outcome.matched.push(rule.id);
        if let Some(result) = result.action_result() {
            outcome.action_results.push(result.clone());
        }
        match result {
            RuleOutcome::StopChain { .. } => {
                tracing::debug!(rule = rule.id, "stopping chain");
                outcome.stopped = true;
                current = None;
                break;
            }
            RuleOutcome::Matched { target, .. } => {
                outcome.target = Some(target.clone());
                current = Some(target);
            }
            RuleOutcome::MatchedNoRewrite { .. } | RuleOutcome::NoMatch => {}
        }
        if rule.terminal {
            tracing::debug!(rule = rule.id, "terminal rule matched, stopping");
            break;
        }
    }
    tracing::trace!(remaining = ?current, "chain finished");
    Ok(outcome)
}

/// [`process`] plus a per-rule trace of what fired and the path it produced.
pub(crate) fn process_detailed(
    rules: &[Rule],
    path: &str,
    ctx: &mut dyn RequestContext,
) -> Result<ChainReport, ActionInvocationError> {
    let start = Instant::now();
    let mut steps = Vec::new();
    let outcome = process(rules, path, ctx, None, |rule, result| {
        steps.push(RuleStep {
            id: rule.rule_id(),
            name: rule.display_name(),
            fired: result.is_matched(),
            rewritten_to: result.target().map(str::to_owned),
        });
    })?;
    Ok(ChainReport::new(outcome, steps, start.elapsed()))
}
