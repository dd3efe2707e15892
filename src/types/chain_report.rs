use std::fmt;
use std::time::Duration;

use super::ruleset::ChainOutcome;

/// One rule visited while a path moved through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStep {
    pub id: usize,
    pub name: String,
    /// Whether the rule fired, with or without a rewrite.
    pub fired: bool,
    /// The path this rule rewrote to, if it produced one.
    pub rewritten_to: Option<String>,
}

/// Trace of a chain run, returned by
/// [`RuleSet::process_detailed()`](super::ruleset::RuleSet::process_detailed).
#[derive(Debug, Clone)]
#[must_use]
pub struct ChainReport {
    outcome: ChainOutcome,
    steps: Vec<RuleStep>,
    elapsed: Duration,
}

impl ChainReport {
    pub(crate) fn new(outcome: ChainOutcome, steps: Vec<RuleStep>, elapsed: Duration) -> Self {
        Self {
            outcome,
            steps,
            elapsed,
        }
    }

    pub fn outcome(&self) -> &ChainOutcome {
        &self.outcome
    }

    /// Every rule evaluated, in order, up to where the chain ended.
    #[must_use]
    pub fn steps(&self) -> &[RuleStep] {
        &self.steps
    }

    /// Display names of the rules that fired.
    #[must_use]
    pub fn fired(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|step| step.fired)
            .map(|step| step.name.as_str())
            .collect()
    }

    #[must_use]
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// One line per fired rule with the path it produced, then the final path.
impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in self.steps.iter().filter(|step| step.fired) {
            match &step.rewritten_to {
                Some(path) => writeln!(f, "{} => {path}", step.name)?,
                None => writeln!(f, "{} (no rewrite)", step.name)?,
            }
        }
        let end = if self.outcome.stopped() { "stopped at" } else { "final" };
        write!(
            f,
            "{end} {} after {} of {} rules in {:?}",
            self.outcome.target().unwrap_or("<unchanged>"),
            self.fired().len(),
            self.steps.len(),
            self.elapsed
        )
    }
}
