use std::fmt;
use std::str::FromStr;

use super::context::RequestContext;
use super::selector::Selector;
use crate::pattern::{Dialect, MatchResult, Pattern};

/// How a condition's observed value is tested against its declared value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Operator {
    #[default]
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl Operator {
    /// Operators that only make sense on numeric selectors.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        !matches!(self, Operator::Equal | Operator::NotEqual)
    }

    fn compare(self, observed: i64, expected: i64) -> bool {
        match self {
            Operator::Equal => observed == expected,
            Operator::NotEqual => observed != expected,
            Operator::Greater => observed > expected,
            Operator::Less => observed < expected,
            Operator::GreaterOrEqual => observed >= expected,
            Operator::LessOrEqual => observed <= expected,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "notequal",
            Operator::Greater => "greater",
            Operator::Less => "less",
            Operator::GreaterOrEqual => "greaterorequal",
            Operator::LessOrEqual => "lessorequal",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "equal" => Ok(Operator::Equal),
            "notequal" => Ok(Operator::NotEqual),
            "greater" => Ok(Operator::Greater),
            "less" => Ok(Operator::Less),
            "greaterorequal" => Ok(Operator::GreaterOrEqual),
            "lessorequal" => Ok(Operator::LessOrEqual),
            other => Err(format!("unknown operator '{other}'")),
        }
    }
}

/// Links a condition to the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(format!("unknown combinator '{other}'")),
        }
    }
}

/// A contextual predicate gating a rule.
///
/// The [`combinator`](Self::or) declared on condition *i* decides how condition
/// *i + 1* folds into the running result.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) selector: Selector,
    pub(crate) operator: Operator,
    pub(crate) value: Option<String>,
    pub(crate) combinator: Combinator,
    pub(crate) case_sensitive: bool,
}

impl Condition {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            operator: Operator::Equal,
            value: None,
            combinator: Combinator::And,
            case_sensitive: false,
        }
    }

    pub fn header(name: &str, value: &str) -> Self {
        Self::new(Selector::Header(name.to_owned())).value(value)
    }

    pub fn param(name: &str, value: &str) -> Self {
        Self::new(Selector::Param(name.to_owned())).value(value)
    }

    pub fn cookie(name: &str) -> Self {
        Self::new(Selector::Cookie(name.to_owned()))
    }

    pub fn port(value: &str) -> Self {
        Self::new(Selector::Port).value(value)
    }

    pub fn server_name(value: &str) -> Self {
        Self::new(Selector::ServerName).value(value)
    }

    pub fn user_in_role(role: &str) -> Self {
        Self::new(Selector::UserInRole(String::new())).value(role)
    }

    #[must_use]
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_owned());
        self
    }

    #[must_use]
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    #[must_use]
    pub fn not_equal(self) -> Self {
        self.operator(Operator::NotEqual)
    }

    #[must_use]
    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Combine the next condition with OR instead of AND.
    #[must_use]
    pub fn or(self) -> Self {
        self.combinator(Combinator::Or)
    }

    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Compile the value test using the owning rule's dialect.
    ///
    /// An unusable value never fails compilation; the condition just never
    /// matches. Only structurally wrong conditions are reported.
    pub(crate) fn compile(&self, dialect: Dialect) -> Result<CompiledCondition, String> {
        let test = match &self.selector {
            Selector::UserInRole(key) => {
                if self.operator.is_ordering() {
                    return Err(format!("operator '{}' cannot test a role", self.operator));
                }
                let role = if key.is_empty() {
                    self.value.as_deref().unwrap_or_default()
                } else {
                    key
                };
                if role.trim().is_empty() {
                    return Err("user-in-role needs a role".to_owned());
                }
                Test::Role(role.to_owned())
            }
            selector if selector.is_numeric() => {
                match self.value.as_deref().map(|v| v.trim().parse::<i64>()) {
                    Some(Ok(expected)) => Test::Numeric(expected),
                    _ => {
                        tracing::warn!(
                            selector = %selector,
                            value = ?self.value,
                            "numeric condition value is not a number, condition will never match"
                        );
                        Test::Never
                    }
                }
            }
            selector => {
                if self.operator.is_ordering() {
                    return Err(format!(
                        "operator '{}' needs a numeric selector, not '{selector}'",
                        self.operator
                    ));
                }
                let source = self.value.as_deref().unwrap_or_default();
                match Pattern::compile(source, dialect, self.case_sensitive) {
                    Ok(pattern) => Test::Pattern(pattern),
                    Err(e) => {
                        tracing::warn!(error = %e, "condition will never match");
                        Test::Never
                    }
                }
            }
        };
        Ok(CompiledCondition {
            selector: self.selector.clone(),
            operator: self.operator,
            combinator: self.combinator,
            test,
        })
    }
}

/// The captured groups of one condition that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionMatch {
    index: usize,
    result: MatchResult,
}

impl ConditionMatch {
    /// Position of the matching condition within its rule.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.result.groups()
    }

    #[must_use]
    pub fn group(&self, index: usize) -> Option<&str> {
        self.result.group(index)
    }

    #[must_use]
    pub fn result(&self) -> &MatchResult {
        &self.result
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Test {
    Pattern(Pattern),
    Numeric(i64),
    Role(String),
    Never,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledCondition {
    pub(crate) selector: Selector,
    pub(crate) operator: Operator,
    pub(crate) combinator: Combinator,
    pub(crate) test: Test,
}

impl CompiledCondition {
    /// Test this condition, returning its match when it holds.
    pub(crate) fn check(&self, index: usize, ctx: &dyn RequestContext) -> Option<ConditionMatch> {
        let inverted = self.operator == Operator::NotEqual;
        let result = match &self.test {
            Test::Never => None,
            Test::Role(role) => {
                (ctx.is_user_in_role(role) != inverted).then(MatchResult::empty_match)
            }
            Test::Numeric(expected) => {
                match ctx
                    .lookup(&self.selector)
                    .and_then(|v| v.trim().parse::<i64>().ok())
                {
                    Some(observed) => self
                        .operator
                        .compare(observed, *expected)
                        .then(MatchResult::empty_match),
                    None => inverted.then(MatchResult::empty_match),
                }
            }
            Test::Pattern(pattern) => match ctx.lookup(&self.selector) {
                Some(observed) => {
                    let found = pattern.find(&observed);
                    match (found.found(), inverted) {
                        (true, false) => Some(found),
                        (false, true) => Some(MatchResult::empty_match()),
                        _ => None,
                    }
                }
                None => inverted.then(MatchResult::empty_match),
            },
        };
        result.map(|result| ConditionMatch { index, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;

    fn compiled(condition: Condition) -> CompiledCondition {
        condition.compile(Dialect::Regex).unwrap()
    }

    #[test]
    fn operator_from_str() {
        assert_eq!("notequal".parse(), Ok(Operator::NotEqual));
        assert_eq!("".parse(), Ok(Operator::Equal));
        assert!("sortof".parse::<Operator>().is_err());
    }

    #[test]
    fn combinator_from_str() {
        assert_eq!("OR".parse(), Ok(Combinator::Or));
        assert_eq!("and".parse(), Ok(Combinator::And));
    }

    #[test]
    fn header_match_captures_groups() {
        let c = compiled(Condition::header("hdr", "aaa([a-z]+)cc(c)"));
        let ctx = Context::new().header("hdr", "aaafffccc");
        let m = c.check(3, &ctx).unwrap();
        assert_eq!(m.index(), 3);
        assert_eq!(m.groups(), &["fff".to_owned(), "c".to_owned()]);
    }

    #[test]
    fn case_insensitive_by_default() {
        let c = compiled(Condition::header("agent", "aAa"));
        assert!(c.check(0, &Context::new().header("agent", "aaa")).is_some());
        let c = compiled(Condition::header("agent", "aAa").case_sensitive(true));
        assert!(c.check(0, &Context::new().header("agent", "aaa")).is_none());
    }

    #[test]
    fn absent_value() {
        let ctx = Context::new();
        assert!(compiled(Condition::cookie("abcdef")).check(0, &ctx).is_none());
        assert!(compiled(Condition::cookie("abcdef").not_equal())
            .check(0, &ctx)
            .is_some());
    }

    #[test]
    fn numeric_port() {
        let c = compiled(Condition::port("90"));
        assert!(c.check(0, &Context::new().port(90)).is_some());
        assert!(c.check(0, &Context::new().port(9090)).is_none());
        let c = compiled(Condition::port("1024").operator(Operator::Less));
        assert!(c.check(0, &Context::new().port(80)).is_some());
    }

    #[test]
    fn non_numeric_port_never_matches() {
        let c = compiled(Condition::port("aaa"));
        assert!(matches!(c.test, Test::Never));
        assert!(c.check(0, &Context::new().port(80)).is_none());
    }

    #[test]
    fn bad_pattern_never_matches() {
        let c = compiled(Condition::header("h", "fro[m"));
        assert!(c.check(0, &Context::new().header("h", "from")).is_none());
        let c = compiled(Condition::header("h", "fro[m").not_equal());
        assert!(c.check(0, &Context::new().header("h", "x")).is_none());
    }

    #[test]
    fn ordering_on_text_is_rejected() {
        let err = Condition::server_name("a")
            .operator(Operator::Greater)
            .compile(Dialect::Regex)
            .unwrap_err();
        assert!(err.contains("numeric selector"));
    }

    #[test]
    fn roles() {
        let c = compiled(Condition::user_in_role("admin"));
        assert!(c.check(0, &Context::new().role("admin")).is_some());
        assert!(c.check(0, &Context::new()).is_none());
        let c = compiled(Condition::user_in_role("boss").not_equal());
        assert!(c.check(0, &Context::new()).is_some());
        assert!(c.check(0, &Context::new().role("boss")).is_none());
    }

    #[test]
    fn missing_role_is_rejected() {
        assert!(Condition::new(Selector::UserInRole(String::new()))
            .compile(Dialect::Regex)
            .is_err());
    }

    #[test]
    fn wildcard_condition() {
        let c = Condition::server_name("dev*").compile(Dialect::Wildcard).unwrap();
        assert!(c.check(0, &Context::new().server_name("dev.googil.com")).is_some());
    }
}
