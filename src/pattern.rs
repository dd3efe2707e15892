use std::fmt;
use std::str::FromStr;

use regex::{Captures, Regex, RegexBuilder};

use crate::PatternSyntaxError;

/// Pattern dialect used for a rule's `from` and for its condition values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// The source is an engine-native regular expression, matched with find semantics.
    #[default]
    Regex,
    /// Glob-like syntax: `*` (no `/`), `**` (anything), `?` (one non-`/` char).
    Wildcard,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Regex => write!(f, "regex"),
            Dialect::Wildcard => write!(f, "wildcard"),
        }
    }
}

impl FromStr for Dialect {
    type Err = std::convert::Infallible;

    /// Anything other than `wildcard` (trimmed, any case) selects regex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("wildcard") {
            Ok(Dialect::Wildcard)
        } else {
            Ok(Dialect::Regex)
        }
    }
}

/// A compiled `from` or condition pattern.
///
/// Both dialects end up as a [`Regex`]; wildcard sources are translated once at
/// compile time and anchored at both ends. Group numbering is 1-based and stable
/// for the lifetime of the pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    dialect: Dialect,
    regex: Regex,
}

/// Result of matching a [`Pattern`] against an input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    found: bool,
    whole: String,
    groups: Vec<String>,
}

impl Pattern {
    /// Compile `source` in the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`PatternSyntaxError`] when the (translated) expression is rejected
    /// by the regex engine.
    pub fn compile(
        source: &str,
        dialect: Dialect,
        case_sensitive: bool,
    ) -> Result<Self, PatternSyntaxError> {
        let expr = match dialect {
            Dialect::Regex => source.to_owned(),
            Dialect::Wildcard => wildcard_to_regex(source),
        };
        let regex = RegexBuilder::new(&expr)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| PatternSyntaxError {
                pattern: source.to_owned(),
                dialect,
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_owned(),
            dialect,
            regex,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Number of capturing groups, not counting the implicit whole-match group.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Find the first match in `input` and capture its groups.
    #[must_use]
    pub fn find(&self, input: &str) -> MatchResult {
        match self.regex.captures(input) {
            Some(caps) => MatchResult::from_captures(&caps),
            None => MatchResult::default(),
        }
    }

    #[must_use]
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// Replace every match in `input` with `replacement`, expanding `$N` group
    /// references per match and dropping the backslash from `\x` escapes.
    #[must_use]
    pub fn replace_all(&self, input: &str, replacement: &str) -> String {
        let group_count = self.group_count();
        let mut out = String::with_capacity(input.len() + replacement.len());
        let mut last = 0;
        for caps in self.regex.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&input[last..whole.start()]);
            expand_into(
                replacement,
                group_count,
                |i| caps.get(i).map(|m| m.as_str()),
                &mut out,
            );
            last = whole.end();
        }
        out.push_str(&input[last..]);
        out
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.dialect)
    }
}

impl MatchResult {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let whole = caps.get(0).map_or("", |m| m.as_str()).to_owned();
        let groups = caps
            .iter()
            .skip(1)
            .map(|m| m.map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect();
        Self {
            found: true,
            whole,
            groups,
        }
    }

    /// A successful match that captured nothing, used for operator-inverted and
    /// non-pattern conditions.
    #[must_use]
    pub fn empty_match() -> Self {
        Self {
            found: true,
            whole: String::new(),
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn found(&self) -> bool {
        self.found
    }

    /// Captured groups in order; index 0 here is group `1`.
    /// Groups that did not participate are empty strings.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// 1-based group lookup. Group `0` is the whole match.
    #[must_use]
    pub fn group(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return self.found.then_some(self.whole.as_str());
        }
        self.groups.get(index - 1).map(String::as_str)
    }

    /// Expand `$N` references in `replacement` against this match only.
    #[must_use]
    pub fn expand(&self, replacement: &str) -> String {
        let mut out = String::with_capacity(replacement.len());
        expand_into(replacement, self.groups.len(), |i| self.group(i), &mut out);
        out
    }
}

/// Expand a replacement string the way `$N` references behave across both
/// dialects: `\x` yields `x`, `$` followed by digits takes the longest number not
/// exceeding `group_count`, and a `$` without a digit is literal.
pub(crate) fn expand_into<'a>(
    replacement: &str,
    group_count: usize,
    group: impl Fn(usize) -> Option<&'a str>,
    out: &mut String,
) {
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            },
            '$' => {
                let Some(first) = chars.peek().and_then(|d| d.to_digit(10)) else {
                    out.push('$');
                    continue;
                };
                chars.next();
                let mut index = first as usize;
                while let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                    let next = index * 10 + d as usize;
                    if next > group_count {
                        break;
                    }
                    index = next;
                    chars.next();
                }
                if let Some(text) = group(index) {
                    out.push_str(text);
                }
            }
            other => out.push(other),
        }
    }
}

/// Translate a wildcard source into an anchored regular expression.
///
/// Literal runs are escaped before wildcard tokens are substituted. Every `*` and
/// `**` becomes a capturing group, numbered left to right.
pub(crate) fn wildcard_to_regex(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 2 + 2);
    let mut literal = String::new();
    let mut chars = source.chars().peekable();
    out.push('^');
    while let Some(c) = chars.next() {
        let token = match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                "(.*)"
            }
            '*' => "([^/]+)",
            '?' => "[^/]",
            other => {
                literal.push(other);
                continue;
            }
        };
        out.push_str(&regex::escape(&literal));
        literal.clear();
        out.push_str(token);
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
