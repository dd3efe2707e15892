//! Target and value templates.
//!
//! A template may reference three things:
//!
//! - `%{name}` or `%{selector:key}`: a contextual variable
//! - `%N` (single digit): a group of the last matching condition
//! - `$N`: a group of the primary `from` match
//!
//! They are resolved in that order. Text inserted by the first two passes is
//! quoted, so no later pass reinterprets it. A backslash suppresses the meaning
//! of the next character and is dropped in the final pass.

use std::fmt;

use crate::pattern::{MatchResult, Pattern};
use crate::{ConditionMatch, RequestContext, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    has_variables: bool,
    has_backrefs: bool,
}

impl Template {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let (has_variables, has_backrefs) = scan_references(source);
        Self {
            source: source.to_owned(),
            has_variables,
            has_backrefs,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Whether the template contains an unescaped `%{...}` variable.
    #[must_use]
    pub fn has_variables(&self) -> bool {
        self.has_variables
    }

    /// Whether the template contains an unescaped `%N` backreference.
    #[must_use]
    pub fn has_backrefs(&self) -> bool {
        self.has_backrefs
    }

    /// Render a rewrite target: every match of `pattern` in `input` is replaced
    /// by this template, with `$N` expanded per match.
    pub fn render(
        &self,
        pattern: &Pattern,
        input: &str,
        last_condition: Option<&ConditionMatch>,
        ctx: &dyn RequestContext,
    ) -> String {
        let prepared = self.prepare(last_condition, ctx);
        pattern.replace_all(input, &prepared)
    }

    /// Render a standalone value against the first primary match.
    pub fn render_value(
        &self,
        primary: &MatchResult,
        last_condition: Option<&ConditionMatch>,
        ctx: &dyn RequestContext,
    ) -> String {
        let prepared = self.prepare(last_condition, ctx);
        primary.expand(&prepared)
    }

    /// Resolve variables and condition backreferences, leaving `$N` and
    /// backslash escapes for the pattern matcher.
    fn prepare(&self, last_condition: Option<&ConditionMatch>, ctx: &dyn RequestContext) -> String {
        let collapse = self.has_variables || self.source.contains("%%");
        if !collapse && !self.has_backrefs {
            return self.source.clone();
        }
        let mut text = if collapse {
            replace_variables(&self.source, ctx)
        } else {
            self.source.clone()
        };
        if self.has_backrefs {
            text = replace_backrefs(&text, last_condition.map(ConditionMatch::result));
        }
        text
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Replace `%{...}` variables and collapse `%%`.
///
/// `%%` becomes a literal `%` unless a reference follows it, in which case the
/// first `%` is literal and the second starts the reference.
pub(crate) fn replace_variables(template: &str, ctx: &dyn RequestContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['\\', '%']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with('\\') {
            let len = escape_len(tail);
            out.push_str(&tail[..len]);
            rest = &tail[len..];
        } else if let Some(body) = tail.strip_prefix("%{") {
            match body.find('}') {
                Some(end) => {
                    quote(&resolve_variable(&body[..end], ctx), &mut out);
                    rest = &body[end + 1..];
                }
                None => {
                    out.push('%');
                    rest = &tail[1..];
                }
            }
        } else if tail.starts_with("%%") && !starts_reference(&tail[2..]) {
            out.push_str("\\%");
            rest = &tail[2..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Replace `%N` with groups of the last condition match.
///
/// Without a condition match, or with one that captured nothing, references
/// are left as written. Out-of-range references render empty.
pub(crate) fn replace_backrefs(template: &str, condition: Option<&MatchResult>) -> String {
    let Some(condition) = condition.filter(|m| !m.groups().is_empty()) else {
        return template.to_owned();
    };
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['\\', '%']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with('\\') {
            let len = escape_len(tail);
            out.push_str(&tail[..len]);
            rest = &tail[len..];
            continue;
        }
        match tail[1..].chars().next().and_then(|c| c.to_digit(10)) {
            Some(index) => {
                quote(condition.group(index as usize).unwrap_or_default(), &mut out);
                rest = &tail[2..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_variable(name: &str, ctx: &dyn RequestContext) -> String {
    match name.parse::<Selector>() {
        Ok(Selector::UserInRole(role)) => ctx.is_user_in_role(&role).to_string(),
        Ok(selector) => ctx.lookup(&selector).unwrap_or_default(),
        Err(e) => {
            tracing::trace!(variable = name, error = %e, "unresolvable variable renders empty");
            String::new()
        }
    }
}

/// Escape characters that later passes would interpret.
fn quote(text: &str, out: &mut String) {
    for c in text.chars() {
        if matches!(c, '\\' | '$' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Byte length of a backslash plus the character it escapes.
fn escape_len(tail: &str) -> usize {
    1 + tail[1..].chars().next().map_or(0, char::len_utf8)
}

fn starts_reference(s: &str) -> bool {
    s.starts_with('{') || s.starts_with(|c: char| c.is_ascii_digit())
}

fn scan_references(source: &str) -> (bool, bool) {
    let mut variables = false;
    let mut backrefs = false;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '%' => match chars.peek() {
                Some('{') => variables = true,
                Some(d) if d.is_ascii_digit() => backrefs = true,
                _ => {}
            },
            _ => {}
        }
    }
    (variables, backrefs)
}
