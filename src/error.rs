use thiserror::Error;

use crate::parse::ParseError;
use crate::{
    ActionInvocationError, ActionResolutionError, InitError, PatternSyntaxError, SelectorError,
};

/// Unified error type for callers that do not care which stage failed.
///
/// Every error the crate produces converts into it with `?`.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pattern(#[from] PatternSyntaxError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Resolution(#[from] ActionResolutionError),

    #[error(transparent)]
    Invocation(#[from] ActionInvocationError),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dialect, Pattern, Selector};

    fn compile_pattern(source: &str) -> Result<Pattern, RewriteError> {
        Ok(Pattern::compile(source, Dialect::Regex, false)?)
    }

    fn parse_selector(text: &str) -> Result<Selector, RewriteError> {
        Ok(text.parse::<Selector>()?)
    }

    #[test]
    fn converts_with_question_mark() {
        let err = compile_pattern("(").unwrap_err();
        assert!(matches!(err, RewriteError::Pattern(_)));
        assert!(err.to_string().contains("'('"));

        let err = parse_selector("bogus").unwrap_err();
        assert!(matches!(err, RewriteError::Selector(_)));
    }

    #[test]
    fn parse_error_is_transparent() {
        let err: RewriteError = ParseError::new("run(", 4, "expected ')'").into();
        assert_eq!(
            err.to_string(),
            "invalid method signature 'run(' at offset 4: expected ')'"
        );
    }
}
