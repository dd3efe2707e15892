use std::fmt;

/// An action method string that is not a valid signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    input: String,
    offset: usize,
    message: String,
}

impl ParseError {
    pub(crate) fn new(input: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            input: input.to_owned(),
            offset,
            message: message.into(),
        }
    }

    /// The text that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset into [`input`](Self::input) where parsing stopped.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid method signature '{}' at offset {}",
            self.input, self.offset
        )?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::new("run(int", 7, "expected ')'");
        assert_eq!(
            err.to_string(),
            "invalid method signature 'run(int' at offset 7: expected ')'"
        );
    }

    #[test]
    fn error_display_without_message() {
        let err = ParseError::new("1run", 0, "");
        assert_eq!(err.to_string(), "invalid method signature '1run' at offset 0");
        assert_eq!(err.input(), "1run");
        assert_eq!(err.offset(), 0);
    }
}
