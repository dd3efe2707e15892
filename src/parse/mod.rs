mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::MethodSignature;

use crate::action::Action;

/// Parse an action method string such as `run` or `record(int id, str)`.
///
/// A blank string names the default method.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid method signature.
pub fn parse_method(input: &str) -> Result<MethodSignature, ParseError> {
    use winnow::Parser;
    if input.trim().is_empty() {
        return Ok(MethodSignature {
            name: Action::DEFAULT_METHOD.to_owned(),
            params: None,
        });
    }
    grammar::method_signature
        .parse(input)
        .map_err(|e| {
            let message = e.inner().to_string().replace('\n', "; ");
            ParseError::new(input, e.offset(), message)
        })
}
