use winnow::combinator::{cut_err, delimited, opt, preceded, separated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::action::ParamSpec;

use super::parser::MethodSignature;

// -- Whitespace & identifiers -----------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
        }),
    )
        .take()
        .parse_next(input)
}

// -- Parameters -------------------------------------------------------------

fn kind(input: &mut &str) -> ModalResult<ParamSpec> {
    ident
        .verify_map(|alias: &str| alias.parse::<ParamSpec>().ok())
        .context(StrContext::Label("parameter kind"))
        .context(StrContext::Expected(StrContextValue::Description(
            "int, long, str, boolean, request, response, chain, ...",
        )))
        .parse_next(input)
}

/// Everything after the kind up to the next `,` or `)`, trimmed.
fn binding<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded(
        take_while(1.., |c: char| c == ' ' || c == '\t'),
        take_while(1.., |c: char| c != ',' && c != ')'),
    )
    .map(str::trim)
    .parse_next(input)
}

fn param(input: &mut &str) -> ModalResult<ParamSpec> {
    ws.parse_next(input)?;
    let mut parsed = kind.parse_next(input)?;
    if let Some(name) = opt(binding).parse_next(input)? {
        if !name.is_empty() {
            parsed.binding = Some(name.to_owned());
        }
    }
    ws.parse_next(input)?;
    Ok(parsed)
}

fn param_list(input: &mut &str) -> ModalResult<Vec<ParamSpec>> {
    let params: Vec<ParamSpec> = separated(0.., param, ',').parse_next(input)?;
    ws.parse_next(input)?;
    Ok(params)
}

// -- Top-level parser -------------------------------------------------------

/// `name`, `name()` or `name(kind [binding], ...)`.
pub fn method_signature(input: &mut &str) -> ModalResult<MethodSignature> {
    ws.parse_next(input)?;
    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "method name",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let params = opt(delimited(
        '(',
        cut_err(param_list),
        cut_err(')').context(StrContext::Expected(StrContextValue::CharLiteral(')'))),
    ))
    .parse_next(input)?;
    ws.parse_next(input)?;
    Ok(MethodSignature {
        name: name.to_owned(),
        params,
    })
}
