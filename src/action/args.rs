use std::fmt;
use std::str::FromStr;

use crate::types::{BoxError, RequestContext};

/// The declared kind of one action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The request-like object (the [`RequestContext`]).
    Request,
    /// The response-like object (the same [`RequestContext`]).
    Response,
    /// The continuation handle; an action taking one is a filter.
    Chain,
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Str,
    Object,
}

impl ParamKind {
    /// Kinds bound structurally rather than from a value.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(self, ParamKind::Request | ParamKind::Response | ParamKind::Chain)
    }

    fn zero(self) -> Arg {
        match self {
            ParamKind::Bool => Arg::Bool(false),
            ParamKind::Char => Arg::Char('\0'),
            ParamKind::Byte => Arg::Byte(0),
            ParamKind::Short => Arg::Short(0),
            ParamKind::Int => Arg::Int(0),
            ParamKind::Long => Arg::Long(0),
            ParamKind::Float => Arg::Float(0.0),
            ParamKind::Double => Arg::Double(0.0),
            _ => Arg::Null,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Request => "request",
            ParamKind::Response => "response",
            ParamKind::Chain => "chain",
            ParamKind::Bool => "boolean",
            ParamKind::Char => "char",
            ParamKind::Byte => "byte",
            ParamKind::Short => "short",
            ParamKind::Int => "int",
            ParamKind::Long => "long",
            ParamKind::Float => "float",
            ParamKind::Double => "double",
            ParamKind::Str => "str",
            ParamKind::Object => "object",
        };
        write!(f, "{s}")
    }
}

/// One parameter of an explicit action signature, e.g. `int id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    /// Boxed forms (`Integer`, `Boolean`, ...) receive [`Arg::Null`] instead of
    /// a zero value when nothing is bound.
    pub nullable: bool,
    /// Fetch the argument from this request value instead of binding it
    /// structurally or positionally.
    pub binding: Option<String>,
}

impl ParamSpec {
    #[must_use]
    pub fn new(kind: ParamKind) -> Self {
        Self {
            kind,
            nullable: false,
            binding: None,
        }
    }

    #[must_use]
    pub fn bound(mut self, name: &str) -> Self {
        self.binding = Some(name.to_owned());
        self
    }
}

impl FromStr for ParamSpec {
    type Err = String;

    /// Parse a kind alias. Long names are case-sensitive the way type names
    /// are; single-letter shorthands ignore case except `C`, which is the
    /// boxed character.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primitive = |kind| Ok(ParamSpec::new(kind));
        let boxed = |kind| {
            Ok(ParamSpec {
                nullable: true,
                ..ParamSpec::new(kind)
            })
        };
        match s {
            "boolean" | "bool" | "z" | "Z" => primitive(ParamKind::Bool),
            "byte" | "b" | "B" => primitive(ParamKind::Byte),
            "char" | "c" => primitive(ParamKind::Char),
            "short" | "s" | "S" => primitive(ParamKind::Short),
            "int" | "i" | "I" => primitive(ParamKind::Int),
            "long" | "l" | "L" => primitive(ParamKind::Long),
            "float" | "f" | "F" => primitive(ParamKind::Float),
            "double" | "d" | "D" => primitive(ParamKind::Double),
            "Boolean" | "Bool" => boxed(ParamKind::Bool),
            "Byte" => boxed(ParamKind::Byte),
            "C" => boxed(ParamKind::Char),
            "Short" => boxed(ParamKind::Short),
            "Integer" => boxed(ParamKind::Int),
            "Long" => boxed(ParamKind::Long),
            "Float" => boxed(ParamKind::Float),
            "Double" => boxed(ParamKind::Double),
            other => match other.to_ascii_lowercase().as_str() {
                "character" => boxed(ParamKind::Char),
                "string" | "str" => boxed(ParamKind::Str),
                "object" => boxed(ParamKind::Object),
                "req" | "request" | "servletrequest" | "httpservletrequest" => {
                    primitive(ParamKind::Request)
                }
                "res" | "response" | "servletresponse" | "httpservletresponse" => {
                    primitive(ParamKind::Response)
                }
                "chain" | "filterchain" => primitive(ParamKind::Chain),
                _ => Err(format!("unknown parameter kind '{other}'")),
            },
        }
    }
}

/// A single bound argument handed to an action method.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Placeholder for the request-like object; use [`Invocation::context`].
    Request,
    /// Placeholder for the response-like object; use [`Invocation::context_mut`].
    Response,
    /// Placeholder for the continuation; use [`Invocation::proceed`].
    Chain,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Null,
}

impl Arg {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer-kind argument widened to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Byte(v) => Some(i64::from(*v)),
            Arg::Short(v) => Some(i64::from(*v)),
            Arg::Int(v) => Some(i64::from(*v)),
            Arg::Long(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Null)
    }
}

/// Coerce an optional textual value into an argument of `param`'s kind.
///
/// Missing values become the kind's zero (or [`Arg::Null`] for nullable and
/// non-primitive kinds). Values the kind cannot parse pass through as text.
pub(crate) fn coerce(param: &ParamSpec, raw: Option<&str>) -> Arg {
    let Some(raw) = raw else {
        return if param.nullable {
            Arg::Null
        } else {
            param.kind.zero()
        };
    };
    let text = raw.trim();
    let parsed = match param.kind {
        ParamKind::Bool => Some(Arg::Bool(text.eq_ignore_ascii_case("true"))),
        ParamKind::Char => raw.chars().next().map(Arg::Char),
        ParamKind::Byte => text.parse().ok().map(Arg::Byte),
        ParamKind::Short => text.parse().ok().map(Arg::Short),
        ParamKind::Int => text.parse().ok().map(Arg::Int),
        ParamKind::Long => text.parse().ok().map(Arg::Long),
        ParamKind::Float => text.parse().ok().map(Arg::Float),
        ParamKind::Double => text.parse().ok().map(Arg::Double),
        ParamKind::Str | ParamKind::Object => Some(Arg::Str(raw.to_owned())),
        ParamKind::Request | ParamKind::Response | ParamKind::Chain => return Arg::Null,
    };
    parsed.unwrap_or_else(|| {
        tracing::debug!(kind = %param.kind, value = raw, "value not coercible, passing text through");
        Arg::Str(raw.to_owned())
    })
}

/// Continuation handle passed to filtering actions.
pub trait Continuation {
    /// Hand the request on to whatever follows the filter.
    ///
    /// # Errors
    ///
    /// Whatever the downstream handler fails with.
    fn proceed(&mut self, ctx: &mut dyn RequestContext) -> Result<(), BoxError>;
}

impl<F> Continuation for F
where
    F: FnMut(&mut dyn RequestContext) -> Result<(), BoxError>,
{
    fn proceed(&mut self, ctx: &mut dyn RequestContext) -> Result<(), BoxError> {
        self(ctx)
    }
}

/// Everything an action method receives for one call.
pub struct Invocation<'a> {
    pub(crate) args: Vec<Arg>,
    pub(crate) ctx: &'a mut dyn RequestContext,
    pub(crate) chain: Option<&'a mut dyn Continuation>,
}

impl Invocation<'_> {
    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    #[must_use]
    pub fn context(&self) -> &dyn RequestContext {
        &*self.ctx
    }

    pub fn context_mut(&mut self) -> &mut dyn RequestContext {
        &mut *self.ctx
    }

    #[must_use]
    pub fn has_chain(&self) -> bool {
        self.chain.is_some()
    }

    /// Continue down the filter chain. Without a chain this does nothing.
    ///
    /// # Errors
    ///
    /// Propagates the continuation's failure.
    pub fn proceed(&mut self) -> Result<(), BoxError> {
        match self.chain.as_mut() {
            Some(chain) => chain.proceed(&mut *self.ctx),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("args", &self.args)
            .field("chain", &self.chain.is_some())
            .finish_non_exhaustive()
    }
}
