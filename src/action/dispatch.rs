use std::fmt;
use std::sync::Arc;

use super::args::{coerce, Arg, Continuation, Invocation, ParamKind, ParamSpec};
use super::registry::{Behavior, Instance};
use super::Action;
use crate::types::{
    ActionInvocationError, ActionResolutionError, ActionResult, RequestContext, Selector,
};

/// Signatures probed, in order, when an action names no explicit parameters.
pub(crate) const DEFAULT_SIGNATURES: [&[ParamKind]; 2] = [
    &[ParamKind::Request, ParamKind::Response],
    &[ParamKind::Request, ParamKind::Response, ParamKind::Chain],
];

/// An action bound to a behavior method, ready to be invoked.
///
/// Singleton actions construct their instance here, once; per-call actions
/// construct and release one around every invocation.
pub struct ResolvedAction {
    name: String,
    method: String,
    params: Vec<ParamSpec>,
    target: Option<Bound>,
    per_call: bool,
    filter: bool,
}

struct Bound {
    behavior: Arc<Behavior>,
    method: usize,
    init_params: super::InitParams,
    instance: Option<Instance>,
}

impl ResolvedAction {
    /// Bind `action` to a method of `behavior`.
    ///
    /// An explicit signature must match exactly; otherwise the default
    /// signatures are probed in order and the first supported one wins.
    ///
    /// # Errors
    ///
    /// Returns [`ActionResolutionError`] if the method string does not parse,
    /// no method matches, or the singleton instance cannot be constructed.
    pub fn bind(behavior: Arc<Behavior>, action: &Action) -> Result<Self, ActionResolutionError> {
        let signature = crate::parse::parse_method(&action.method)?;
        let found = match &signature.params {
            Some(params) => {
                let kinds: Vec<ParamKind> = params.iter().map(|p| p.kind).collect();
                behavior
                    .find(&signature.name, &kinds)
                    .map(|index| (index, params.clone()))
            }
            None => DEFAULT_SIGNATURES.iter().find_map(|kinds| {
                tracing::trace!(action = %action.name, method = %signature.name, ?kinds, "probing signature");
                behavior.find(&signature.name, kinds).map(|index| {
                    (index, kinds.iter().copied().map(ParamSpec::new).collect())
                })
            }),
        };
        let Some((method, params)) = found else {
            return Err(ActionResolutionError::NoMatchingSignature {
                name: action.name.clone(),
                method: signature.name,
            });
        };
        let instance = if action.per_call {
            None
        } else {
            let instance = behavior.instantiate(&action.init_params).map_err(|source| {
                ActionResolutionError::Construct {
                    name: action.name.clone(),
                    source,
                }
            })?;
            Some(instance)
        };
        let filter = params.iter().any(|p| p.kind == ParamKind::Chain);
        tracing::debug!(action = %action.name, method = %signature.name, filter, per_call = action.per_call, "action resolved");
        Ok(Self {
            name: action.name.clone(),
            method: signature.name,
            params,
            target: Some(Bound {
                behavior,
                method,
                init_params: action.init_params.clone(),
                instance,
            }),
            per_call: action.per_call,
            filter,
        })
    }

    /// An action whose signature was validated but which has nothing to run.
    ///
    /// # Errors
    ///
    /// Returns [`ActionResolutionError::Signature`] if the method string does
    /// not parse.
    pub fn inert(action: &Action) -> Result<Self, ActionResolutionError> {
        let signature = crate::parse::parse_method(&action.method)?;
        let params = signature.params.unwrap_or_default();
        let filter = params.iter().any(|p| p.kind == ParamKind::Chain);
        Ok(Self {
            name: action.name.clone(),
            method: signature.name,
            params,
            target: None,
            per_call: action.per_call,
            filter,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Whether the bound method takes a continuation handle.
    #[must_use]
    pub fn is_filter(&self) -> bool {
        self.filter
    }

    #[must_use]
    pub fn is_per_call(&self) -> bool {
        self.per_call
    }

    /// Bind arguments and call the method.
    ///
    /// `groups` is the positional argument source: primary match groups
    /// followed by condition match groups.
    pub(crate) fn invoke<'a>(
        &self,
        groups: &[String],
        ctx: &'a mut dyn RequestContext,
        chain: Option<&'a mut dyn Continuation>,
    ) -> Result<Option<ActionResult>, ActionInvocationError> {
        let Some(bound) = &self.target else {
            return Ok(None);
        };
        let args = self.bind_args(groups, &*ctx, chain.is_some());
        tracing::debug!(action = %self.name, method = %self.method, ?args, "invoking action");
        let mut inv = Invocation { args, ctx, chain };
        let method = &bound.behavior.methods[bound.method];
        if self.per_call {
            let instance = bound
                .behavior
                .instantiate(&bound.init_params)
                .map_err(|source| self.failure("new", source))?;
            let result = (method.call)(&*instance, &mut inv);
            bound.behavior.release(instance);
            result.map_err(|source| self.failure(&self.method, source))
        } else {
            match &bound.instance {
                Some(instance) => (method.call)(&**instance, &mut inv)
                    .map_err(|source| self.failure(&self.method, source)),
                None => Ok(None),
            }
        }
    }

    fn bind_args(&self, groups: &[String], ctx: &dyn RequestContext, has_chain: bool) -> Vec<Arg> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                if param.kind.is_structural() {
                    return structural_arg(param.kind, has_chain);
                }
                match &param.binding {
                    Some(name) => {
                        let value = ctx.lookup(&binding_selector(name));
                        coerce(param, value.as_deref())
                    }
                    None => coerce(param, groups.get(i).map(String::as_str)),
                }
            })
            .collect()
    }

    fn failure(&self, method: &str, source: crate::types::BoxError) -> ActionInvocationError {
        ActionInvocationError {
            action: self.name.clone(),
            method: method.to_owned(),
            source,
        }
    }

    /// Release the singleton instance. Safe to call more than once.
    pub(crate) fn destroy(&mut self) {
        if let Some(bound) = &mut self.target {
            if let Some(instance) = bound.instance.take() {
                tracing::debug!(action = %self.name, "destroying action instance");
                bound.behavior.release(instance);
            }
        }
    }
}

impl Drop for ResolvedAction {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for ResolvedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAction")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("bound", &self.target.is_some())
            .field("per_call", &self.per_call)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Request, response and chain parameters ignore any binding name.
fn structural_arg(kind: ParamKind, has_chain: bool) -> Arg {
    match kind {
        ParamKind::Request => Arg::Request,
        ParamKind::Response => Arg::Response,
        ParamKind::Chain if has_chain => Arg::Chain,
        _ => Arg::Null,
    }
}

/// A binding is a request parameter name unless it reads as `selector:key`.
fn binding_selector(name: &str) -> Selector {
    if name.contains(':') {
        if let Ok(selector) = name.parse() {
            return selector;
        }
    }
    Selector::Param(name.to_owned())
}
