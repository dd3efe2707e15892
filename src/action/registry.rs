use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::args::{Invocation, ParamKind};
use super::dispatch::ResolvedAction;
use super::{Action, InitParams};
use crate::types::{ActionResolutionError, ActionResult, BoxError};

pub(crate) type Instance = Box<dyn Any + Send + Sync>;
type Factory = dyn Fn() -> Result<Instance, BoxError> + Send + Sync;
type InitHook = dyn Fn(&mut (dyn Any + Send + Sync), &InitParams) -> Result<(), BoxError> + Send + Sync;
type DestroyHook = dyn Fn(&mut (dyn Any + Send + Sync)) + Send + Sync;
type Call = dyn Fn(&(dyn Any + Send + Sync), &mut Invocation<'_>) -> Result<Option<ActionResult>, BoxError>
    + Send
    + Sync;

pub(crate) struct MethodDef {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamKind>,
    pub(crate) call: Box<Call>,
}

/// An externally supplied behavior: a constructor, its callable methods, and
/// optional lifecycle hooks.
///
/// Built with [`Behavior::builder`], which keeps the instance type `T` visible
/// to every registered closure.
pub struct Behavior {
    name: String,
    factory: Box<Factory>,
    pub(crate) methods: Vec<MethodDef>,
    on_init: Option<Box<InitHook>>,
    on_destroy: Option<Box<DestroyHook>>,
}

/// Typed builder for a [`Behavior`].
///
/// # Example
///
/// ```
/// use rewrite_rules::{Behavior, ParamKind};
///
/// #[derive(Default)]
/// struct Audit;
///
/// let behavior = Behavior::builder("audit", Audit::default)
///     .method("run", &[ParamKind::Request, ParamKind::Response], |_audit, _inv| Ok(None))
///     .build();
/// assert_eq!(behavior.name(), "audit");
/// ```
#[must_use]
pub struct BehaviorBuilder<T> {
    inner: Behavior,
    _instance: PhantomData<fn() -> T>,
}

impl Behavior {
    /// Start a behavior whose instances come from an infallible constructor.
    pub fn builder<T, F>(name: &str, factory: F) -> BehaviorBuilder<T>
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::try_builder(name, move || Ok(factory()))
    }

    /// Start a behavior whose constructor may fail.
    pub fn try_builder<T, F>(name: &str, factory: F) -> BehaviorBuilder<T>
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        BehaviorBuilder {
            inner: Behavior {
                name: name.to_owned(),
                factory: Box::new(move || factory().map(|t| Box::new(t) as Instance)),
                methods: Vec::new(),
                on_init: None,
                on_destroy: None,
            },
            _instance: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a method with exactly these parameter kinds exists.
    #[must_use]
    pub fn supports(&self, method: &str, params: &[ParamKind]) -> bool {
        self.find(method, params).is_some()
    }

    pub(crate) fn find(&self, method: &str, params: &[ParamKind]) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| m.name == method && m.params == params)
    }

    /// Construct a fresh instance and run the init hook.
    pub(crate) fn instantiate(&self, params: &InitParams) -> Result<Instance, BoxError> {
        let mut instance = (self.factory)()?;
        if let Some(hook) = &self.on_init {
            hook(instance.as_mut(), params)?;
        }
        Ok(instance)
    }

    pub(crate) fn release(&self, mut instance: Instance) {
        if let Some(hook) = &self.on_destroy {
            hook(instance.as_mut());
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<String> = self
            .methods
            .iter()
            .map(|m| {
                let params: Vec<String> = m.params.iter().map(ToString::to_string).collect();
                format!("{}({})", m.name, params.join(", "))
            })
            .collect();
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("methods", &methods)
            .field("on_init", &self.on_init.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

impl<T: Any + Send + Sync> BehaviorBuilder<T> {
    /// Register a callable method with its parameter kinds.
    pub fn method<F>(mut self, name: &str, params: &[ParamKind], f: F) -> Self
    where
        F: Fn(&T, &mut Invocation<'_>) -> Result<Option<ActionResult>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        let call: Box<Call> = Box::new(
            move |instance: &(dyn Any + Send + Sync), inv: &mut Invocation<'_>| {
                match instance.downcast_ref::<T>() {
                    Some(instance) => f(instance, inv),
                    None => Err("instance has an unexpected type".into()),
                }
            },
        );
        self.inner.methods.push(MethodDef {
            name: name.to_owned(),
            params: params.to_vec(),
            call,
        });
        self
    }

    /// Hook run on every new instance, receiving the action's init params.
    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &InitParams) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.inner.on_init = Some(Box::new(
            move |instance: &mut (dyn Any + Send + Sync), params: &InitParams| {
                match instance.downcast_mut::<T>() {
                    Some(instance) => f(instance, params),
                    None => Err("instance has an unexpected type".into()),
                }
            },
        ));
        self
    }

    /// Hook run once when an instance is released.
    pub fn on_destroy<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.inner.on_destroy = Some(Box::new(move |instance: &mut (dyn Any + Send + Sync)| {
            if let Some(instance) = instance.downcast_mut::<T>() {
                f(instance);
            }
        }));
        self
    }

    #[must_use]
    pub fn build(self) -> Behavior {
        self.inner
    }
}

/// Binds [`Action`] definitions to something invocable during rule
/// initialization.
pub trait ActionResolver {
    /// # Errors
    ///
    /// Returns [`ActionResolutionError`] when the action cannot be bound.
    fn resolve(&self, action: &Action) -> Result<ResolvedAction, ActionResolutionError>;
}

/// A closed registry mapping action names to behaviors.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    behaviors: HashMap<String, Arc<Behavior>>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior under its own name, replacing any earlier one.
    #[must_use]
    pub fn register(mut self, behavior: Behavior) -> Self {
        self.insert(behavior);
        self
    }

    pub fn insert(&mut self, behavior: Behavior) {
        self.behaviors
            .insert(behavior.name().to_owned(), Arc::new(behavior));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Behavior>> {
        self.behaviors.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl ActionResolver for ActionRegistry {
    fn resolve(&self, action: &Action) -> Result<ResolvedAction, ActionResolutionError> {
        if action.name.trim().is_empty() {
            return Err(ActionResolutionError::BlankName);
        }
        let behavior = self.behaviors.get(action.name.trim()).ok_or_else(|| {
            ActionResolutionError::UnknownBehavior {
                name: action.name.clone(),
            }
        })?;
        ResolvedAction::bind(Arc::clone(behavior), action)
    }
}

/// Resolver that validates action definitions without binding any behavior.
/// Every action it resolves is inert and returns no result.
///
/// Useful in tests that exercise rules carrying actions whose behaviors are
/// not available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipLoading;

impl ActionResolver for SkipLoading {
    fn resolve(&self, action: &Action) -> Result<ResolvedAction, ActionResolutionError> {
        if action.name.trim().is_empty() {
            return Err(ActionResolutionError::BlankName);
        }
        ResolvedAction::inert(action)
    }
}
