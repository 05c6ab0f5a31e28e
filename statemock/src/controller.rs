// vim: tw=80
use std::{fmt, sync::Arc, thread};

use crate::{
    AnyMethod,
    Config,
    Dispatch,
    Error,
    FailureMode,
    Interface,
    Method,
    Operation,
    StateName,
    StateObject,
    TypeSignature,
    Violation,
    violation,
};

/// Aggregates every [`Method`] of one mock instance.
///
/// The `Controller` owns the mock's [`StateObject`] and shares it with every
/// registered method.  It never swallows violations; it only collects them.
///
/// # Examples
/// ```
/// # use statemock::*;
/// let mut ctrl = Controller::new();
/// let open = ctrl.method::<(), bool>("MockFile::open", signature!())
///     .unwrap();
/// let read = ctrl.method::<(usize,), Vec<u8>>("MockFile::read",
///                                            signature!(usize))
///     .unwrap();
/// open.expect().postcondition("open").return_const(true);
/// read.expect()
///     .precondition("open")
///     .returning(|(n,)| vec![0; n]);
///
/// assert!(open.call(()));
/// assert_eq!(vec![0, 0], read.call((2,)));
/// assert!(ctrl.verify_all().is_empty());
/// ```
pub struct Controller {
    state: StateObject,
    config: Config,
    methods: Vec<Arc<dyn AnyMethod>>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let state = if config.synchronized {
            StateObject::synchronized()
        } else {
            StateObject::new()
        };
        Controller { state, config, methods: Vec::new() }
    }

    /// Attach a `Method`, sharing this `Controller`'s state with it.
    ///
    /// Fails if a method with the same name and signature is already
    /// registered, or if `method` already consumed expectations against
    /// another state.
    pub fn register<I, O>(&mut self, mut method: Method<I, O>)
        -> Result<Arc<Method<I, O>>, Error>
        where I: 'static, O: 'static
    {
        if self.lookup(method.name(), &method.signature()).is_some() {
            return Err(Error::AmbiguousOverload {
                method: method.name().to_owned(),
                signature: method.signature(),
                reason: "already registered with this controller".to_owned()
            });
        }
        method.rebind(self.state.clone())?;
        AnyMethod::set_failure_mode(&method, self.config.failure_mode);
        tracing::trace!(method = %method.name(),
                        signature = %method.signature(), "registered");
        let method = Arc::new(method);
        self.methods.push(method.clone());
        Ok(method)
    }

    /// Create a `Method` and [`register`](#method.register) it.
    pub fn method<I, O>(&mut self, name: impl Into<String>,
                        signature: TypeSignature)
        -> Result<Arc<Method<I, O>>, Error>
        where I: fmt::Debug + 'static, O: 'static
    {
        let m = Method::with_state(name, signature, self.state.clone());
        self.register(m)
    }

    /// Look up a registered method by name and signature.
    ///
    /// Returns `None` if no such method is registered, or if it was
    /// registered with different argument or return types.
    pub fn get<I, O>(&self, name: &str, signature: &TypeSignature)
        -> Option<&Method<I, O>>
        where I: 'static, O: 'static
    {
        self.lookup(name, signature)?
            .downcast_ref::<Method<I, O>>()
            .ok()
    }

    fn lookup(&self, name: &str, signature: &TypeSignature)
        -> Option<&dyn AnyMethod>
    {
        self.methods.iter()
            .find(|m| m.name() == name && m.signature() == *signature)
            .map(|m| &**m)
    }

    /// The dispatch table for every overload of `name`
    pub fn dispatch(&self, name: &str) -> Option<Dispatch> {
        let overloads: Vec<_> = self.methods.iter()
            .filter(|m| m.name() == name)
            .cloned()
            .collect();
        // Signatures were checked for uniqueness during registration
        Dispatch::new(overloads).ok()
    }

    /// The operations of `interface` that must be overridden, but for which
    /// no method is registered.
    ///
    /// Methods are matched to operations by name and signature; a mock may
    /// prefix its method names (as in `MockFoo::foo`), so only the part after
    /// the last `::` is compared.
    pub fn unbound<'i>(&self, interface: &'i Interface) -> Vec<&'i Operation> {
        interface.abstract_operations()
            .filter(|op| !self.methods.iter().any(|m| {
                let short = m.name().rsplit("::").next().unwrap_or_default();
                short == op.name() && m.signature() == op.signature()
            }))
            .collect()
    }

    /// Concatenate the violations of every registered method, in
    /// registration order.
    pub fn verify_all(&self) -> Vec<Violation> {
        self.methods.iter()
            .flat_map(|m| m.verify())
            .collect()
    }

    /// Panic with a collective report if there are any violations.
    pub fn assert_satisfied(&self) {
        if let Some(r) = violation::report(&self.verify_all()) {
            panic!("{}", r);
        }
    }

    /// Make this controller's state an alias of `parent`'s.
    ///
    /// Used when this mock is a constituent of a larger, composed mock.  Must
    /// be called before any call is intercepted on this mock.
    pub fn share_state_with(&self, parent: &Controller) -> Result<(), Error> {
        self.adopt_state(&parent.state)
    }

    /// Like [`share_state_with`](#method.share_state_with), for a bare
    /// `StateObject`.
    pub fn adopt_state(&self, parent: &StateObject) -> Result<(), Error> {
        self.state.adopt(parent)
    }

    pub fn set_failure_mode(&mut self, mode: FailureMode) {
        self.config.failure_mode = mode;
        for m in self.methods.iter() {
            m.set_failure_mode(mode);
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &StateObject {
        &self.state
    }

    /// Shortcut for `self.state().current()`
    pub fn current(&self) -> StateName {
        self.state.current()
    }

    /// Shortcut for `self.state().transition(to)`
    pub fn transition<S: Into<StateName>>(&self, to: S) {
        self.state.transition(to)
    }

    pub fn methods(&self) -> impl Iterator<Item = &dyn AnyMethod> {
        self.methods.iter().map(|m| &**m)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.config.verify_on_drop && !thread::panicking() {
            self.assert_satisfied();
        }
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods = self.methods.iter()
            .map(|m| format!("{}{}", m.name(), m.signature()))
            .collect::<Vec<_>>();
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("methods", &methods)
            .finish()
    }
}
