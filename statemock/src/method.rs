// vim: tw=80
//! One mocked operation: a signature, an expectation queue and a shared
//! state.
use std::{fmt, panic};

use downcast::*;
use parking_lot::Mutex;

use crate::{
    Error,
    FailureMode,
    StateObject,
    TypeSignature,
    Violation,
    expectation::{Expectation, ExpectationGuard},
};

/// Type-erased view of a [`Method`], used by the
/// [`Controller`](struct.Controller.html) for bulk operations.
pub trait AnyMethod: Any + Send + Sync {
    fn name(&self) -> &str;

    fn signature(&self) -> TypeSignature;

    /// See [`Method::verify`](struct.Method.html#method.verify)
    fn verify(&self) -> Vec<Violation>;

    fn set_failure_mode(&self, mode: FailureMode);

    /// How many expectations this method has consumed
    fn consumed(&self) -> usize;
}
downcast!(dyn AnyMethod);

type Fallback<I, O> = Box<dyn FnMut(I) -> O + Send>;

/// A mocked operation.
///
/// A `Method` owns the ordered queue of [`Expectation`]s programmed for one
/// operation, and shares a [`StateObject`] with the other methods of the same
/// mock.  `I` is the tuple of the operation's arguments and `O` its return
/// type.
///
/// # Examples
/// ```
/// # use statemock::*;
/// let m = Method::<(u32,), u32>::new("MockFoo::foo", signature!(u32));
/// m.expect()
///     .with(predicate::eq((4,)))
///     .postcondition("fed")
///     .returning(|(x,)| x + 1);
/// assert_eq!(5, m.call((4,)));
/// assert_eq!(m.state().current(), "fed");
/// assert!(m.verify().is_empty());
/// ```
pub struct Method<I, O> {
    name: String,
    signature: TypeSignature,
    state: StateObject,
    queue: Mutex<Vec<Expectation<I, O>>>,
    /// Unexpected calls recorded in [`FailureMode::Record`]
    violations: Mutex<Vec<Violation>>,
    mode: Mutex<FailureMode>,
    fallback: Mutex<Option<Fallback<I, O>>>,
    fmt_args: fn(&I) -> String,
}

impl<I: fmt::Debug, O> Method<I, O> {
    /// Create a `Method` with its own, unshared, state.
    pub fn new(name: impl Into<String>, signature: TypeSignature) -> Self {
        Self::with_state(name, signature, StateObject::new())
    }

    /// Create a `Method` bound to an existing state.
    pub fn with_state(name: impl Into<String>, signature: TypeSignature,
                      state: StateObject) -> Self
    {
        Self::build(name.into(), signature, state, debug_args::<I>)
    }
}

fn debug_args<I: fmt::Debug>(args: &I) -> String {
    let s = format!("{:?}", args);
    if s.starts_with('(') {
        s
    } else {
        format!("({})", s)
    }
}

fn opaque_args<I>(_: &I) -> String {
    "(..)".to_owned()
}

impl<I, O> Method<I, O> {
    /// Like [`new`](#method.new), for argument tuples that aren't `Debug`.
    /// Reports will not show the actual arguments.
    pub fn opaque(name: impl Into<String>, signature: TypeSignature) -> Self {
        Self::build(name.into(), signature, StateObject::new(), opaque_args::<I>)
    }

    fn build(name: String, signature: TypeSignature, state: StateObject,
             fmt_args: fn(&I) -> String) -> Self
    {
        Method {
            name,
            signature,
            state,
            queue: Mutex::new(Vec::new()),
            violations: Mutex::new(Vec::new()),
            mode: Mutex::new(FailureMode::default()),
            fallback: Mutex::new(None),
            fmt_args,
        }
    }

    /// Simulate calling the real method.
    ///
    /// Every unexhausted expectation is checked in FIFO order and the first
    /// one admitted by the current state and matching the arguments is used.
    ///
    /// # Panics
    ///
    /// * If no expectation matches, unless the method is in
    ///   [`FailureMode::Record`] and has a fallback (see
    ///   [`unexpected_returning`](#method.unexpected_returning)).
    /// * If the matching expectation was programmed to raise an error.  The
    ///   panic payload is the [`Error::Producer`] value, so that it may be
    ///   recovered with `catch_unwind`.
    pub fn call(&self, args: I) -> O {
        let _gate = self.state.lock();
        match self.select(&args) {
            Ok(consumed) => match self.finish(consumed, args) {
                Ok(o) => o,
                Err(e) => panic::panic_any(e)
            },
            Err(e @ Error::UnexpectedCall{..}) => {
                let e = self.reject(e);
                if self.failure_mode() == FailureMode::Record {
                    // Not locked while running, so it may call this method
                    let fallback = self.fallback.lock().take();
                    if let Some(mut f) = fallback {
                        let o = f(args);
                        let mut slot = self.fallback.lock();
                        if slot.is_none() {
                            *slot = Some(f);
                        }
                        return o;
                    }
                }
                panic!("{}", e)
            },
            Err(e) => panic!("{}", e)
        }
    }

    /// Like [`call`](#method.call), but returns errors instead of panicking.
    ///
    /// An unexpected call is still recorded in [`FailureMode::Record`].
    pub fn try_call(&self, args: I) -> Result<O, Error> {
        let _gate = self.state.lock();
        let consumed = self.select(&args).map_err(|e| self.reject(e))?;
        self.finish(consumed, args)
    }

    /// Create a new expectation for this method.
    ///
    /// The expectation is appended to the queue, behind every expectation
    /// created before it.
    pub fn expect(&self) -> ExpectationGuard<'_, I, O> {
        let gate = self.state.lock();
        ExpectationGuard::new(self.queue.lock(), gate)
    }

    /// Every violation of this method: unexpected calls recorded in
    /// [`FailureMode::Record`], followed by every expectation that was not
    /// called as often as required.
    ///
    /// Does not modify the queue, so it can be called any number of times.
    pub fn verify(&self) -> Vec<Violation> {
        let mut v = self.violations.lock().clone();
        v.extend(self.queue.lock()
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.unsatisfied(&self.name, i)));
        v
    }

    /// Supply a closure that provides the return value for calls that no
    /// expectation matches.  Only used in [`FailureMode::Record`].
    ///
    /// The fallback may call back into this method.  But while it runs, it
    /// is not available to the unexpected calls it makes itself.
    pub fn unexpected_returning<F>(&self, f: F)
        where F: FnMut(I) -> O + Send + 'static
    {
        *self.fallback.lock() = Some(Box::new(f));
    }

    pub fn failure_mode(&self) -> FailureMode {
        *self.mode.lock()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> TypeSignature {
        self.signature
    }

    pub fn state(&self) -> &StateObject {
        &self.state
    }

    /// Number of expectations ever programmed, exhausted ones included
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// How many calls this method has matched so far
    pub fn consumed(&self) -> usize {
        self.queue.lock().iter().map(Expectation::call_count).sum()
    }

    /// Bind this method to a different state.  Only allowed before it consumed
    /// anything.
    pub(crate) fn rebind(&mut self, state: StateObject) -> Result<(), Error> {
        let consumed = self.consumed();
        if consumed > 0 && !self.state.ptr_eq(&state) {
            return Err(Error::InvalidStateAdoption(format!(
                "{} already consumed {} expectation(s) against its own state",
                self.name, consumed)));
        }
        self.state = state;
        Ok(())
    }

    /// Find the first matching expectation and consume it.
    fn select(&self, args: &I)
        -> Result<crate::expectation::Consumed<I, O>, Error>
    {
        let state = self.state.current();
        let mut queue = self.queue.lock();
        match queue.iter().position(|e| e.accepts(&state, args)) {
            Some(i) => {
                let e = &mut queue[i];
                if !e.has_producer() {
                    return Err(Error::MissingProducer {
                        method: self.name.clone(),
                        index: i
                    });
                }
                tracing::debug!(method = %self.name, index = i,
                                state = %state, "matched expectation");
                self.state.record_consumption();
                Ok(e.consume())
            },
            None => {
                let candidates = queue.iter()
                    .map(|e| e.rejection(&state, args))
                    .collect();
                Err(Error::UnexpectedCall {
                    method: self.name.clone(),
                    args: (self.fmt_args)(args),
                    state,
                    candidates
                })
            }
        }
    }

    /// Produce the result, then apply the postcondition.
    fn finish(&self, consumed: crate::expectation::Consumed<I, O>, args: I)
        -> Result<O, Error>
    {
        let o = consumed.produce(args)
            .map_err(|source| Error::Producer {
                method: self.name.clone(),
                source
            })?;
        if let Some(post) = consumed.postcondition {
            self.state.transition(post);
        }
        Ok(o)
    }

    /// Log a failed selection, and record it if so configured.
    fn reject(&self, e: Error) -> Error {
        if let Some(v) = Violation::from_error(&e) {
            tracing::warn!(method = %self.name, "{}", v);
            if self.failure_mode() == FailureMode::Record {
                self.violations.lock().push(v);
            }
        }
        e
    }
}

impl<I, O> AnyMethod for Method<I, O>
    where I: 'static, O: 'static
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> TypeSignature {
        self.signature
    }

    fn verify(&self) -> Vec<Violation> {
        Method::verify(self)
    }

    fn set_failure_mode(&self, mode: FailureMode) {
        *self.mode.lock() = mode;
    }

    fn consumed(&self) -> usize {
        Method::consumed(self)
    }
}

impl<I, O> fmt::Debug for Method<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("state", &self.state)
            .field("expectations", &*self.queue.lock())
            .finish()
    }
}
