// vim: tw=80
//! Expectations: one scheduled reaction to a call each.
use std::{
    fmt,
    marker::PhantomData,
    mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use cfg_if::cfg_if;
use fragile::Fragile;
use parking_lot::{Mutex, MutexGuard};
use predicates_tree::CaseTreeExt;

use crate::{BoxError, Predicate, StateName, Violation, predicate,
            state::GateGuard};

#[doc(hidden)]
pub trait ReturnDefault<O> {
    fn maybe_return_default() -> Option<O>;
}

#[derive(Default)]
#[doc(hidden)]
pub struct DefaultReturner<O>(PhantomData<O>);

cfg_if! {
    if #[cfg(feature = "nightly")] {
        impl<O> ReturnDefault<O> for DefaultReturner<O> {
            default fn maybe_return_default() -> Option<O> {
                None
            }
        }

        impl<O: Default> ReturnDefault<O> for DefaultReturner<O> {
            fn maybe_return_default() -> Option<O> {
                Some(O::default())
            }
        }
    } else {
        impl<O> ReturnDefault<O> for DefaultReturner<O> {
            fn maybe_return_default() -> Option<O> {
                None
            }
        }
    }
}

/// Result producers for expectations
enum Rfunc<I, O> {
    Default,
    // Indicates that a `return_once` expectation has already returned
    Expired,
    Mut(Box<dyn FnMut(I) -> O + Send>),
    Once(Box<dyn FnOnce(I) -> O + Send>),
    Raise(Box<dyn FnMut(I) -> BoxError + Send>),
}

impl<I, O> Rfunc<I, O> {
    fn call_mut(&mut self, args: I) -> Result<O, BoxError> {
        match self {
            Rfunc::Default => {
                DefaultReturner::<O>::maybe_return_default()
                    .ok_or_else(|| "Expectation has no producer".into())
            },
            Rfunc::Expired => {
                panic!("Called a method twice that was expected only once")
            },
            Rfunc::Mut(f) => Ok(f(args)),
            Rfunc::Once(_) => {
                match mem::replace(self, Rfunc::Expired) {
                    Rfunc::Once(f) => Ok(f(args)),
                    _ => unreachable!()
                }
            },
            Rfunc::Raise(f) => Err(f(args)),
        }
    }

    /// Can this producer make a value (or an error) at all?
    fn is_set(&self) -> bool {
        !matches!(self, Rfunc::Default) ||
            DefaultReturner::<O>::maybe_return_default().is_some()
    }
}

impl<I, O> Default for Rfunc<I, O> {
    fn default() -> Self {
        Rfunc::Default
    }
}

struct Matcher<I>(Box<dyn Predicate<I> + Send>);

impl<I> Matcher<I> {
    fn matches(&self, i: &I) -> bool {
        self.0.eval(i)
    }

    fn new<P: Predicate<I> + Send + 'static>(p: P) -> Self {
        Matcher(Box::new(p))
    }

    /// Explain why `i` doesn't match
    fn explain(&self, i: &I) -> String {
        match self.0.find_case(false, i) {
            Some(case) => format!("arguments didn't match:\n{}", case.tree()),
            None => format!("arguments didn't match {}", self.0)
        }
    }
}

impl<I> Default for Matcher<I> {
    fn default() -> Self {
        Matcher::new(predicate::always())
    }
}

/// How often an expectation may be called.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Limit {
    Exactly(usize),
    Any,
}

#[derive(Debug)]
struct Times {
    /// How many times has the expectation already been called?
    count: usize,
    limit: Limit,
}

impl Times {
    fn call(&mut self) {
        self.count += 1;
    }

    fn is_exhausted(&self) -> bool {
        match self.limit {
            Limit::Exactly(n) => self.count >= n,
            Limit::Any => false
        }
    }

    fn is_satisfied(&self) -> bool {
        match self.limit {
            Limit::Exactly(n) => self.count >= n,
            Limit::Any => true
        }
    }

    fn remaining(&self) -> Option<usize> {
        match self.limit {
            Limit::Exactly(n) => Some(n.saturating_sub(self.count)),
            Limit::Any => None
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        // Unlike mocks that allow any number of calls, an expectation is
        // consumed by its first matching call unless told otherwise.
        Times{count: 0, limit: Limit::Exactly(1)}
    }
}

/// One scheduled reaction to a call.
///
/// An `Expectation` is created by
/// [`Method::expect`](struct.Method.html#method.expect) and configured
/// through builder methods.  It matches a call when it is not exhausted, when
/// its precondition (if any) equals the current state, and when its matcher
/// accepts the arguments.
pub struct Expectation<I, O> {
    matcher: Matcher<I>,
    precondition: Option<StateName>,
    postcondition: Option<StateName>,
    rfunc: Arc<Mutex<Rfunc<I, O>>>,
    times: Times,
}

impl<I, O> Expectation<I, O> {
    pub fn new() -> Self {
        Expectation {
            matcher: Matcher::default(),
            precondition: None,
            postcondition: None,
            rfunc: Arc::new(Mutex::new(Rfunc::Default)),
            times: Times::default(),
        }
    }

    /// How many times this expectation has matched so far
    pub fn call_count(&self) -> usize {
        self.times.count
    }

    /// Has this expectation been called as often as it may be?
    pub fn is_exhausted(&self) -> bool {
        self.times.is_exhausted()
    }

    /// Has this expectation been called as often as it must be?
    pub fn is_satisfied(&self) -> bool {
        self.times.is_satisfied()
    }

    /// Remaining call count, or `None` if unlimited
    pub fn remaining(&self) -> Option<usize> {
        self.times.remaining()
    }

    /// Expect this expectation to be called exactly once.  This is the
    /// default.
    pub fn once(&mut self) -> &mut Self {
        self.times(1)
    }

    /// Forbid this expectation from ever being matched.
    pub fn never(&mut self) -> &mut Self {
        self.times(0)
    }

    /// Require this expectation to be called exactly `n` times.
    ///
    /// After `n` matching calls it is inert, and later calls fall through to
    /// later expectations.
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.times.limit = Limit::Exactly(n);
        self
    }

    /// Allow this expectation to be called any number of times.
    ///
    /// Such an expectation is never exhausted, so it shadows every
    /// expectation behind it that accepts the same calls.
    pub fn times_any(&mut self) -> &mut Self {
        self.times.limit = Limit::Any;
        self
    }

    /// Only match while the mock is in state `s`.
    pub fn precondition<S: Into<StateName>>(&mut self, s: S) -> &mut Self {
        self.precondition = Some(s.into());
        self
    }

    /// Transition the mock to state `s` after a successful call.
    pub fn postcondition<S: Into<StateName>>(&mut self, s: S) -> &mut Self {
        self.postcondition = Some(s.into());
        self
    }

    /// Shortcut for setting both [`precondition`](#method.precondition) and
    /// [`postcondition`](#method.postcondition).
    pub fn transition<S, T>(&mut self, from: S, to: T) -> &mut Self
        where S: Into<StateName>, T: Into<StateName>
    {
        self.precondition(from).postcondition(to)
    }

    /// Set matching criteria for this Expectation.
    ///
    /// The matching predicate can be anything implementing the
    /// [`Predicate`](trait.Predicate.html) trait.  It is evaluated against the
    /// whole argument tuple.  Only one matcher can be set per `Expectation` at
    /// a time.
    ///
    /// # Examples
    /// ```
    /// # use statemock::*;
    /// let mut e = Expectation::<(u32, u32), ()>::new();
    /// e.with(predicate::function(|(x, y): &(u32, u32)| x == y));
    /// let mut e = Expectation::<u32, ()>::new();
    /// e.with(predicate::eq(5));
    /// ```
    pub fn with<P>(&mut self, p: P) -> &mut Self
        where P: Predicate<I> + Send + 'static
    {
        self.matcher = Matcher::new(p);
        self
    }

    /// Set a matching function for this Expectation.
    ///
    /// This is equivalent to calling [`with`](#method.with) with a function
    /// argument, like `with(predicate::function(f))`.
    pub fn withf<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&I) -> bool + Send + 'static, I: Send + 'static
    {
        self.matcher = Matcher::new(predicate::function(f));
        self
    }

    /// Supply a closure that will provide the return value for this
    /// Expectation.  The method's arguments are passed to the closure by
    /// value.
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(I) -> O + Send + 'static
    {
        *self.rfunc.lock() = Rfunc::Mut(Box::new(f));
        self
    }

    /// Single-threaded version of [`returning`](#method.returning).  Can be
    /// used when the argument or return type isn't `Send`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that originally called this method.
    pub fn returning_st<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(I) -> O + 'static
    {
        let mut fragile = Fragile::new(f);
        let fmut = move |i: I| {
            (fragile.get_mut())(i)
        };
        *self.rfunc.lock() = Rfunc::Mut(Box::new(fmut));
        self
    }

    /// Supply an `FnOnce` closure that will provide the return value for this
    /// Expectation.  This is useful for return types that aren't `Clone`.
    /// Ownership of the value moves to the caller.  It will be an error to
    /// call this Expectation multiple times.
    pub fn return_once<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(I) -> O + Send + 'static
    {
        *self.rfunc.lock() = Rfunc::Once(Box::new(f));
        self
    }

    /// Single-threaded version of [`return_once`](#method.return_once).  This
    /// is useful for return types that are neither `Send` nor `Clone`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that originally called this method.
    pub fn return_once_st<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(I) -> O + 'static
    {
        let fragile = Fragile::new(f);
        let fonce = move |i: I| {
            (fragile.into_inner())(i)
        };
        *self.rfunc.lock() = Rfunc::Once(Box::new(fonce));
        self
    }

    /// Make every matching call fail with the error returned by `f`.
    ///
    /// The error is propagated to the caller unchanged, and the
    /// postcondition is not applied.
    pub fn raising<F, E>(&mut self, mut f: F) -> &mut Self
        where F: FnMut(I) -> E + Send + 'static, E: Into<BoxError>
    {
        let fraise = move |i: I| f(i).into();
        *self.rfunc.lock() = Rfunc::Raise(Box::new(fraise));
        self
    }

    /// Does this expectation accept a call with `args` in state `state`?
    pub(crate) fn accepts(&self, state: &StateName, args: &I) -> bool {
        !self.is_exhausted() &&
            self.precondition.as_ref().map_or(true, |pre| pre == state) &&
            self.matcher.matches(args)
    }

    /// Why doesn't this expectation accept a call?
    pub(crate) fn rejection(&self, state: &StateName, args: &I) -> String {
        if self.is_exhausted() {
            format!("exhausted after {} call(s)", self.times.count)
        } else if let Some(pre) = self.precondition.as_ref()
            .filter(|pre| *pre != state)
        {
            format!("requires state {}", pre)
        } else {
            self.matcher.explain(args)
        }
    }

    pub(crate) fn has_producer(&self) -> bool {
        self.rfunc.lock().is_set()
    }

    /// Record a matching call, and hand out what is needed to finish it.
    pub(crate) fn consume(&mut self) -> Consumed<I, O> {
        self.times.call();
        Consumed {
            rfunc: self.rfunc.clone(),
            postcondition: self.postcondition.clone()
        }
    }

    pub(crate) fn unsatisfied(&self, method: &str, index: usize)
        -> Option<Violation>
    {
        match self.times.limit {
            Limit::Exactly(n) if self.times.count < n => {
                Some(Violation::UnsatisfiedExpectation {
                    method: method.to_owned(),
                    index,
                    expected: n,
                    actual: self.times.count,
                    precondition: self.precondition.clone()
                })
            },
            _ => None
        }
    }
}

impl<I, O: Clone + Send + 'static> Expectation<I, O> {
    /// Return a constant value from the `Expectation`
    ///
    /// The output type must be `Clone`.
    pub fn return_const(&mut self, c: O) -> &mut Self {
        let f = move |_| c.clone();
        self.returning(f)
    }
}

impl<I, O> Default for Expectation<I, O> {
    fn default() -> Self {
        Expectation::new()
    }
}

impl<I, O> fmt::Debug for Expectation<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("matcher", &format_args!("{}", self.matcher.0))
            .field("precondition", &self.precondition)
            .field("postcondition", &self.postcondition)
            .field("times", &self.times)
            .finish()
    }
}

/// What remains of a call after its expectation has been consumed.
pub(crate) struct Consumed<I, O> {
    rfunc: Arc<Mutex<Rfunc<I, O>>>,
    pub(crate) postcondition: Option<StateName>,
}

impl<I, O> Consumed<I, O> {
    /// Run the result producer.  The queue lock must not be held, so that the
    /// producer may call back into the mock.
    ///
    /// # Panics
    ///
    /// If the producer, while running, calls back into the mock and matches
    /// this very expectation again.
    pub(crate) fn produce(&self, args: I) -> Result<O, BoxError> {
        match self.rfunc.try_lock() {
            Some(mut rfunc) => rfunc.call_mut(args),
            None => panic!("Expectation's result producer re-entered while \
                            it was running")
        }
    }
}

/// A freshly appended [`Expectation`], with its method's queue locked.
///
/// Dereferences to the `Expectation`, so all of its builder methods are
/// available.  The method can't be called until the guard is dropped, which
/// normally happens at the end of the statement that created it.
pub struct ExpectationGuard<'guard, I, O> {
    guard: MutexGuard<'guard, Vec<Expectation<I, O>>>,
    i: usize,
    // Must be dropped after `guard`
    _gate: Option<GateGuard>,
}

impl<'guard, I, O> ExpectationGuard<'guard, I, O> {
    pub(crate) fn new(mut guard: MutexGuard<'guard, Vec<Expectation<I, O>>>,
                      gate: Option<GateGuard>) -> Self
    {
        guard.push(Expectation::new());
        let i = guard.len() - 1;
        ExpectationGuard{guard, i, _gate: gate}
    }

    /// Position of this expectation within its method's queue
    pub fn index(&self) -> usize {
        self.i
    }
}

impl<I, O> Deref for ExpectationGuard<'_, I, O> {
    type Target = Expectation<I, O>;

    fn deref(&self) -> &Expectation<I, O> {
        &self.guard[self.i]
    }
}

impl<I, O> DerefMut for ExpectationGuard<'_, I, O> {
    fn deref_mut(&mut self) -> &mut Expectation<I, O> {
        &mut self.guard[self.i]
    }
}
