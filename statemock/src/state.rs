// vim: tw=80
//! The shared "current state" register.
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering}
    },
};

use parking_lot::{Mutex, ReentrantMutex, lock_api::ArcReentrantMutexGuard};

use crate::Error;

/// An opaque, comparable label for the state of a mock.
///
/// The distinguished [`unconstrained`](#method.unconstrained) label is the
/// initial state of every [`StateObject`].
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub struct StateName(Option<Arc<str>>);

impl StateName {
    pub fn new(name: impl AsRef<str>) -> Self {
        StateName(Some(Arc::from(name.as_ref())))
    }

    /// The label of a mock whose test never constrained its state
    pub const fn unconstrained() -> Self {
        StateName(None)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Debug for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(s) => write!(f, "{:?}", s),
            None => f.write_str("<unconstrained>"),
        }
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(s) => f.write_str(s),
            None => f.write_str("<unconstrained>"),
        }
    }
}

impl From<&str> for StateName {
    fn from(s: &str) -> Self {
        StateName::new(s)
    }
}

impl From<String> for StateName {
    fn from(s: String) -> Self {
        StateName(Some(Arc::from(s)))
    }
}

impl From<&StateName> for StateName {
    fn from(s: &StateName) -> Self {
        s.clone()
    }
}

impl PartialEq<str> for StateName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for StateName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

type Gate = Arc<ReentrantMutex<()>>;

static ADOPTION: Mutex<()> = parking_lot::const_mutex(());

/// Held for the duration of a synchronized operation
pub(crate) type GateGuard = ArcReentrantMutexGuard<
    parking_lot::RawMutex, parking_lot::RawThreadId, ()>;

struct Node {
    current: Mutex<StateName>,
    parent: Mutex<Option<StateObject>>,
    /// How many expectations have been consumed through this handle
    consumed: AtomicUsize,
    gate: Option<Gate>,
}

/// A process-local, shared, named "current state".
///
/// Cloning a `StateObject` yields another handle to the same register.  A
/// `StateObject` may [`adopt`](#method.adopt) a parent, after which it is an
/// alias: every read and write goes to the root of the adoption chain.  A
/// child keeps its parent alive.
///
/// # Examples
/// ```
/// # use statemock::*;
/// let parent = StateObject::new();
/// let child = StateObject::new();
/// child.adopt(&parent).unwrap();
/// child.transition("open");
/// assert_eq!(parent.current(), "open");
/// ```
#[derive(Clone)]
pub struct StateObject(Arc<Node>);

impl StateObject {
    pub fn new() -> Self {
        Self::with_gate(None)
    }

    /// Create a `StateObject` whose transitions, and the calls of every
    /// [`Method`](struct.Method.html) bound to it, are serialized by a
    /// reentrant lock.
    pub fn synchronized() -> Self {
        Self::with_gate(Some(Arc::new(ReentrantMutex::new(()))))
    }

    fn with_gate(gate: Option<Gate>) -> Self {
        StateObject(Arc::new(Node {
            current: Mutex::new(StateName::unconstrained()),
            parent: Mutex::new(None),
            consumed: AtomicUsize::new(0),
            gate
        }))
    }

    /// Make this `StateObject` an alias of `parent`.
    ///
    /// Adopting the current parent again is a no-op.  It is an error to adopt
    /// after an expectation was already consumed against this handle or any
    /// of its aliases, or to adopt a `StateObject` that is, or aliases,
    /// `self`.
    pub fn adopt(&self, parent: &StateObject) -> Result<(), Error> {
        // Serializes adoptions, so that two of them can't race into a cycle.
        // Only one `parent` link is ever locked at a time.
        let _adopting = ADOPTION.lock();
        if self.parent().is_some_and(|p| p.ptr_eq(parent)) {
            return Ok(());
        }
        let consumed = self.consumed();
        if consumed > 0 {
            return Err(Error::InvalidStateAdoption(format!(
                "{} expectation(s) were already consumed against the local \
                state", consumed)));
        }
        let mut ancestor = Some(parent.clone());
        while let Some(a) = ancestor {
            if a.ptr_eq(self) {
                return Err(Error::InvalidStateAdoption(
                    "adoption would create a cycle".to_owned()));
            }
            ancestor = a.parent();
        }
        tracing::debug!(parent = %parent.current(), "adopting parent state");
        *self.0.parent.lock() = Some(parent.clone());
        Ok(())
    }

    /// Return the authoritative current state
    pub fn current(&self) -> StateName {
        self.root().0.current.lock().clone()
    }

    /// How many expectations have been consumed against this handle, or
    /// against any handle that aliases it.
    pub fn consumed(&self) -> usize {
        self.0.consumed.load(Ordering::Relaxed)
    }

    pub fn is_aliased(&self) -> bool {
        self.0.parent.lock().is_some()
    }

    pub fn is_synchronized(&self) -> bool {
        self.gate().is_some()
    }

    pub fn parent(&self) -> Option<StateObject> {
        self.0.parent.lock().clone()
    }

    /// Do both handles refer to the same register?
    ///
    /// Two handles that merely alias the same root are not `ptr_eq`.
    pub fn ptr_eq(&self, other: &StateObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The authoritative `StateObject` of this adoption chain
    pub fn root(&self) -> StateObject {
        let mut node = self.clone();
        while let Some(p) = node.parent() {
            node = p;
        }
        node
    }

    /// Set the authoritative current state
    pub fn transition<S: Into<StateName>>(&self, to: S) {
        let _gate = self.lock();
        let to = to.into();
        let root = self.root();
        let mut current = root.0.current.lock();
        tracing::debug!(from = %*current, to = %to, "state transition");
        *current = to;
    }

    /// Count a consumed expectation on this handle and every handle it
    /// aliases, up to the root.
    pub(crate) fn record_consumption(&self) {
        let mut node = Some(self.clone());
        while let Some(n) = node {
            n.0.consumed.fetch_add(1, Ordering::Relaxed);
            node = n.parent();
        }
    }

    /// The coordination lock, if any.
    ///
    /// The outermost gate of the adoption chain wins, so that a parent and all
    /// of its children serialize on one lock.
    fn gate(&self) -> Option<Gate> {
        let mut gate = self.0.gate.clone();
        let mut node = self.parent();
        while let Some(n) = node {
            if n.0.gate.is_some() {
                gate = n.0.gate.clone();
            }
            node = n.parent();
        }
        gate
    }

    /// Acquire the coordination lock when in synchronized mode.
    pub(crate) fn lock(&self) -> Option<GateGuard> {
        self.gate().map(|g| g.lock_arc())
    }
}

impl Default for StateObject {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateObject")
            .field("current", &self.current())
            .field("aliased", &self.is_aliased())
            .field("consumed", &self.consumed())
            .finish()
    }
}
