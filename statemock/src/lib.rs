// vim: tw=80
//! A state-aware mock object engine for Rust.
//!
//! Statemock is the runtime half of a mock object library.  It doesn't
//! generate mock types; instead it provides the machinery a mock type is built
//! from, whether the mock is written by hand or emitted by a generator.
//!
//! # Usage
//!
//! The basic idea is the same as with any expectation-based mock library.
//! * Create a mock struct that holds a [`Controller`] and one [`Method`] per
//!   mocked operation, and implement the real trait by forwarding every call
//!   to [`Method::call`].
//! * In your test, program [`Expectation`]s on the mock's methods.  Each
//!   expectation can have an argument matcher, a call count, a precondition
//!   state, a postcondition state, and a result producer.
//! * Supply the mock object to the code that you're testing.  It will return
//!   the preprogrammed return values.  Any call contrary to your expectations
//!   is a violation.
//! * Finally, check that every expectation was met with
//!   [`Controller::verify_all`].
//!
//! What sets Statemock apart is the shared state.  All methods of one mock
//! share a single [`StateObject`].  An expectation may require a state to be
//! current before it can match, and may move the mock to a new state after it
//! matches.  That makes it easy to express protocols like "`read` may only be
//! called after `open`".
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`States`](#states)
//! * [`Composed mocks`](#composed-mocks)
//! * [`Failure modes`](#failure-modes)
//! * [`Overloads`](#overloads)
//! * [`Synchronization`](#synchronization)
//!
//! ## Getting Started
//! ```
//! use std::sync::Arc;
//! use statemock::*;
//!
//! trait Door {
//!     fn open(&self) -> bool;
//!     fn knock(&self, times: u32) -> u32;
//! }
//!
//! struct MockDoor {
//!     ctrl: Controller,
//!     open: Arc<Method<(), bool>>,
//!     knock: Arc<Method<(u32,), u32>>,
//! }
//!
//! impl MockDoor {
//!     fn new() -> Self {
//!         let mut ctrl = Controller::new();
//!         let open = ctrl.method("MockDoor::open", signature!()).unwrap();
//!         let knock = ctrl.method("MockDoor::knock", signature!(u32))
//!             .unwrap();
//!         MockDoor { ctrl, open, knock }
//!     }
//! }
//!
//! impl Door for MockDoor {
//!     fn open(&self) -> bool {
//!         self.open.call(())
//!     }
//!     fn knock(&self, times: u32) -> u32 {
//!         self.knock.call((times,))
//!     }
//! }
//!
//! fn call_knock(x: &dyn Door) -> u32 {
//!     x.knock(3)
//! }
//!
//! let mock = MockDoor::new();
//! mock.knock.expect().returning(|(x,)| x + 1);
//! assert_eq!(4, call_knock(&mock));
//! mock.ctrl.assert_satisfied();
//! ```
//!
//! Each mocked operation is identified by its name and its [`TypeSignature`],
//! conveniently built with the [`signature!`] macro.  The method's arguments
//! are passed around as a tuple, `()` for none and `(x,)` for one.
//!
//! ## Return values
//!
//! Every expectation needs a result producer.  The most flexible is
//! [`returning`](Expectation::returning), which takes a closure of the
//! argument tuple.  [`return_const`](Expectation::return_const) returns a
//! clone of a fixed value, and [`return_once`](Expectation::return_once)
//! moves a value that isn't `Clone` out to the caller.
//!
//! An expectation can also be programmed to fail, with
//! [`raising`](Expectation::raising).  [`Method::call`] panics with the
//! resulting [`Error::Producer`], while [`Method::try_call`] returns it.
//! ```
//! # use statemock::*;
//! let m = Method::<(), u32>::new("MockDisk::write", signature!());
//! m.expect().raising(|_| "disk full");
//! let e = m.try_call(()).unwrap_err();
//! assert!(e.is_producer_error());
//! assert_eq!("disk full", e.producer_error().unwrap().to_string());
//! ```
//!
//! With the `nightly` feature, an expectation without a producer returns
//! `O::default()` if the return type implements `Default`.  Otherwise a call
//! matching it fails with [`Error::MissingProducer`].
//!
//! ## Matching arguments
//!
//! An expectation can require the method's arguments to satisfy a
//! [`Predicate`].  The [`predicate`] module reexported from the `predicates`
//! crate has plenty of them, and [`withf`](Expectation::withf) accepts a bare
//! closure.
//! ```
//! # use statemock::*;
//! let m = Method::<(u32, u32), u32>::new("MockCalc::add",
//!                                        signature!(u32, u32));
//! m.expect().with(predicate::eq((1, 2))).return_const(3);
//! m.expect().withf(|(x, y)| x > y).return_const(0);
//! assert_eq!(0, m.call((5, 1)));
//! assert_eq!(3, m.call((1, 2)));
//! ```
//!
//! ### Matching multiple calls
//!
//! A method's expectations form a queue.  Each call is matched against the
//! unexhausted expectations in the order they were created, and the first one
//! that matches wins.  No expectation "blocks" the ones behind it.
//!
//! ## Call counts
//!
//! By default, every expectation must be matched exactly once.  After that it
//! is exhausted and later calls fall through to later expectations.  Use
//! [`times`](Expectation::times) to require a different count,
//! [`never`](Expectation::never) to forbid a call, or
//! [`times_any`](Expectation::times_any) to allow any number of calls.
//! ```
//! # use statemock::*;
//! let m = Method::<(), u32>::new("MockClock::tick", signature!());
//! m.expect().times(2).return_const(1);
//! m.expect().return_const(2);
//! assert_eq!(1, m.call(()));
//! assert_eq!(1, m.call(()));
//! assert_eq!(2, m.call(()));
//! assert!(m.verify().is_empty());
//! ```
//!
//! [`Method::verify`] and [`Controller::verify_all`] report every expectation
//! that was called fewer times than required, without modifying anything.
//!
//! ## States
//!
//! An expectation with a [`precondition`](Expectation::precondition) only
//! matches while its mock is in that state.  An expectation with a
//! [`postcondition`](Expectation::postcondition) moves the mock to that
//! state after it produces a result.  A fresh mock is in no particular
//! state; only expectations without a precondition match it.
//! ```
//! # use statemock::*;
//! let m = Method::<(), u32>::new("MockSeq::next", signature!());
//! m.expect().postcondition("A").return_const(1);
//! m.expect().transition("A", "B").return_const(2);
//! assert_eq!(1, m.call(()));
//! assert_eq!(2, m.call(()));
//! assert_eq!(m.state().current(), "B");
//! // A third call would panic: nothing matches in state B.
//! assert!(m.try_call(()).is_err());
//! ```
//!
//! ## Composed mocks
//!
//! When a mock is a part of a larger mock, the two should share one state.
//! [`Controller::share_state_with`] makes the part's state an alias of the
//! whole's.  It must be called before the part intercepts any call.
//! ```
//! # use statemock::*;
//! let parent = Controller::new();
//! let mut child = Controller::new();
//! child.share_state_with(&parent).unwrap();
//! let poke = child.method::<(), ()>("MockChild::poke", signature!())
//!     .unwrap();
//! poke.expect().postcondition("poked").return_const(());
//! poke.call(());
//! assert_eq!(parent.current(), "poked");
//! ```
//!
//! ## Failure modes
//!
//! By default an unexpected call panics immediately.  In
//! [`FailureMode::Record`], it is recorded instead, so that a test can see
//! every violation at once.  Since the call must still return something,
//! supply a fallback with [`Method::unexpected_returning`].
//! ```
//! # use statemock::*;
//! let mut ctrl = Controller::with_config(Config::new()
//!     .failure_mode(FailureMode::Record));
//! let m = ctrl.method::<(u32,), u32>("MockFoo::foo", signature!(u32))
//!     .unwrap();
//! m.unexpected_returning(|_| 0);
//! m.expect().with(predicate::eq((1,))).return_const(10);
//! assert_eq!(0, m.call((2,)));
//! assert_eq!(10, m.call((1,)));
//! let v = ctrl.verify_all();
//! assert_eq!(1, v.len());
//! assert!(v[0].is_unexpected_call());
//! ```
//!
//! ## Overloads
//!
//! Overloads of one operation are distinguished by their signatures,
//! including the receiver's qualifier.  A [`Dispatch`] selects the right
//! [`Method`] for a signature.
//! ```
//! # use statemock::*;
//! let mut ctrl = Controller::new();
//! let f = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32))
//!     .unwrap();
//! let fc = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32; const))
//!     .unwrap();
//! f.expect().return_const(1);
//! fc.expect().return_const(2);
//! let d = ctrl.dispatch("MockFoo::f").unwrap();
//! let m = d.method::<(i32,), i32>(&signature!(i32; const)).unwrap();
//! assert_eq!(2, m.call((0,)));
//! assert_eq!(1, f.call((0,)));
//! ```
//!
//! Declaring two overloads with the same signature is an
//! [`Error::AmbiguousOverload`].  See [`Interface`] for checking a whole
//! mocked type's declarations at once.
//!
//! ## Synchronization
//!
//! Every `Method` is `Send` and `Sync`, and never corrupts its queue when
//! called from several threads.  But by default, two calls that race may
//! interleave their selection and their state transitions.  A synchronized
//! mock serializes every call, expectation and transition on one reentrant
//! lock, so a result producer may still call back into the mock.
//! ```
//! # use statemock::*;
//! use std::thread;
//!
//! let mut ctrl = Controller::with_config(Config::new().synchronized(true));
//! let m = ctrl.method::<(u32,), u32>("MockPool::run", signature!(u32))
//!     .unwrap();
//! m.expect().times(4).returning(|(x,)| x * 2);
//! let handles = (0..4).map(|i| {
//!     let m = m.clone();
//!     thread::spawn(move || m.call((i,)))
//! }).collect::<Vec<_>>();
//! let mut r = handles.into_iter()
//!     .map(|h| h.join().unwrap())
//!     .collect::<Vec<_>>();
//! r.sort();
//! assert_eq!(vec![0, 2, 4, 6], r);
//! ctrl.assert_satisfied();
//! ```
#![cfg_attr(feature = "nightly", feature(specialization))]
#![cfg_attr(feature = "nightly", allow(incomplete_features))]

mod config;
mod controller;
mod error;
mod expectation;
mod interface;
mod method;
mod signature;
mod state;
mod violation;

pub use config::{Config, FailureMode};
pub use controller::Controller;
pub use error::{BoxError, Error};
pub use expectation::{Expectation, ExpectationGuard};
#[doc(hidden)]
pub use expectation::{DefaultReturner, ReturnDefault};
pub use interface::{
    Access,
    Dispatch,
    Interface,
    Operation,
    OverloadSet,
    RefQualifier
};
pub use method::{AnyMethod, Method};
pub use predicates::prelude::{Predicate, predicate};
pub use signature::{Qualifier, TypeSignature};
pub use state::{StateName, StateObject};
pub use violation::{Violation, report};
