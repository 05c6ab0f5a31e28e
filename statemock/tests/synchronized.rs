// vim: tw=80
//! Calling mocks from several threads
use std::thread;

use pretty_assertions::assert_eq;
use statemock::*;

const THREADS: u32 = 8;
const CALLS: u32 = 100;

/// Selection, production and transition happen as one step, so a toggle
/// never finds itself in a state that neither expectation accepts.
#[test]
fn atomic_transitions() {
    let mut ctrl = Controller::with_config(Config::new().synchronized(true));
    let toggle = ctrl.method::<(), u32>("MockSwitch::toggle", signature!())
        .unwrap();
    toggle.expect().times_any().transition("off", "on").return_const(1);
    toggle.expect().times_any().transition("on", "off").return_const(0);
    ctrl.transition("off");
    let handles = (0..THREADS).map(|_| {
        let toggle = toggle.clone();
        thread::spawn(move || {
            (0..CALLS).map(|_| toggle.call(())).sum::<u32>()
        })
    }).collect::<Vec<_>>();
    let ons: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(THREADS * CALLS / 2, ons);
    assert_eq!(ctrl.current(), "off");
    ctrl.assert_satisfied();
}

/// Even unsynchronized mocks count every call exactly once.
#[test]
fn unsynchronized_counts() {
    let mut ctrl = Controller::new();
    let m = ctrl.method::<(u32,), u32>("MockPool::run", signature!(u32))
        .unwrap();
    m.expect().times((THREADS * CALLS) as usize).returning(|(x,)| x);
    let handles = (0..THREADS).map(|t| {
        let m = m.clone();
        thread::spawn(move || {
            for i in 0..CALLS {
                assert_eq!(t * i, m.call((t * i,)));
            }
        })
    }).collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!((THREADS * CALLS) as usize, m.consumed());
    ctrl.assert_satisfied();
}

/// A producer may call back into its own mock.
#[test]
fn reentrant_producer() {
    for synchronized in [false, true] {
        let mut ctrl = Controller::with_config(Config::new()
            .synchronized(synchronized));
        let inner = ctrl.method::<(), u32>("MockFoo::inner", signature!())
            .unwrap();
        let outer = ctrl.method::<(), u32>("MockFoo::outer", signature!())
            .unwrap();
        inner.expect().postcondition("inner").return_const(41);
        let inner2 = inner.clone();
        outer.expect().returning(move |_| inner2.call(()) + 1);
        assert_eq!(42, outer.call(()));
        assert_eq!(ctrl.current(), "inner");
        ctrl.assert_satisfied();
    }
}

/// Parts of a composed mock serialize on the outermost lock.
#[test]
fn outermost_gate() {
    let parent = Controller::with_config(Config::new().synchronized(true));
    let mut child = Controller::new();
    assert!(!child.state().is_synchronized());
    child.share_state_with(&parent).unwrap();
    assert!(child.state().is_synchronized());
    let m = child.method::<(), ()>("MockChild::foo", signature!()).unwrap();
    m.expect().times(THREADS as usize).return_const(());
    let handles = (0..THREADS).map(|_| {
        let m = m.clone();
        thread::spawn(move || m.call(()))
    }).collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }
    child.assert_satisfied();
}
