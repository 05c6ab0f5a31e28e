// vim: tw=80
//! Call counts
use pretty_assertions::assert_eq;
use statemock::*;

fn method() -> Method<(), u32> {
    Method::new("MockFoo::foo", signature!())
}

#[test]
fn default_is_once() {
    let m = method();
    m.expect().return_const(1);
    assert_eq!(1, m.call(()));
    assert!(m.try_call(()).is_err());
}

#[test]
fn exactly_n() {
    let m = method();
    m.expect().times(3).return_const(1);
    for _ in 0..3 {
        assert_eq!(1, m.call(()));
    }
    assert!(m.verify().is_empty());
    assert!(m.try_call(()).is_err());
}

#[test]
fn too_few() {
    let m = method();
    m.expect().times(3).return_const(1);
    m.call(());
    let v = m.verify();
    assert_eq!(vec![Violation::UnsatisfiedExpectation {
        method: "MockFoo::foo".to_owned(),
        index: 0,
        expected: 3,
        actual: 1,
        precondition: None
    }], v);
}

#[test]
fn never() {
    let m = method();
    m.expect().never().return_const(1);
    assert!(m.try_call(()).is_err());
    assert!(m.verify().is_empty());
}

#[test]
fn times_any() {
    let m = method();
    m.expect().times_any().return_const(1);
    assert!(m.verify().is_empty());
    for _ in 0..100 {
        m.call(());
    }
    assert!(m.verify().is_empty());
    assert_eq!(100, m.consumed());
}

#[test]
fn times_any_shadows_later_expectations() {
    let m = method();
    m.expect().times_any().return_const(1);
    m.expect().return_const(2);
    for _ in 0..5 {
        assert_eq!(1, m.call(()));
    }
    assert_eq!(1, m.verify().len());
}

#[test]
fn verify_is_idempotent() {
    let mut ctrl = Controller::new();
    let m = ctrl.method::<(), u32>("MockFoo::foo", signature!()).unwrap();
    m.expect().times(2).return_const(1);
    m.expect().return_const(2);
    m.call(());
    let first = ctrl.verify_all();
    assert_eq!(2, first.len());
    assert_eq!(first, ctrl.verify_all());
    assert_eq!(first, ctrl.verify_all());
}

#[test]
#[should_panic(expected = "1 violation(s):\n  \
    MockFoo::foo: Expectation #0 called 0 time(s) which is fewer than \
    expected 1")]
fn assert_satisfied() {
    let mut ctrl = Controller::new();
    let m = ctrl.method::<(), u32>("MockFoo::foo", signature!()).unwrap();
    m.expect().return_const(1);
    ctrl.assert_satisfied();
}
