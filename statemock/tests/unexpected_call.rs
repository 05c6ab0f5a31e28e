// vim: tw=80
//! Calls that no expectation matches
use pretty_assertions::assert_eq;
use statemock::*;

#[test]
#[should_panic(expected =
    "MockFoo::foo(5,): No matching expectation found in state <unconstrained>")]
fn empty_queue() {
    let m = Method::<(u32,), u32>::new("MockFoo::foo", signature!(u32));
    m.call((5,));
}

#[test]
fn empty_queue_try_call() {
    let m = Method::<(u32,), u32>::new("MockFoo::foo", signature!(u32));
    match m.try_call((5,)) {
        Err(Error::UnexpectedCall{method, args, state, candidates}) => {
            assert_eq!("MockFoo::foo", method);
            assert_eq!("(5,)", args);
            assert!(state.is_unconstrained());
            assert!(candidates.is_empty());
        },
        r => panic!("Unexpected result {:?}", r)
    }
}

#[test]
fn unexpected_call_consumes_nothing() {
    let m = Method::<(u32,), u32>::new("MockFoo::foo", signature!(u32));
    m.expect().with(predicate::eq((1,))).return_const(1);
    m.try_call((2,)).unwrap_err();
    assert_eq!(0, m.consumed());
    assert_eq!(1, m.call((1,)));
}

#[test]
#[should_panic(expected = "#0: requires state open")]
fn lists_candidates() {
    let m = Method::<(), u32>::new("MockFile::read", signature!());
    m.expect().precondition("open").return_const(0);
    m.call(());
}

#[test]
#[should_panic(expected = "MockFoo::foo(..): No matching expectation")]
fn opaque_arguments() {
    struct NotDebug(u32);
    let m = Method::<(NotDebug,), u32>::opaque("MockFoo::foo",
                                                signature!(NotDebug));
    m.call((NotDebug(1),));
}

#[test]
fn fatal_mode_records_nothing() {
    let m = Method::<(), ()>::new("MockFoo::foo", signature!());
    m.try_call(()).unwrap_err();
    assert!(m.verify().is_empty());
}
