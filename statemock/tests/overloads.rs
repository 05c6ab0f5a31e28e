// vim: tw=80
//! Overloaded operations
use std::collections::HashSet;

use pretty_assertions::assert_eq;
use statemock::*;

#[test]
fn qualifiers_are_distinct() {
    let sigs: HashSet<_> = [
        signature!(i32),
        signature!(i32; const),
        signature!(i32; volatile),
        signature!(i32; const volatile),
    ].into_iter().collect();
    assert_eq!(4, sigs.len());
}

#[test]
fn whitespace_is_ignored() {
    let a = TypeSignature::new(&["std::vector<int>"], Qualifier::None);
    let b = TypeSignature::new(&["std :: vector < int >"], Qualifier::None);
    assert_eq!(a, b);
}

#[test]
fn qualifier_overloads() {
    let mut ctrl = Controller::new();
    let f = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32))
        .unwrap();
    let fc = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32; const))
        .unwrap();
    f.expect().return_const(1);
    fc.expect().return_const(2);
    assert_eq!(2, fc.call((0,)));
    assert_eq!(1, f.call((0,)));
    ctrl.assert_satisfied();
}

#[test]
fn duplicate_registration() {
    let mut ctrl = Controller::new();
    ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32)).unwrap();
    let e = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32))
        .unwrap_err();
    assert!(matches!(e, Error::AmbiguousOverload{..}));
    assert_eq!(1, ctrl.methods().count());
}

#[test]
fn dispatch_table() {
    let mut ctrl = Controller::new();
    let f = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32))
        .unwrap();
    let fc = ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32; const))
        .unwrap();
    let fv = ctrl.method::<(i32,), i32>("MockFoo::f",
                                        signature!(i32; volatile))
        .unwrap();
    f.expect().return_const(1);
    fc.expect().return_const(2);
    fv.expect().return_const(3);
    let d = ctrl.dispatch("MockFoo::f").unwrap();
    assert!(d.is_overloaded());
    assert_eq!(3, d.len());
    assert_eq!(3, d.method::<(i32,), i32>(&signature!(i32; volatile))
               .unwrap()
               .call((0,)));
    assert_eq!(2, d.method::<(i32,), i32>(&signature!(i32; const))
               .unwrap()
               .call((0,)));
    assert_eq!(1, d.method::<(i32,), i32>(&signature!(i32))
               .unwrap()
               .call((0,)));
    assert!(d.resolve(&signature!(i32; const volatile)).is_none());
}

#[test]
fn dispatch_single() {
    let mut ctrl = Controller::new();
    ctrl.method::<(), ()>("MockFoo::g", signature!()).unwrap();
    let d = ctrl.dispatch("MockFoo::g").unwrap();
    assert!(!d.is_overloaded());
    // No lookup is needed for a single overload
    assert_eq!("MockFoo::g", d.resolve(&signature!(u8)).unwrap().name());
    assert!(ctrl.dispatch("MockFoo::h").is_none());
}

#[test]
fn dispatch_wrong_types() {
    let mut ctrl = Controller::new();
    ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32)).unwrap();
    let d = ctrl.dispatch("MockFoo::f").unwrap();
    assert!(d.method::<(i32,), u8>(&signature!(i32)).is_none());
}

#[test]
fn dispatch_duplicate() {
    let a: std::sync::Arc<dyn AnyMethod> =
        std::sync::Arc::new(Method::<(), ()>::new("f", signature!()));
    let b: std::sync::Arc<dyn AnyMethod> =
        std::sync::Arc::new(Method::<(), ()>::new("f", signature!()));
    let e = Dispatch::new(vec![a, b]).unwrap_err();
    assert!(matches!(e, Error::AmbiguousOverload{..}));
}

#[test]
fn typed_lookup() {
    let mut ctrl = Controller::new();
    ctrl.method::<(i32,), i32>("MockFoo::f", signature!(i32)).unwrap();
    assert!(ctrl.get::<(i32,), i32>("MockFoo::f", &signature!(i32)).is_some());
    assert!(ctrl.get::<(i32,), i32>("MockFoo::f", &signature!(i32; const))
            .is_none());
    assert!(ctrl.get::<(u32,), i32>("MockFoo::f", &signature!(i32)).is_none());
}
