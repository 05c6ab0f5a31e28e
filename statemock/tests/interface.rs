// vim: tw=80
//! Declarations of mocked types
use pretty_assertions::assert_eq;
use statemock::*;

fn derived() -> Interface {
    Interface::new("Derived")
        .operation(Operation::new("virtual_method", signature!(f32, String)))
        .operation(Operation::new("pure_virtual_method",
                                  signature!(f64, Vec<u32>; const))
                   .set_abstract(true)
                   .access(Access::Protected))
        .operation(Operation::new("reset", signature!()).set_abstract(true))
        .operation(Operation::new("virtual_method", signature!(f32, String;
                                                              const)))
}

#[test]
fn overload_sets() {
    let iface = derived();
    let sets = iface.overload_sets(&[Access::Public, Access::Protected])
        .unwrap();
    let names = sets.iter().map(OverloadSet::name).collect::<Vec<_>>();
    assert_eq!(vec!["virtual_method", "pure_virtual_method", "reset"], names);
    assert!(sets[0].is_overloaded());
    assert!(sets[0].same_params());
    assert!(!sets[0].same_qualifiers());
    assert!(!sets[1].is_overloaded());
}

#[test]
fn public_by_default() {
    let sets = derived().overload_sets(&[]).unwrap();
    assert_eq!(2, sets.len());
}

#[test]
#[should_panic(expected = "differ only by reference qualifier")]
fn ref_qualified_overloads() {
    Interface::new("Foo")
        .operation(Operation::new("get", signature!(; const))
                   .ref_qualifier(RefQualifier::LValue))
        .operation(Operation::new("get", signature!(; const))
                   .ref_qualifier(RefQualifier::RValue))
        .overload_sets(&[])
        .unwrap();
}

#[test]
fn unbound_abstract_operations() {
    let iface = derived();
    let mut ctrl = Controller::new();
    ctrl.method::<(f64, Vec<u32>), ()>("MockDerived::pure_virtual_method",
                                       signature!(f64, Vec<u32>; const))
        .unwrap();
    let unbound = ctrl.unbound(&iface)
        .into_iter()
        .map(Operation::name)
        .collect::<Vec<_>>();
    assert_eq!(vec!["reset"], unbound);

    ctrl.method::<(), ()>("MockDerived::reset", signature!()).unwrap();
    assert!(ctrl.unbound(&iface).is_empty());
}

#[test]
fn operation_display() {
    let op = Operation::new("get", signature!(u32; const))
        .ref_qualifier(RefQualifier::RValue);
    assert_eq!("get(u32) const &&", op.to_string());
}
