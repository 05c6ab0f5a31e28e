// vim: tw=80
//! The declarations a mock is defined from, and the tables that dispatch an
//! intercepted call to the right overload.
//!
//! A mock generator emits one [`Interface`] per mocked type.  Grouping its
//! operations into [`OverloadSet`]s is where ambiguous overloads are rejected:
//! once, when the mock is defined, never per call.
use std::{collections::HashMap, fmt, sync::Arc};

use crate::{AnyMethod, Error, Method, TypeSignature};

/// Access level of a declared operation
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

/// Reference category of an operation's receiver.
///
/// This is not part of a [`TypeSignature`], so two operations that differ
/// only by it are ambiguous.  It is kept to explain such errors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RefQualifier {
    LValue,
    RValue,
}

/// One declared operation of a mocked type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    name: String,
    signature: TypeSignature,
    is_abstract: bool,
    access: Access,
    ref_qualifier: Option<RefQualifier>,
}

impl Operation {
    /// A public, overridable operation
    pub fn new(name: impl Into<String>, signature: TypeSignature) -> Self {
        Operation {
            name: name.into(),
            signature,
            is_abstract: false,
            access: Access::Public,
            ref_qualifier: None,
        }
    }

    /// Mark the operation as one that must be overridden.
    pub fn set_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn ref_qualifier(mut self, q: RefQualifier) -> Self {
        self.ref_qualifier = Some(q);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> TypeSignature {
        self.signature
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn get_access(&self) -> Access {
        self.access
    }

    pub fn get_ref_qualifier(&self) -> Option<RefQualifier> {
        self.ref_qualifier
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)?;
        match self.ref_qualifier {
            Some(RefQualifier::LValue) => f.write_str(" &"),
            Some(RefQualifier::RValue) => f.write_str(" &&"),
            None => Ok(())
        }
    }
}

/// The declaration of a mocked type: its name and its operations.
///
/// # Examples
/// ```
/// # use statemock::*;
/// let iface = Interface::new("Derived")
///     .operation(Operation::new("virtual_method", signature!(f32, String)))
///     .operation(Operation::new("pure_virtual_method",
///                               signature!(f64, Vec<u32>; const))
///                .set_abstract(true)
///                .access(Access::Protected));
/// assert_eq!(1, iface.overload_sets(&[Access::Public]).unwrap().len());
/// assert_eq!(2, iface.overload_sets(&[Access::Public, Access::Protected])
///     .unwrap()
///     .len());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Interface {
    name: String,
    operations: Vec<Operation>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Interface { name: name.into(), operations: Vec::new() }
    }

    /// Append an operation
    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn abstract_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_abstract())
    }

    /// Group the operations with one of the given access levels by name.
    ///
    /// Sets are returned in order of first declaration.  An empty `access`
    /// means public operations only.  Fails if any set contains ambiguous
    /// overloads.
    pub fn overload_sets(&self, access: &[Access])
        -> Result<Vec<OverloadSet>, Error>
    {
        let access = if access.is_empty() { &[Access::Public][..] } else { access };
        let mut sets: Vec<(String, Vec<Operation>)> = Vec::new();
        for op in self.operations.iter()
            .filter(|op| access.contains(&op.access))
        {
            match sets.iter_mut().find(|(name, _)| *name == op.name) {
                Some((_, ops)) => ops.push(op.clone()),
                None => sets.push((op.name.clone(), vec![op.clone()]))
            }
        }
        sets.into_iter()
            .map(|(name, ops)| OverloadSet::new(name, ops))
            .collect()
    }
}

/// All declared overloads of one operation name.
///
/// Constructing an `OverloadSet` proves that the overloads' signatures are
/// pairwise distinct.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OverloadSet {
    name: String,
    operations: Vec<Operation>,
}

impl OverloadSet {
    pub fn new(name: impl Into<String>, operations: Vec<Operation>)
        -> Result<Self, Error>
    {
        let name = name.into();
        for (i, a) in operations.iter().enumerate() {
            if a.name != name {
                return Err(Error::AmbiguousOverload {
                    method: name,
                    signature: a.signature,
                    reason: format!("{} does not belong to this overload set",
                                    a)
                });
            }
            if let Some(b) = operations[..i].iter()
                .find(|b| b.signature == a.signature)
            {
                let reason = if a.ref_qualifier != b.ref_qualifier {
                    format!("{} and {} differ only by reference qualifier, \
                            which does not distinguish overloads", b, a)
                } else {
                    "declared more than once".to_owned()
                };
                tracing::warn!(method = %name, signature = %a.signature,
                               "{}", reason);
                return Err(Error::AmbiguousOverload {
                    method: name,
                    signature: a.signature,
                    reason
                });
            }
        }
        Ok(OverloadSet { name, operations })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn signatures(&self) -> impl Iterator<Item = TypeSignature> + '_ {
        self.operations.iter().map(Operation::signature)
    }

    /// Does the set hold more than one operation?
    pub fn is_overloaded(&self) -> bool {
        self.operations.len() > 1
    }

    /// Do all overloads take the same parameter types, differing only by
    /// qualifier?
    pub fn same_params(&self) -> bool {
        match self.operations.first() {
            Some(first) => self.operations.iter()
                .all(|op| op.signature.same_params(&first.signature)),
            None => true
        }
    }

    /// Do all overloads have the same qualifier?
    pub fn same_qualifiers(&self) -> bool {
        match self.operations.first() {
            Some(first) => self.operations.iter()
                .all(|op| op.signature.qualifier() ==
                     first.signature.qualifier()),
            None => true
        }
    }
}

/// Selects the [`Method`] bound to one overload of an operation.
///
/// A non-overloaded operation needs no lookup at all.
pub enum Dispatch {
    Single(Arc<dyn AnyMethod>),
    Table(HashMap<TypeSignature, Arc<dyn AnyMethod>>),
}

impl Dispatch {
    /// Build the table for a set of methods sharing one name.
    ///
    /// Fails if the list is empty, if the names differ, or if two methods
    /// have the same signature.
    pub fn new(mut methods: Vec<Arc<dyn AnyMethod>>) -> Result<Self, Error> {
        if methods.len() == 1 {
            return Ok(Dispatch::Single(methods.remove(0)));
        }
        let Some(first) = methods.first() else {
            return Err(Error::AmbiguousOverload {
                method: String::new(),
                signature: TypeSignature::unit(),
                reason: "no methods to dispatch to".to_owned()
            });
        };
        let name = first.name().to_owned();
        let mut table = HashMap::with_capacity(methods.len());
        for m in methods {
            let reason = if m.name() != name {
                Some(format!("{} does not belong to this overload set",
                             m.name()))
            } else if table.contains_key(&m.signature()) {
                Some("declared more than once".to_owned())
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(Error::AmbiguousOverload {
                    method: name,
                    signature: m.signature(),
                    reason
                });
            }
            table.insert(m.signature(), m);
        }
        Ok(Dispatch::Table(table))
    }

    /// Select the overload for `signature`.
    ///
    /// A `Single` dispatch returns its only method without comparing
    /// signatures.
    pub fn resolve(&self, signature: &TypeSignature) -> Option<&dyn AnyMethod> {
        match self {
            Dispatch::Single(m) => Some(&**m),
            Dispatch::Table(t) => t.get(signature).map(|m| &**m)
        }
    }

    /// Like [`resolve`](#method.resolve), but also recover the method's
    /// argument and return types.
    pub fn method<I, O>(&self, signature: &TypeSignature)
        -> Option<&Method<I, O>>
        where I: 'static, O: 'static
    {
        self.resolve(signature)?
            .downcast_ref::<Method<I, O>>()
            .ok()
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self, Dispatch::Table(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Dispatch::Single(_) => 1,
            Dispatch::Table(t) => t.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Single(m) => f.debug_tuple("Single")
                .field(&format_args!("{}{}", m.name(), m.signature()))
                .finish(),
            Dispatch::Table(t) => f.debug_set()
                .entries(t.keys())
                .finish()
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{Qualifier, signature};

    #[test]
    fn overload_sets_keep_declaration_order() {
        let iface = Interface::new("Foo")
            .operation(Operation::new("b", signature!(i32)))
            .operation(Operation::new("a", signature!()))
            .operation(Operation::new("b", signature!(u8)));
        let sets = iface.overload_sets(&[]).unwrap();
        let names: Vec<_> = sets.iter().map(OverloadSet::name).collect();
        assert_eq!(vec!["b", "a"], names);
        assert!(sets[0].is_overloaded());
        assert!(!sets[0].same_params());
        assert!(sets[0].same_qualifiers());
    }

    #[test]
    fn private_operations_are_skipped() {
        let iface = Interface::new("Foo")
            .operation(Operation::new("a", signature!())
                       .access(Access::Private));
        assert!(iface.overload_sets(&[]).unwrap().is_empty());
        assert_eq!(1, iface.overload_sets(&[Access::Private]).unwrap().len());
    }

    #[test]
    fn qualifier_only_overloads() {
        let set = OverloadSet::new("f", vec![
            Operation::new("f", signature!(i32)),
            Operation::new("f", signature!(i32; const)),
            Operation::new("f", signature!(i32; volatile)),
            Operation::new("f", signature!(i32; const volatile)),
        ]).unwrap();
        assert!(set.same_params());
        assert!(!set.same_qualifiers());
        let q: Vec<_> = set.signatures().map(|s| s.qualifier()).collect();
        assert_eq!(vec![Qualifier::None, Qualifier::ReadOnly,
                        Qualifier::Volatile, Qualifier::ReadOnlyVolatile], q);
    }

    #[test]
    fn ref_qualifier_collision() {
        let e = OverloadSet::new("f", vec![
            Operation::new("f", signature!(i32))
                .ref_qualifier(RefQualifier::LValue),
            Operation::new("f", signature!(i32))
                .ref_qualifier(RefQualifier::RValue),
        ]).unwrap_err();
        assert_eq!(
            "ambiguous overload f(i32): f(i32) & and f(i32) && differ only \
             by reference qualifier, which does not distinguish overloads",
            e.to_string());
    }

    #[test]
    fn foreign_operation() {
        let e = OverloadSet::new("f", vec![Operation::new("g", signature!())])
            .unwrap_err();
        assert!(matches!(e, Error::AmbiguousOverload{..}));
    }

    #[test]
    fn empty_dispatch() {
        assert!(Dispatch::new(Vec::new()).is_err());
    }
}
