// vim: tw=80
//! Keys that tell overloads of one operation apart.
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Access qualifier of a mocked operation.
///
/// An operation that only differs from another by its qualifier is still a
/// distinct overload.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Qualifier {
    #[default]
    None,
    ReadOnly,
    Volatile,
    ReadOnlyVolatile,
}

impl Qualifier {
    /// Combine the two independent flags into a `Qualifier`
    pub const fn from_flags(read_only: bool, volatile: bool) -> Self {
        match (read_only, volatile) {
            (false, false) => Qualifier::None,
            (true, false) => Qualifier::ReadOnly,
            (false, true) => Qualifier::Volatile,
            (true, true) => Qualifier::ReadOnlyVolatile,
        }
    }

    pub const fn is_read_only(self) -> bool {
        matches!(self, Qualifier::ReadOnly | Qualifier::ReadOnlyVolatile)
    }

    pub const fn is_volatile(self) -> bool {
        matches!(self, Qualifier::Volatile | Qualifier::ReadOnlyVolatile)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::None => Ok(()),
            Qualifier::ReadOnly => f.write_str(" const"),
            Qualifier::Volatile => f.write_str(" volatile"),
            Qualifier::ReadOnlyVolatile => f.write_str(" const volatile"),
        }
    }
}

/// The parameter types and qualifier of one operation.
///
/// Type identifiers are spellings.  Comparison and hashing ignore whitespace,
/// so `Vec<u8>` and `Vec < u8 >` name the same type.  Nothing else about the
/// spelling is normalized.
///
/// A `TypeSignature` is meant to be built once, when the mock is defined,
/// usually as a `const`:
/// ```
/// # use statemock::*;
/// const GET: TypeSignature = TypeSignature::new(&["u32"], Qualifier::ReadOnly);
/// assert_eq!(GET, signature!(u32; const));
/// ```
#[derive(Clone, Copy)]
pub struct TypeSignature {
    params: &'static [&'static str],
    qualifier: Qualifier,
}

impl TypeSignature {
    pub const fn new(params: &'static [&'static str], qualifier: Qualifier)
        -> Self
    {
        TypeSignature { params, qualifier }
    }

    /// Signature of an operation without parameters or qualifiers
    pub const fn unit() -> Self {
        TypeSignature::new(&[], Qualifier::None)
    }

    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// Does `other` differ from `self` only by its qualifier?
    pub fn same_params(&self, other: &TypeSignature) -> bool {
        self.params.len() == other.params.len() &&
            self.params.iter()
                .zip(other.params.iter())
                .all(|(a, b)| spelling_eq(a, b))
    }
}

fn spelling(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().filter(|c| !c.is_whitespace())
}

fn spelling_eq(a: &str, b: &str) -> bool {
    spelling(a).eq(spelling(b))
}

impl PartialEq for TypeSignature {
    fn eq(&self, other: &Self) -> bool {
        self.qualifier == other.qualifier && self.same_params(other)
    }
}

impl Eq for TypeSignature {}

impl Hash for TypeSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualifier.hash(state);
        self.params.len().hash(state);
        for p in self.params {
            for c in spelling(p) {
                c.hash(state);
            }
            // Separator, so ["ab", "c"] and ["a", "bc"] don't always collide
            0xffu8.hash(state);
        }
    }
}

impl fmt::Debug for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeSignature({})", self)
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.params.join(", "), self.qualifier)
    }
}

/// Build a [`TypeSignature`](struct.TypeSignature.html) from a list of types.
///
/// Qualifiers follow a `;`.  The result is usable in `const` context.
///
/// # Examples
/// ```
/// # use statemock::*;
/// const F: TypeSignature = signature!(f32, String);
/// const F_CONST: TypeSignature = signature!(f32, String; const);
/// assert_ne!(F, F_CONST);
/// assert_eq!(signature!(), TypeSignature::unit());
/// assert_eq!(signature!(; const volatile).qualifier(),
///            Qualifier::ReadOnlyVolatile);
/// ```
#[macro_export]
macro_rules! signature {
    ($($t:ty),* $(,)?) => {
        $crate::TypeSignature::new(&[$(stringify!($t)),*],
            $crate::Qualifier::None)
    };
    ($($t:ty),* ; const) => {
        $crate::TypeSignature::new(&[$(stringify!($t)),*],
            $crate::Qualifier::ReadOnly)
    };
    ($($t:ty),* ; volatile) => {
        $crate::TypeSignature::new(&[$(stringify!($t)),*],
            $crate::Qualifier::Volatile)
    };
    ($($t:ty),* ; const volatile) => {
        $crate::TypeSignature::new(&[$(stringify!($t)),*],
            $crate::Qualifier::ReadOnlyVolatile)
    };
}

#[cfg(test)]
mod t {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(s: &TypeSignature) -> u64 {
        let mut h = DefaultHasher::new();
        s.hash(&mut h);
        h.finish()
    }

    #[test]
    fn whitespace_is_insignificant() {
        let a = TypeSignature::new(&["Vec<u8>", "i32"], Qualifier::None);
        let b = TypeSignature::new(&["Vec < u8 >", "i32"], Qualifier::None);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn qualifier_distinguishes() {
        let a = TypeSignature::new(&["i32"], Qualifier::None);
        let b = TypeSignature::new(&["i32"], Qualifier::Volatile);
        assert_ne!(a, b);
        assert!(a.same_params(&b));
    }

    #[test]
    fn order_matters() {
        let a = TypeSignature::new(&["i32", "u8"], Qualifier::None);
        let b = TypeSignature::new(&["u8", "i32"], Qualifier::None);
        assert_ne!(a, b);
        assert!(!a.same_params(&b));
    }

    #[test]
    fn display() {
        let s = TypeSignature::new(&["f32", "String"],
                                   Qualifier::ReadOnlyVolatile);
        assert_eq!("(f32, String) const volatile", s.to_string());
    }

    #[test]
    fn flags() {
        assert_eq!(Qualifier::ReadOnlyVolatile,
                   Qualifier::from_flags(true, true));
        assert!(Qualifier::ReadOnlyVolatile.is_volatile());
        assert!(!Qualifier::Volatile.is_read_only());
    }
}
