//! Member query protocol
//!
//! [`MemberKinds`] and [`BindingFlags`] form the request side of the
//! resolver contract; [`ResolvedNativeMember`] is the answer. The engine
//! passes a kind *filter* in and the host reports the actual discovered
//! kind back, so a single query distinguishes fields from properties from
//! methods from nested types.

use bitflags::bitflags;

use crate::reflector::NativeTypeId;
use crate::value::{Callable, ScriptValue};

bitflags! {
    /// Member categories, used both as a query filter and as the
    /// discovered-kind report.
    ///
    /// An empty set means "no match" on the report side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemberKinds: u32 {
        /// Instance or static field
        const FIELD = 4;
        /// Method
        const METHOD = 8;
        /// Property with accessors
        const PROPERTY = 16;
        /// Nested type declared inside the queried type
        const NESTED_TYPE = 128;
        /// Modifier on FIELD: static and immutable, resolved to a value
        const STATIC_CONST = 256;
        /// Modifier on PROPERTY: no getter
        const SETTER_ONLY = 512;
    }
}

bitflags! {
    /// Visibility and scope mask for a member query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingFlags: u32 {
        /// Only members declared directly on the queried type
        const DECLARED_ONLY = 2;
        /// Instance members
        const INSTANCE = 4;
        /// Static members
        const STATIC = 8;
        /// Public members
        const PUBLIC = 16;
        /// Non-public members
        const NON_PUBLIC = 32;
    }
}

impl MemberKinds {
    /// Default filter for a read access: anything gettable or callable
    pub fn default_lookup() -> Self {
        MemberKinds::METHOD | MemberKinds::FIELD | MemberKinds::PROPERTY
    }

    /// Filter for a write access: only settable members
    pub fn settable() -> Self {
        MemberKinds::FIELD | MemberKinds::PROPERTY
    }
}

/// The already-marshaled unit a resolver query hands back.
///
/// The shape follows the discovered kind: constants arrive as plain
/// values, fields and properties as a single accessor callable (zero
/// arguments reads, one argument writes), methods as a callable, nested
/// types as a type handle the engine maps to a script class.
#[derive(Debug, Clone)]
pub enum NativeUnit {
    /// Fixed value (static const field, or an enum constant name)
    Const(ScriptValue),
    /// Field or property accessor
    Accessor(Callable),
    /// Invokable method
    Method(Callable),
    /// Nested type handle
    NestedType(NativeTypeId),
}

/// A successful resolver answer: the discovered kind plus its unit.
#[derive(Debug, Clone)]
pub struct ResolvedNativeMember {
    /// Actual kind of the discovered member (never empty)
    pub kinds: MemberKinds,
    /// Marshaled payload, shaped per `kinds`
    pub unit: NativeUnit,
}

impl ResolvedNativeMember {
    /// Convenience constructor
    pub fn new(kinds: MemberKinds, unit: NativeUnit) -> Self {
        Self { kinds, unit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        // The numeric values are a wire protocol shared with hosts; they
        // must not drift.
        assert_eq!(MemberKinds::FIELD.bits(), 4);
        assert_eq!(MemberKinds::METHOD.bits(), 8);
        assert_eq!(MemberKinds::PROPERTY.bits(), 16);
        assert_eq!(MemberKinds::NESTED_TYPE.bits(), 128);
        assert_eq!(MemberKinds::STATIC_CONST.bits(), 256);
        assert_eq!(MemberKinds::SETTER_ONLY.bits(), 512);

        assert_eq!(BindingFlags::DECLARED_ONLY.bits(), 2);
        assert_eq!(BindingFlags::INSTANCE.bits(), 4);
        assert_eq!(BindingFlags::STATIC.bits(), 8);
        assert_eq!(BindingFlags::PUBLIC.bits(), 16);
        assert_eq!(BindingFlags::NON_PUBLIC.bits(), 32);
    }

    #[test]
    fn test_default_lookup_filter() {
        let filter = MemberKinds::default_lookup();
        assert!(filter.contains(MemberKinds::METHOD));
        assert!(filter.contains(MemberKinds::FIELD));
        assert!(filter.contains(MemberKinds::PROPERTY));
        assert!(!filter.contains(MemberKinds::NESTED_TYPE));
    }

    #[test]
    fn test_settable_filter() {
        let filter = MemberKinds::settable();
        assert!(filter.contains(MemberKinds::FIELD));
        assert!(filter.contains(MemberKinds::PROPERTY));
        assert!(!filter.contains(MemberKinds::METHOD));
    }
}
