//! The reflector seam between the engine and the host type system

use crate::error::NativeResult;
use crate::member::{BindingFlags, MemberKinds, ResolvedNativeMember};
use crate::value::Callable;

/// Opaque handle into the host's type system.
///
/// The engine never interprets the payload; it only passes handles back
/// to the reflector that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTypeId(pub u64);

/// The reflection surface the engine consumes.
///
/// Hosts implement this once per type system. All methods are queries of
/// a single type at a single level; the engine owns hierarchy walking,
/// caching, and fallback ordering.
///
/// Implementations may retain callback state for marshaled members (the
/// original host keeps per-environment callback lists); the engine asks
/// for it to be discarded on eviction via
/// [`discard_callback_state`](NativeReflector::discard_callback_state).
pub trait NativeReflector {
    /// Resolve one member declared at this level of `ty`.
    ///
    /// `kinds` filters which member categories to consider; the answer
    /// reports the actual discovered kind. `Ok(None)` means no such
    /// member at this level (a miss, not an error).
    fn resolve(
        &self,
        ty: NativeTypeId,
        name: &str,
        kinds: MemberKinds,
        flags: BindingFlags,
    ) -> NativeResult<Option<ResolvedNativeMember>>;

    /// Base type of `ty`, or `None` past the root
    fn base_type(&self, ty: NativeTypeId) -> Option<NativeTypeId>;

    /// True for the universal root object type (the walk's stopping point)
    fn is_root(&self, ty: NativeTypeId) -> bool;

    /// True when `ty` is an enumeration
    fn is_enum(&self, ty: NativeTypeId) -> bool;

    /// Symbolic name for an enum ordinal, or `None` if out of range
    fn enum_name(&self, ty: NativeTypeId, ordinal: i64) -> Option<String>;

    /// Instantiate a generic method with concrete type arguments and
    /// return the marshaled callable.
    fn instantiate_generic_method(
        &self,
        ty: NativeTypeId,
        method: &str,
        type_args: &[NativeTypeId],
    ) -> NativeResult<Callable>;

    /// True when `ty` is an open generic definition
    fn is_generic_definition(&self, ty: NativeTypeId) -> bool;

    /// True when `ty` is a constructed generic instantiation
    fn is_generic_instance(&self, ty: NativeTypeId) -> bool;

    /// Type arguments of a constructed generic type (empty otherwise)
    fn generic_arguments(&self, ty: NativeTypeId) -> Vec<NativeTypeId>;

    /// Construct a generic type from an open definition and arguments
    fn instantiate_generic_type(
        &self,
        definition: NativeTypeId,
        args: &[NativeTypeId],
    ) -> NativeResult<NativeTypeId>;

    /// Names of properties declared directly on `ty` matching `flags`.
    ///
    /// Used only by the privately-declared interface accessor fallback,
    /// which must scan for dotted accessor names.
    fn declared_property_names(&self, ty: NativeTypeId, flags: BindingFlags) -> Vec<String>;

    /// Display name of `ty`
    fn type_name(&self, ty: NativeTypeId) -> String;

    /// The type hosting the bootstrap member required by the generic-call
    /// path, if the host supports generic dispatch at all.
    fn generic_dispatch_type(&self) -> Option<NativeTypeId> {
        None
    }

    /// Drop any callback state retained for marshaled members.
    ///
    /// Called by the engine's eviction pass; a fresh resolution after
    /// eviction re-creates whatever is needed.
    fn discard_callback_state(&self) {}
}
