//! Lazybind SDK - Contracts between a native host and the binding engine
//!
//! This crate holds the minimal types a host needs to plug its reflection
//! system into the lazybind engine without depending on the engine itself:
//!
//! - [`NativeTypeId`] — opaque handle into the host's type system
//! - [`MemberKinds`] / [`BindingFlags`] — the member query protocol
//! - [`NativeReflector`] — the single resolver seam the engine consumes
//! - [`ResolvedNativeMember`] — what a successful query hands back
//!
//! The engine never walks a type's full member list through this interface.
//! It asks for exactly one member at a time, driven by script access, and
//! the host answers with an already-marshaled unit (a constant value, an
//! accessor callable, a method callable, or a nested type handle).

#![warn(missing_docs)]

mod error;
mod member;
mod reflector;
mod value;

pub use error::{NativeError, NativeResult};
pub use member::{BindingFlags, MemberKinds, NativeUnit, ResolvedNativeMember};
pub use reflector::{NativeReflector, NativeTypeId};
pub use value::{Callable, ScriptValue};
