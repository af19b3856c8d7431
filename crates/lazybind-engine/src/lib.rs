//! Lazybind engine: on-demand member binding over a native type system
//!
//! Exposing a large native type surface to a scripting environment by
//! eager registration is expensive; this engine instead intercepts the
//! first access to any member, resolves it against the host's reflection
//! system, installs a reusable binding, and serves every later access
//! directly from the installed slot.
//!
//! The moving parts:
//! - interception hooks: [`Binder::get_member`] / [`Binder::set_member`]
//!   and the static/call variants
//! - the hierarchy walker with its tri-state per-level outcome
//!   ([`Resolution`]) and fallback paths (extension methods, enum
//!   constants, nested types, private interface accessors)
//! - the binding installer, shaping slots by member kind
//! - the caching layer: per-class negative cache, generic-call cache,
//!   and the touched-class set driving [`Binder::clear`] /
//!   [`Binder::dump`]
//!
//! All state is per-[`Binder`]: hosts running several scripting engines
//! create one binder each, and nothing is shared between them.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod binder;
mod class;
mod config;
mod evict;
mod generic;
mod install;
mod resolve;

pub use binder::{Binder, GENERIC_DISPATCH_MEMBER};
pub use class::{
    ClassId, ClassRegistry, ScriptClass, ScriptObject, Slot, SlotKind, CONSTRUCTOR_SLOT,
};
pub use config::{BinderConfig, LogLevel};
pub use resolve::Resolution;

// Re-export SDK types (canonical definitions live in lazybind-sdk)
pub use lazybind_sdk::{
    BindingFlags, Callable, MemberKinds, NativeError, NativeReflector, NativeResult, NativeTypeId,
    NativeUnit, ResolvedNativeMember, ScriptValue,
};
