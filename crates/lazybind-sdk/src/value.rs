//! Script-side value and callable handles
//!
//! These are the units the engine moves between the host and the script
//! surface. Actual data conversion lives in the host's marshaling layer;
//! the engine only installs, stores, and invokes these handles.

use std::fmt;
use std::rc::Rc;

use crate::error::NativeResult;
use crate::reflector::NativeTypeId;

/// A marshaled script-side value.
///
/// Small and clone-able. Heap-backed hosts hand out [`ScriptValue::Handle`]
/// tokens and keep the real object on their side.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    /// Absent / null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    Str(String),
    /// A native type used as a class token (e.g. a generic type argument)
    Type(NativeTypeId),
    /// Opaque handle to a host-owned object
    Handle(u64),
    /// A callable member read off a script surface
    Function(Callable),
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScriptValue::Null, ScriptValue::Null) => true,
            (ScriptValue::Bool(a), ScriptValue::Bool(b)) => a == b,
            (ScriptValue::Int(a), ScriptValue::Int(b)) => a == b,
            (ScriptValue::Float(a), ScriptValue::Float(b)) => a == b,
            (ScriptValue::Str(a), ScriptValue::Str(b)) => a == b,
            (ScriptValue::Type(a), ScriptValue::Type(b)) => a == b,
            (ScriptValue::Handle(a), ScriptValue::Handle(b)) => a == b,
            (ScriptValue::Function(a), ScriptValue::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl ScriptValue {
    /// True for [`ScriptValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, ScriptValue::Null)
    }

    /// The native type token carried by a [`ScriptValue::Type`], if any
    pub fn as_type(&self) -> Option<NativeTypeId> {
        match self {
            ScriptValue::Type(ty) => Some(*ty),
            _ => None,
        }
    }

    /// The callable carried by a [`ScriptValue::Function`], if any
    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            ScriptValue::Function(c) => Some(c),
            _ => None,
        }
    }
}

/// Host-provided function object.
///
/// One callable serves every call shape the engine needs: methods are
/// invoked with a receiver and arguments, field/property accessors are
/// invoked with zero arguments (get) or one argument (set), exactly as
/// the host's marshaling layer wires them.
#[derive(Clone)]
pub struct Callable {
    f: Rc<dyn Fn(Option<&ScriptValue>, &[ScriptValue]) -> NativeResult<ScriptValue>>,
}

impl Callable {
    /// Wrap a host closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&ScriptValue>, &[ScriptValue]) -> NativeResult<ScriptValue> + 'static,
    {
        Self { f: Rc::new(f) }
    }

    /// Invoke with an optional receiver and positional arguments
    pub fn invoke(
        &self,
        receiver: Option<&ScriptValue>,
        args: &[ScriptValue],
    ) -> NativeResult<ScriptValue> {
        (self.f)(receiver, args)
    }

    /// Identity comparison (two handles to the same host closure)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}
