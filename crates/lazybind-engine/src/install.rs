//! Binding installer
//!
//! Turns a resolved native member into the correctly shaped slot on the
//! entry class: constants become fixed values, fields and properties
//! become accessor pairs, methods become callables, and nested types are
//! mapped through the class registry, instantiating open generic
//! definitions with the enclosing type's arguments first. The extension
//! fallback wraps its provider methods here too, so the receiver rides
//! along as the first argument.

use tracing::debug;

use lazybind_sdk::{
    Callable, MemberKinds, NativeReflector, NativeResult, NativeTypeId, NativeUnit,
    ResolvedNativeMember, ScriptValue,
};

use crate::binder::Binder;
use crate::class::{ClassId, ScriptClass, Slot, SlotKind};
use crate::config::LogLevel;

/// Wrap a provider's static method so the receiving instance rides along
/// as the first argument.
pub(crate) fn wrap_extension(callable: Callable) -> Callable {
    Callable::new(move |receiver, args| {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.cloned().unwrap_or(ScriptValue::Null));
        full.extend_from_slice(args);
        callable.invoke(None, &full)
    })
}

impl<R: NativeReflector> Binder<R> {
    /// Install a resolved member on the entry class.
    ///
    /// `found_on` is the native type whose level produced the member;
    /// only the nested-type path needs it (for the enclosing type's
    /// generic arguments). `Ok(false)` reports an install the walker
    /// should treat as a defer, not a hard failure.
    pub(crate) fn install(
        &mut self,
        entry_class: ClassId,
        found_on: NativeTypeId,
        name: &str,
        is_static: bool,
        resolved: ResolvedNativeMember,
    ) -> NativeResult<bool> {
        let kinds = resolved.kinds;

        if kinds.contains(MemberKinds::FIELD | MemberKinds::STATIC_CONST) {
            let NativeUnit::Const(value) = resolved.unit else {
                return Ok(false);
            };
            let Some(class) = self.registry.get_mut(entry_class) else {
                return Ok(false);
            };
            class.install_slot(name, is_static, Slot::lazy(SlotKind::Const(value)));
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, is_static, "const binding installed");
            }
            return Ok(true);
        }

        if kinds.contains(MemberKinds::NESTED_TYPE) {
            if !(self.config.inner_class_lazy && is_static) {
                return Ok(false);
            }
            let NativeUnit::NestedType(nested) = resolved.unit else {
                return Ok(false);
            };
            return self.install_nested_class(entry_class, found_on, name, nested);
        }

        if kinds.intersects(MemberKinds::FIELD | MemberKinds::PROPERTY) {
            let NativeUnit::Accessor(accessor) = resolved.unit else {
                return Ok(false);
            };
            let getter = if kinds.contains(MemberKinds::SETTER_ONLY) {
                None
            } else {
                Some(accessor.clone())
            };
            let Some(class) = self.registry.get_mut(entry_class) else {
                return Ok(false);
            };
            class.install_slot(
                name,
                is_static,
                Slot::lazy(SlotKind::Accessor {
                    getter,
                    setter: Some(accessor),
                }),
            );
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, is_static, "accessor binding installed");
            }
            return Ok(true);
        }

        if kinds.contains(MemberKinds::METHOD) {
            let NativeUnit::Method(callable) = resolved.unit else {
                return Ok(false);
            };
            let slot = SlotKind::Method {
                callable,
                name: self
                    .config
                    .preserve_binding_names
                    .then(|| name.to_string()),
            };
            let Some(class) = self.registry.get_mut(entry_class) else {
                return Ok(false);
            };
            class.install_slot(name, is_static, Slot::lazy(slot));
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, is_static, "method binding installed");
            }
            return Ok(true);
        }

        Ok(false)
    }

    /// Map a nested native type to its script class, instantiating open
    /// generic definitions with the enclosing type's arguments.
    fn install_nested_class(
        &mut self,
        entry_class: ClassId,
        enclosing: NativeTypeId,
        name: &str,
        nested: NativeTypeId,
    ) -> NativeResult<bool> {
        let mut nested = nested;
        if self.reflector.is_generic_definition(nested) && self.reflector.is_generic_instance(enclosing)
        {
            let args = self.reflector.generic_arguments(enclosing);
            nested = self.reflector.instantiate_generic_type(nested, &args)?;
        }
        let nested_id = self.class_for_nested(nested);
        let Some(class) = self.registry.get_mut(entry_class) else {
            return Ok(false);
        };
        // Nested-class mappings survive eviction
        class.install_slot(name, true, Slot::permanent(SlotKind::NestedClass(nested_id)));
        if self.log_on(LogLevel::Debug) {
            debug!(member = name, "nested class binding installed");
        }
        Ok(true)
    }

    /// The script class for a nested native type, registering one on
    /// demand for types no class mirrors yet.
    fn class_for_nested(&mut self, ty: NativeTypeId) -> ClassId {
        if let Some(id) = self.registry.class_for_type(ty) {
            return id;
        }
        let name = self.reflector.type_name(ty);
        let mut class = ScriptClass::new(name, ty).lazy();
        if let Some(base) = self.reflector.base_type(ty) {
            class.parent = self.registry.class_for_type(base);
        }
        self.registry.register(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_extension_prepends_receiver() {
        let method = Callable::new(|recv, args| {
            assert!(recv.is_none());
            // First argument is the receiver the wrapper injected
            match &args[0] {
                ScriptValue::Handle(7) => Ok(ScriptValue::Int(args.len() as i64)),
                other => Err(format!("unexpected receiver: {other:?}").into()),
            }
        });

        let wrapped = wrap_extension(method);
        let receiver = ScriptValue::Handle(7);
        let result = wrapped
            .invoke(Some(&receiver), &[ScriptValue::Int(1), ScriptValue::Int(2)])
            .unwrap();
        assert_eq!(result, ScriptValue::Int(3));
    }

    #[test]
    fn test_wrap_extension_without_receiver_passes_null() {
        let method = Callable::new(|_, args| Ok(args[0].clone()));
        let wrapped = wrap_extension(method);
        assert_eq!(wrapped.invoke(None, &[]).unwrap(), ScriptValue::Null);
    }
}
