//! Hierarchy walker and resolution orchestration
//!
//! The walker drives one member resolution end to end: negative-cache
//! consult, the specialized paths (simplified generic calls, enum
//! constants), the base-type walk with per-level resolution, and the
//! terminal fallbacks (extension methods, privately-declared interface
//! accessors). Nothing here raises into the accessing script: every
//! reflector error is caught at the walk boundary, logged, and reported
//! as an ordinary miss.

use std::time::Instant;

use tracing::{debug, error, warn};

use lazybind_sdk::{
    BindingFlags, MemberKinds, NativeReflector, NativeResult, NativeTypeId, NativeUnit,
    ScriptValue,
};

use crate::binder::{Binder, GENERIC_CALL_MARKER};
use crate::class::{ClassId, Slot, SlotKind};
use crate::config::LogLevel;

/// Outcome of a single-level resolution attempt.
///
/// Three distinct meanings, kept as three variants: the member was found
/// and installed; the member categorically cannot exist (the walk
/// reached the universal root type); or this level has nothing but a
/// parent might.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Member resolved and installed at the entry class
    Found,
    /// Stop walking: no ancestor can provide this member
    DefinitelyAbsent,
    /// Not at this level; advance to the base type and retry
    DeferToParent,
}

impl<R: NativeReflector> Binder<R> {
    /// Resolve one member against the type hierarchy and install the
    /// binding on `class_id`. Returns `true` on success.
    ///
    /// Never propagates reflector errors; a failed resolution leaves a
    /// negative-cache entry and reports `false`.
    pub(crate) fn resolve_hierarchy(
        &mut self,
        native_type: NativeTypeId,
        class_id: ClassId,
        name: &str,
        is_static: bool,
        kinds: MemberKinds,
    ) -> bool {
        let started = self.config.profile_resolution.then(Instant::now);
        let outcome = self.resolve_hierarchy_inner(native_type, class_id, name, is_static, kinds);
        if let Some(started) = started {
            self.profile_total += started.elapsed();
        }
        match outcome {
            Ok(found) => found,
            Err(err) => {
                if self.log_on(LogLevel::Error) {
                    error!(member = name, is_static, %err, "member resolution raised");
                }
                false
            }
        }
    }

    fn resolve_hierarchy_inner(
        &mut self,
        native_type: NativeTypeId,
        class_id: ClassId,
        name: &str,
        is_static: bool,
        kinds: MemberKinds,
    ) -> NativeResult<bool> {
        if name.is_empty() {
            if self.log_on(LogLevel::Warn) {
                warn!(is_static, "non-identifier member name, skipping resolution");
            }
            return Ok(false);
        }
        let Some(entry) = self.registry.get(class_id) else {
            if self.log_on(LogLevel::Warn) {
                warn!(member = name, "bad state, unknown class");
            }
            return Ok(false);
        };
        if entry.is_negative_cached(name, is_static) {
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, is_static, "negative cache hit");
            }
            return Ok(false);
        }

        // The simplified generic-call convention is checked before the
        // master switch, so `$name` accesses keep working while general
        // lazy resolution is off.
        if self.config.simplified_generic_calls
            && name.starts_with(GENERIC_CALL_MARKER)
            && name.len() > 1
        {
            let installed = self.install_generic_dispatch(class_id, name, is_static);
            if installed {
                self.touched.insert(class_id);
            }
            return Ok(installed);
        }

        if !self.enabled {
            return Ok(false);
        }

        if is_static && self.reflector.is_enum(native_type) {
            if self.resolve_enum_constant(native_type, class_id, name)? {
                self.touched.insert(class_id);
                return Ok(true);
            }
        }

        let mut current_type = native_type;
        let mut current_class = class_id;
        let mut level = 0u32;
        loop {
            match self.resolve_at_level(current_type, current_class, class_id, name, is_static, kinds)? {
                Resolution::Found => {
                    if level > 1 {
                        self.warn_member(class_id, name, is_static, "slow resolution: walked multiple parent levels");
                    }
                    self.touched.insert(class_id);
                    return Ok(true);
                }
                Resolution::DefinitelyAbsent => break,
                Resolution::DeferToParent => {
                    let Some(base) = self.reflector.base_type(current_type) else {
                        break;
                    };
                    current_type = base;
                    if let Some(parent) = self.registry.get(current_class).and_then(|c| c.parent) {
                        current_class = parent;
                    }
                    level += 1;
                    if self.log_on(LogLevel::Debug) {
                        debug!(member = name, level, "trying parent type");
                    }
                }
            }
        }

        // Tried once, after the full walk, against the entry type
        if !is_static && self.resolve_private_interface_accessor(native_type, class_id, name)? {
            self.touched.insert(class_id);
            return Ok(true);
        }

        if let Some(class) = self.registry.get_mut(class_id) {
            class.negative_cache.insert(name.to_string(), is_static);
            self.touched.insert(class_id);
        }
        self.warn_member(class_id, name, is_static, "member resolution failed");
        Ok(false)
    }

    /// Attempt resolution at one (type, class) level of the walk.
    ///
    /// The level's class decides participation (lazy flag, extension
    /// providers); a successful install always lands on the entry class.
    pub(crate) fn resolve_at_level(
        &mut self,
        current_type: NativeTypeId,
        current_class: ClassId,
        entry_class: ClassId,
        name: &str,
        is_static: bool,
        kinds: MemberKinds,
    ) -> NativeResult<Resolution> {
        if self.reflector.is_root(current_type) {
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, "reached root type, giving up");
            }
            return Ok(Resolution::DefinitelyAbsent);
        }
        let Some(class) = self.registry.get(current_class) else {
            return Ok(Resolution::DeferToParent);
        };

        if !class.lazy_enabled {
            // Non-participating classes are still eligible for the
            // extension and nested-type fallbacks.
            if !is_static {
                if self.try_extension(current_class, entry_class, name)? {
                    return Ok(Resolution::Found);
                }
            } else if self.config.inner_class_lazy
                && self.try_nested_type(current_type, entry_class, name)?
            {
                return Ok(Resolution::Found);
            }
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, class = current_class, "class not lazy-enabled");
            }
            return Ok(Resolution::DeferToParent);
        }

        let flags = BindingFlags::PUBLIC
            | BindingFlags::NON_PUBLIC
            | BindingFlags::DECLARED_ONLY
            | if is_static {
                BindingFlags::STATIC
            } else {
                BindingFlags::INSTANCE
            };
        match self.reflector.resolve(current_type, name, kinds, flags)? {
            None => {
                if !is_static && self.try_extension(current_class, entry_class, name)? {
                    return Ok(Resolution::Found);
                }
                Ok(Resolution::DeferToParent)
            }
            Some(resolved) => {
                if self.install(entry_class, current_type, name, is_static, resolved)? {
                    Ok(Resolution::Found)
                } else {
                    Ok(Resolution::DeferToParent)
                }
            }
        }
    }

    /// Enum-constant path for static lookups against enumeration types.
    ///
    /// Numeric text resolves the ordinal to its symbolic name; anything
    /// else goes through standard single-level field resolution.
    fn resolve_enum_constant(
        &mut self,
        native_type: NativeTypeId,
        class_id: ClassId,
        name: &str,
    ) -> NativeResult<bool> {
        if let Ok(ordinal) = name.parse::<i64>() {
            let Some(symbol) = self.reflector.enum_name(native_type, ordinal) else {
                return Ok(false);
            };
            if let Some(class) = self.registry.get_mut(class_id) {
                class.install_slot(
                    name,
                    true,
                    Slot::lazy(SlotKind::Const(ScriptValue::Str(symbol))),
                );
                if self.log_on(LogLevel::Debug) {
                    debug!(member = name, "enum ordinal binding installed");
                }
                return Ok(true);
            }
            return Ok(false);
        }
        Ok(self.resolve_at_level(native_type, class_id, class_id, name, true, MemberKinds::FIELD)?
            == Resolution::Found)
    }

    /// Scan the level class's extension providers for a static method of
    /// this name; first provider with a match wins.
    pub(crate) fn try_extension(
        &mut self,
        level_class: ClassId,
        entry_class: ClassId,
        name: &str,
    ) -> NativeResult<bool> {
        let providers = match self.extensions.get(&level_class) {
            Some(p) if !p.is_empty() => p.clone(),
            _ => return Ok(false),
        };
        if self.log_on(LogLevel::Debug) {
            debug!(member = name, providers = providers.len(), "checking extension providers");
        }
        let flags = BindingFlags::PUBLIC | BindingFlags::DECLARED_ONLY | BindingFlags::STATIC;
        let mut found = None;
        for provider in providers {
            let Some(provider_type) = self.registry.get(provider).map(|c| c.native_type) else {
                continue;
            };
            if let Some(resolved) =
                self.reflector
                    .resolve(provider_type, name, MemberKinds::METHOD, flags)?
            {
                if resolved.kinds.contains(MemberKinds::METHOD) {
                    found = Some(resolved);
                    break;
                }
            }
        }
        let Some(resolved) = found else {
            return Ok(false);
        };
        let NativeUnit::Method(callable) = resolved.unit else {
            return Ok(false);
        };
        let wrapped = crate::install::wrap_extension(callable);
        let Some(class) = self.registry.get_mut(entry_class) else {
            return Ok(false);
        };
        class.install_slot(name, false, Slot::lazy(SlotKind::ExtensionMethod(wrapped)));
        if !class.lazy_enabled && !class.extension_methods.iter().any(|n| n == name) {
            class.extension_methods.push(name.to_string());
        }
        if self.log_on(LogLevel::Debug) {
            debug!(member = name, "extension method binding installed");
        }
        Ok(true)
    }

    /// Nested-type fallback for non-lazy classes on the static surface
    fn try_nested_type(
        &mut self,
        current_type: NativeTypeId,
        entry_class: ClassId,
        name: &str,
    ) -> NativeResult<bool> {
        let flags = BindingFlags::INSTANCE | BindingFlags::STATIC | BindingFlags::PUBLIC;
        let Some(resolved) =
            self.reflector
                .resolve(current_type, name, MemberKinds::NESTED_TYPE, flags)?
        else {
            return Ok(false);
        };
        self.install(entry_class, current_type, name, true, resolved)
    }

    /// Instance members published through privately-declared interface
    /// accessors carry dotted names; match on the suffix and install the
    /// accessor pair under the plain name.
    fn resolve_private_interface_accessor(
        &mut self,
        native_type: NativeTypeId,
        class_id: ClassId,
        name: &str,
    ) -> NativeResult<bool> {
        let flags =
            BindingFlags::INSTANCE | BindingFlags::NON_PUBLIC | BindingFlags::DECLARED_ONLY;
        let suffix = format!(".{name}");
        for declared in self.reflector.declared_property_names(native_type, flags) {
            if !declared.ends_with(&suffix) {
                continue;
            }
            let Some(resolved) =
                self.reflector
                    .resolve(native_type, &declared, MemberKinds::PROPERTY, flags)?
            else {
                continue;
            };
            let NativeUnit::Accessor(accessor) = resolved.unit else {
                continue;
            };
            let Some(class) = self.registry.get_mut(class_id) else {
                return Ok(false);
            };
            class.install_slot(
                name,
                false,
                Slot::lazy(SlotKind::Accessor {
                    getter: Some(accessor.clone()),
                    setter: Some(accessor),
                }),
            );
            if self.log_on(LogLevel::Debug) {
                debug!(member = name, declared, "private interface accessor installed");
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Install the call-style generic stub under the marked name
    fn install_generic_dispatch(&mut self, class_id: ClassId, name: &str, is_static: bool) -> bool {
        let method = name[GENERIC_CALL_MARKER.len_utf8()..].to_string();
        if method.is_empty() {
            return false;
        }
        let Some(class) = self.registry.get_mut(class_id) else {
            return false;
        };
        class.install_slot(
            name,
            is_static,
            Slot::lazy(SlotKind::GenericDispatch { method }),
        );
        if self.log_on(LogLevel::Debug) {
            debug!(member = name, is_static, "generic dispatch binding installed");
        }
        true
    }
}
