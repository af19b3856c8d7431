//! The binder: per-engine resolution context and interception hooks
//!
//! One [`Binder`] owns everything one scripting engine needs for lazy
//! member resolution: the class registry, the extension-provider
//! registry, the touched-class set for eviction, the configuration, and
//! the host's reflector. Two binders share nothing; a host running
//! several engines creates one binder each.
//!
//! Member access funnels through the explicit `get_member` / `set_member`
//! indirection (and the `call_*` variants) instead of an
//! intercept-everything proxy: an access that finds an installed slot is
//! served directly, anything else triggers the hierarchy walker and a
//! re-read of the now-installed member.

use std::time::Duration;

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use lazybind_sdk::{
    Callable, MemberKinds, NativeError, NativeReflector, NativeResult, NativeTypeId, ScriptValue,
};

use crate::class::{ClassId, ClassRegistry, ScriptClass, ScriptObject, Slot, SlotKind};
use crate::config::{BinderConfig, LogLevel};

/// Bookkeeping names on the static surface that resolution never touches
/// and eviction never removes.
static RESERVED_STATIC_MEMBERS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["name", "length", "prototype", "constructor"]
        .into_iter()
        .collect()
});

/// The member force-registered when the binder is enabled; the
/// generic-call path resolves concrete methods through it, so it cannot
/// itself be resolved lazily.
pub const GENERIC_DISPATCH_MEMBER: &str = "getMember";

/// Marker prefix of the simplified generic-call convention
pub(crate) const GENERIC_CALL_MARKER: char = '$';

/// True for reserved static-surface bookkeeping names
pub(crate) fn is_reserved_static(name: &str) -> bool {
    RESERVED_STATIC_MEMBERS.contains(name)
}

/// Per-engine lazy binding context
pub struct Binder<R: NativeReflector> {
    pub(crate) reflector: R,
    pub(crate) registry: ClassRegistry,
    pub(crate) config: BinderConfig,
    pub(crate) enabled: bool,
    /// Receiver class -> provider classes, scanned in registration order
    pub(crate) extensions: FxHashMap<ClassId, Vec<ClassId>>,
    /// Classes holding engine-installed bindings or negative-cache
    /// entries since the last eviction
    pub(crate) touched: FxHashSet<ClassId>,
    pub(crate) profile_total: Duration,
}

impl<R: NativeReflector> Binder<R> {
    /// Create a disabled binder with default configuration
    pub fn new(reflector: R) -> Self {
        Self::with_config(reflector, BinderConfig::default())
    }

    /// Create a disabled binder with the given option record
    pub fn with_config(reflector: R, config: BinderConfig) -> Self {
        Self {
            reflector,
            registry: ClassRegistry::new(),
            config,
            enabled: false,
            extensions: FxHashMap::default(),
            touched: FxHashSet::default(),
            profile_total: Duration::ZERO,
        }
    }

    /// The class registry (hosts register classes through this)
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Mutable class registry; hosts go through this to mirror
    /// script-side property deletes onto the installed surfaces
    pub fn registry_mut(&mut self) -> &mut ClassRegistry {
        &mut self.registry
    }

    /// Register a script class mirroring a native type
    pub fn register_class(&mut self, class: ScriptClass) -> ClassId {
        self.registry.register(class)
    }

    /// Register an extension provider for a receiver class.
    ///
    /// Providers are scanned in registration order when direct
    /// resolution misses an instance member.
    pub fn register_extension(&mut self, receiver: ClassId, provider: ClassId) {
        self.extensions.entry(receiver).or_default().push(provider);
    }

    /// Current configuration
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Mutable configuration
    pub fn config_mut(&mut self) -> &mut BinderConfig {
        &mut self.config
    }

    /// Whether lazy resolution currently runs at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Accumulated resolution wall time (zero unless profiling is on)
    pub fn profile_total(&self) -> Duration {
        self.profile_total
    }

    /// Master switch: toggles resolution, nested-type laziness, and log
    /// verbosity. Enabling force-registers the bootstrap member the
    /// generic-call path depends on.
    pub fn set_enabled(&mut self, enabled: bool, debug_logs: bool) {
        self.config.log_level = if debug_logs {
            LogLevel::Info
        } else {
            LogLevel::Error
        };
        if self.log_on(LogLevel::Info) {
            info!(enabled, "lazy binding toggled");
        }
        self.enabled = enabled;
        self.config.inner_class_lazy = enabled;
        if enabled {
            if let Some(ty) = self.reflector.generic_dispatch_type() {
                let class_id = match self.registry.class_for_type(ty) {
                    Some(id) => id,
                    None => {
                        let name = self.reflector.type_name(ty);
                        self.registry.register(ScriptClass::new(name, ty).lazy())
                    }
                };
                self.add_api(class_id, GENERIC_DISPATCH_MEMBER, false, Some(MemberKinds::METHOD));
            }
        }
    }

    /// Eagerly resolve one member; a no-op when it is already present.
    ///
    /// Unlike the interception hooks this is for hosts that want to
    /// inspect the outcome: `false` means the member could not be
    /// resolved.
    pub fn add_api(
        &mut self,
        class_id: ClassId,
        name: &str,
        is_static: bool,
        kinds: Option<MemberKinds>,
    ) -> bool {
        if self.lookup_slot(class_id, name, is_static).is_some() {
            return true;
        }
        let Some(native_type) = self.registry.get(class_id).map(|c| c.native_type) else {
            return false;
        };
        let kinds = kinds.unwrap_or(MemberKinds::default_lookup() | MemberKinds::NESTED_TYPE);
        self.resolve_hierarchy(native_type, class_id, name, is_static, kinds)
    }

    // ------------------------------------------------------------------
    // Interception hooks
    // ------------------------------------------------------------------

    /// Instance read trap.
    ///
    /// `Ok(None)` is the environment's normal absent-member signal;
    /// resolution failures never surface as errors. An `Err` can only
    /// come from an installed getter raising during the read itself.
    ///
    /// Generic dispatch members (`$name`) read as a placeholder
    /// function: type arguments can only be bound through
    /// [`call_member`](Binder::call_member), so invoking the value
    /// returned here fails with [`NativeError::Unsupported`].
    pub fn get_member(
        &mut self,
        obj: &ScriptObject,
        name: &str,
    ) -> NativeResult<Option<ScriptValue>> {
        if let Some((_, slot)) = self.lookup_slot(obj.class, name, false) {
            return self.read_slot(&slot, Some(&obj.receiver()));
        }
        self.ensure_static_inheritance(obj.class);
        if self.resolve_hierarchy(
            obj.native_type,
            obj.class,
            name,
            false,
            MemberKinds::default_lookup(),
        ) {
            if let Some((_, slot)) = self.lookup_slot(obj.class, name, false) {
                return self.read_slot(&slot, Some(&obj.receiver()));
            }
        }
        Ok(None)
    }

    /// Instance write trap; only fields and properties resolve here.
    ///
    /// `Ok(false)` means the engine does not own this member and the
    /// host should fall back to its plain own-property write.
    pub fn set_member(
        &mut self,
        obj: &ScriptObject,
        name: &str,
        value: ScriptValue,
    ) -> NativeResult<bool> {
        if let Some((_, slot)) = self.lookup_slot(obj.class, name, false) {
            return self.write_slot(&slot, Some(&obj.receiver()), value);
        }
        self.ensure_static_inheritance(obj.class);
        if self.resolve_hierarchy(
            obj.native_type,
            obj.class,
            name,
            false,
            MemberKinds::settable(),
        ) {
            if let Some((_, slot)) = self.lookup_slot(obj.class, name, false) {
                return self.write_slot(&slot, Some(&obj.receiver()), value);
            }
        }
        Ok(false)
    }

    /// Static read trap
    pub fn get_static_member(
        &mut self,
        class_id: ClassId,
        name: &str,
    ) -> NativeResult<Option<ScriptValue>> {
        if is_reserved_static(name) {
            return Ok(None);
        }
        if let Some((_, slot)) = self.lookup_slot(class_id, name, true) {
            return self.read_slot(&slot, None);
        }
        let Some(native_type) = self.registry.get(class_id).map(|c| c.native_type) else {
            return Ok(None);
        };
        let mut kinds = MemberKinds::default_lookup();
        if self.config.inner_class_lazy {
            kinds |= MemberKinds::NESTED_TYPE;
        }
        if self.resolve_hierarchy(native_type, class_id, name, true, kinds) {
            if let Some((_, slot)) = self.lookup_slot(class_id, name, true) {
                return self.read_slot(&slot, None);
            }
        }
        Ok(None)
    }

    /// Static write trap.
    ///
    /// Numeric names bypass resolution: enum ordinal values are defined
    /// directly at class-registration time and must not trigger a walk.
    pub fn set_static_member(
        &mut self,
        class_id: ClassId,
        name: &str,
        value: ScriptValue,
    ) -> NativeResult<bool> {
        if is_reserved_static(name) || name.parse::<i64>().is_ok() {
            return Ok(false);
        }
        if let Some((_, slot)) = self.lookup_slot(class_id, name, true) {
            return self.write_slot(&slot, None, value);
        }
        let Some(native_type) = self.registry.get(class_id).map(|c| c.native_type) else {
            return Ok(false);
        };
        if self.resolve_hierarchy(native_type, class_id, name, true, MemberKinds::settable()) {
            if let Some((_, slot)) = self.lookup_slot(class_id, name, true) {
                return self.write_slot(&slot, None, value);
            }
        }
        Ok(false)
    }

    /// Invoke an instance member, resolving it first if needed
    pub fn call_member(
        &mut self,
        obj: &ScriptObject,
        name: &str,
        args: &[ScriptValue],
    ) -> NativeResult<ScriptValue> {
        let slot = match self.lookup_slot(obj.class, name, false) {
            Some((_, slot)) => Some(slot),
            None => {
                self.ensure_static_inheritance(obj.class);
                if self.resolve_hierarchy(
                    obj.native_type,
                    obj.class,
                    name,
                    false,
                    MemberKinds::default_lookup(),
                ) {
                    self.lookup_slot(obj.class, name, false).map(|(_, s)| s)
                } else {
                    None
                }
            }
        };
        match slot {
            Some(slot) => self.invoke_slot(obj.class, &slot, Some(&obj.receiver()), args),
            None => Err(NativeError::Resolution(format!(
                "no such member: {name}"
            ))),
        }
    }

    /// Invoke a static member, resolving it first if needed
    pub fn call_static_member(
        &mut self,
        class_id: ClassId,
        name: &str,
        args: &[ScriptValue],
    ) -> NativeResult<ScriptValue> {
        let slot = match self.lookup_slot(class_id, name, true) {
            Some((_, slot)) => Some(slot),
            None => {
                let native_type = self
                    .registry
                    .get(class_id)
                    .map(|c| c.native_type)
                    .ok_or_else(|| NativeError::Resolution("unknown class".to_string()))?;
                if self.resolve_hierarchy(
                    native_type,
                    class_id,
                    name,
                    true,
                    MemberKinds::default_lookup(),
                ) {
                    self.lookup_slot(class_id, name, true).map(|(_, s)| s)
                } else {
                    None
                }
            }
        };
        match slot {
            Some(slot) => self.invoke_slot(class_id, &slot, None, args),
            None => Err(NativeError::Resolution(format!(
                "no such member: {name}"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Static-inheritance repair
    // ------------------------------------------------------------------

    /// One-shot per class: mirror the instance-parent chain onto the
    /// static surface so base-class statics become discoverable.
    ///
    /// The scripting environment's class wiring does not propagate
    /// static-side inheritance on its own. Stops at the chain's end or
    /// at an already-repaired ancestor.
    pub fn ensure_static_inheritance(&mut self, class_id: ClassId) {
        let mut current = class_id;
        loop {
            let Some(class) = self.registry.get(current) else {
                break;
            };
            if class.static_repaired {
                break;
            }
            if self.log_on(LogLevel::Debug) {
                debug!(class = %class.name, "repairing static inheritance");
            }
            let parent = class.parent;
            if let Some(class) = self.registry.get_mut(current) {
                class.static_parent = parent;
                class.static_repaired = true;
            }
            match parent {
                Some(p) => current = p,
                None => break,
            }
        }
    }

    // ------------------------------------------------------------------
    // Slot access
    // ------------------------------------------------------------------

    /// Find an installed slot on the surface chain.
    ///
    /// Instance lookups follow the prototype (parent) links; static
    /// lookups follow the repaired static links. Returns the holding
    /// class alongside a copy of the slot.
    pub(crate) fn lookup_slot(
        &self,
        class_id: ClassId,
        name: &str,
        is_static: bool,
    ) -> Option<(ClassId, Slot)> {
        let mut current = Some(class_id);
        while let Some(id) = current {
            let class = self.registry.get(id)?;
            if let Some(slot) = class.surface(is_static).get(name) {
                return Some((id, slot.clone()));
            }
            current = if is_static {
                class.static_parent
            } else {
                class.parent
            };
        }
        None
    }

    /// Read a slot the way the environment's property read would
    pub(crate) fn read_slot(
        &self,
        slot: &Slot,
        receiver: Option<&ScriptValue>,
    ) -> NativeResult<Option<ScriptValue>> {
        match &slot.kind {
            SlotKind::Const(value) => Ok(Some(value.clone())),
            SlotKind::Accessor {
                getter: Some(getter),
                ..
            } => getter.invoke(receiver, &[]).map(Some),
            // Reading a write-only property yields the absent value, not
            // a missing-member signal
            SlotKind::Accessor { getter: None, .. } => Ok(Some(ScriptValue::Null)),
            SlotKind::Method { callable, .. } => Ok(Some(ScriptValue::Function(callable.clone()))),
            SlotKind::ExtensionMethod(callable) => {
                Ok(Some(ScriptValue::Function(callable.clone())))
            }
            SlotKind::GenericDispatch { method } => {
                let method = method.clone();
                Ok(Some(ScriptValue::Function(Callable::new(move |_, _| {
                    Err(NativeError::Unsupported(format!(
                        "generic method {method} must be invoked through the binder"
                    )))
                }))))
            }
            SlotKind::NestedClass(id) => Ok(self
                .registry
                .get(*id)
                .map(|c| ScriptValue::Type(c.native_type))),
        }
    }

    /// Write through a slot; `Ok(false)` when the slot is not settable
    pub(crate) fn write_slot(
        &self,
        slot: &Slot,
        receiver: Option<&ScriptValue>,
        value: ScriptValue,
    ) -> NativeResult<bool> {
        match &slot.kind {
            SlotKind::Accessor {
                setter: Some(setter),
                ..
            } => {
                setter.invoke(receiver, &[value])?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Invoke a slot as a call; generic dispatch binds its leading type
    /// arguments here.
    pub(crate) fn invoke_slot(
        &mut self,
        class_id: ClassId,
        slot: &Slot,
        receiver: Option<&ScriptValue>,
        args: &[ScriptValue],
    ) -> NativeResult<ScriptValue> {
        match &slot.kind {
            SlotKind::Method { callable, .. } => callable.invoke(receiver, args),
            SlotKind::ExtensionMethod(callable) => callable.invoke(receiver, args),
            SlotKind::GenericDispatch { method } => {
                let split = args
                    .iter()
                    .position(|a| a.as_type().is_none())
                    .unwrap_or(args.len());
                if split == 0 {
                    return Err(NativeError::ArgumentError(
                        "generic call requires leading type arguments".to_string(),
                    ));
                }
                let type_args: Vec<NativeTypeId> =
                    args[..split].iter().filter_map(|a| a.as_type()).collect();
                let method = method.clone();
                let callable = self.dispatch_generic(class_id, &method, &type_args)?;
                callable.invoke(receiver, &args[split..])
            }
            SlotKind::Accessor { .. } | SlotKind::Const(_) | SlotKind::NestedClass(_) => {
                Err(NativeError::TypeMismatch {
                    expected: "callable member".to_string(),
                    got: "data member".to_string(),
                })
            }
        }
    }

    /// Log gate in the configured-floor style
    pub(crate) fn log_on(&self, level: LogLevel) -> bool {
        level >= self.config.log_level
    }

    /// Warn-level trace with class/member context
    pub(crate) fn warn_member(&self, class_id: ClassId, name: &str, is_static: bool, what: &str) {
        if self.log_on(LogLevel::Warn) {
            let class = self
                .registry
                .get(class_id)
                .map(|c| c.name.as_str())
                .unwrap_or("<unknown>");
            warn!(
                class,
                member = name,
                is_static,
                "{what}"
            );
        }
    }
}
