//! Script-side class and object model
//!
//! A [`ScriptClass`] mirrors exactly one native type and carries the
//! per-class caches the resolution engine maintains: installed member
//! slots for the static and instance surfaces, the negative-result
//! cache, the extension-method list used by eviction, and the
//! generic-call cache. The [`ClassRegistry`] indexes classes by id,
//! name, and native type.

use rustc_hash::FxHashMap;

use lazybind_sdk::{Callable, NativeTypeId, ScriptValue};

/// Class identifier: index into the registry's class table
pub type ClassId = usize;

/// Member name reserved for the instance constructor slot; never evicted
pub const CONSTRUCTOR_SLOT: &str = "constructor";

/// The shape of an installed binding
#[derive(Debug, Clone)]
pub enum SlotKind {
    /// Fixed, non-writable value (static const field, enum constant name)
    Const(ScriptValue),
    /// Field or property accessor pair; a write-only property has no getter
    Accessor {
        /// Read path, absent for setter-only properties
        getter: Option<Callable>,
        /// Write path
        setter: Option<Callable>,
    },
    /// Plain callable member
    Method {
        /// The marshaled method
        callable: Callable,
        /// Preserved member name, when name preservation is configured
        name: Option<String>,
    },
    /// Static provider method serving as a pseudo-instance method;
    /// the stored callable already prepends the receiver
    ExtensionMethod(Callable),
    /// Generic method stub: type arguments are bound per call through
    /// the binder's dispatch path
    GenericDispatch {
        /// Base method name with the call marker stripped
        method: String,
    },
    /// Nested type mapped to its script class
    NestedClass(ClassId),
}

/// An installed member on a class surface
#[derive(Debug, Clone)]
pub struct Slot {
    /// Binding shape
    pub kind: SlotKind,
    /// Whether the eviction engine may remove this slot
    pub configurable: bool,
}

impl Slot {
    /// An engine-installed (evictable) slot
    pub fn lazy(kind: SlotKind) -> Self {
        Self {
            kind,
            configurable: true,
        }
    }

    /// A permanent slot (pre-registered members, nested-class mappings)
    pub fn permanent(kind: SlotKind) -> Self {
        Self {
            kind,
            configurable: false,
        }
    }

    /// True when the slot can satisfy a write
    pub fn is_settable(&self) -> bool {
        matches!(
            self.kind,
            SlotKind::Accessor {
                setter: Some(_),
                ..
            }
        )
    }
}

/// A class-shaped script object mirroring one native type
#[derive(Debug)]
pub struct ScriptClass {
    /// Registry id, assigned at registration
    pub id: ClassId,
    /// Display name (may carry a generic-arity marker, e.g. "List`1")
    pub name: String,
    /// The mirrored native type
    pub native_type: NativeTypeId,
    /// Instance-surface parent (prototype link)
    pub parent: Option<ClassId>,
    /// Static-surface parent; populated by static-inheritance repair
    pub static_parent: Option<ClassId>,
    /// One-shot marker that the static chain has been repaired here
    pub static_repaired: bool,
    /// Whether this class participates in lazy resolution
    pub lazy_enabled: bool,
    /// Installed static-surface members
    pub static_members: FxHashMap<String, Slot>,
    /// Installed instance-surface members
    pub instance_members: FxHashMap<String, Slot>,
    /// Names confirmed absent after a full walk, with the staticness of
    /// the failed lookup
    pub negative_cache: FxHashMap<String, bool>,
    /// Names installed via extension fallback on a non-lazy class,
    /// recorded so eviction can remove them
    pub extension_methods: Vec<String>,
    /// Generic-call signature -> instantiated callable
    pub generic_cache: FxHashMap<String, Callable>,
}

impl ScriptClass {
    /// Create a class; the id is assigned by [`ClassRegistry::register`]
    pub fn new(name: impl Into<String>, native_type: NativeTypeId) -> Self {
        Self {
            id: 0,
            name: name.into(),
            native_type,
            parent: None,
            static_parent: None,
            static_repaired: false,
            lazy_enabled: false,
            static_members: FxHashMap::default(),
            instance_members: FxHashMap::default(),
            negative_cache: FxHashMap::default(),
            extension_methods: Vec::new(),
            generic_cache: FxHashMap::default(),
        }
    }

    /// Set the instance-surface parent
    pub fn with_parent(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark the class as eligible for lazy resolution
    pub fn lazy(mut self) -> Self {
        self.lazy_enabled = true;
        self
    }

    /// Members of the requested surface
    pub fn surface(&self, is_static: bool) -> &FxHashMap<String, Slot> {
        if is_static {
            &self.static_members
        } else {
            &self.instance_members
        }
    }

    /// Mutable members of the requested surface
    pub fn surface_mut(&mut self, is_static: bool) -> &mut FxHashMap<String, Slot> {
        if is_static {
            &mut self.static_members
        } else {
            &mut self.instance_members
        }
    }

    /// Install a slot on a surface, dropping any stale negative-cache
    /// entry for the same (name, staticness) pair
    pub fn install_slot(&mut self, name: impl Into<String>, is_static: bool, slot: Slot) {
        let name = name.into();
        if self.negative_cache.get(&name) == Some(&is_static) {
            self.negative_cache.remove(&name);
        }
        self.surface_mut(is_static).insert(name, slot);
    }

    /// True when (name, staticness) is recorded as confirmed absent
    pub fn is_negative_cached(&self, name: &str, is_static: bool) -> bool {
        self.negative_cache.get(name) == Some(&is_static)
    }
}

/// Lightweight handle to a script instance
#[derive(Debug, Clone, Copy)]
pub struct ScriptObject {
    /// The instance's script class
    pub class: ClassId,
    /// The instance's runtime native type (may be a subtype of the
    /// class's own native type)
    pub native_type: NativeTypeId,
    /// Opaque host-side object handle, passed to accessors as receiver
    pub handle: u64,
}

impl ScriptObject {
    /// Create an instance handle
    pub fn new(class: ClassId, native_type: NativeTypeId, handle: u64) -> Self {
        Self {
            class,
            native_type,
            handle,
        }
    }

    /// The receiver value handed to installed callables
    pub fn receiver(&self) -> ScriptValue {
        ScriptValue::Handle(self.handle)
    }
}

/// Registry of script classes for one binder
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes indexed by id
    classes: Vec<ScriptClass>,
    /// Class name to id mapping
    name_to_id: FxHashMap<String, ClassId>,
    /// Native type to id mapping
    type_to_id: FxHashMap<NativeTypeId, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and return its assigned id
    pub fn register(&mut self, mut class: ScriptClass) -> ClassId {
        let id = self.classes.len();
        class.id = id;
        self.name_to_id.insert(class.name.clone(), id);
        self.type_to_id.insert(class.native_type, id);
        self.classes.push(class);
        id
    }

    /// Get class by id
    pub fn get(&self, id: ClassId) -> Option<&ScriptClass> {
        self.classes.get(id)
    }

    /// Get mutable class by id
    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut ScriptClass> {
        self.classes.get_mut(id)
    }

    /// Get class by name
    pub fn get_by_name(&self, name: &str) -> Option<&ScriptClass> {
        self.name_to_id.get(name).and_then(|id| self.classes.get(*id))
    }

    /// The script class mirroring a native type, if one is registered
    pub fn class_for_type(&self, ty: NativeTypeId) -> Option<ClassId> {
        self.type_to_id.get(&ty).copied()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
