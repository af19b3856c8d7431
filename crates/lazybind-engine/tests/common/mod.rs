//! Shared test fixture: an in-memory reflector over a scripted type
//! hierarchy, instrumented with call counters so tests can prove which
//! paths ran.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Once;

use lazybind_engine::{
    BindingFlags, Callable, MemberKinds, NativeReflector, NativeResult, NativeTypeId, NativeUnit,
    ResolvedNativeMember, ScriptValue,
};

#[derive(Default)]
struct TypeDef {
    name: String,
    base: Option<NativeTypeId>,
    root: bool,
    is_enum: bool,
    enum_names: HashMap<i64, String>,
    generic_definition: bool,
    generic_instance: bool,
    generic_arguments: Vec<NativeTypeId>,
    members: Vec<MemberDef>,
}

struct MemberDef {
    name: String,
    is_static: bool,
    public: bool,
    resolved: ResolvedNativeMember,
}

#[derive(Default)]
struct StubInner {
    types: HashMap<u64, TypeDef>,
    next_id: u64,
    generic_dispatch: Option<NativeTypeId>,
    instantiations: HashMap<(u64, Vec<u64>), NativeTypeId>,
    resolve_calls: usize,
    instantiate_calls: usize,
    discard_calls: usize,
    /// Every resolve query as "TypeName::member", in order
    queries: Vec<String>,
}

static TRACING: Once = Once::new();

/// Route engine logs through the test harness; `RUST_LOG` controls what
/// shows up on failure output.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Clone-able handle; tests keep one clone to inspect counters after the
/// binder takes ownership of the other.
#[derive(Clone, Default)]
pub struct StubReflector {
    inner: Rc<RefCell<StubInner>>,
}

impl StubReflector {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    fn add_type_def(&self, name: &str, base: Option<NativeTypeId>, root: bool) -> NativeTypeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.types.insert(
            id,
            TypeDef {
                name: name.to_string(),
                base,
                root,
                ..TypeDef::default()
            },
        );
        NativeTypeId(id)
    }

    pub fn add_root(&self, name: &str) -> NativeTypeId {
        self.add_type_def(name, None, true)
    }

    pub fn add_type(&self, name: &str, base: NativeTypeId) -> NativeTypeId {
        self.add_type_def(name, Some(base), false)
    }

    pub fn add_enum(&self, name: &str, base: NativeTypeId, names: &[(i64, &str)]) -> NativeTypeId {
        let ty = self.add_type_def(name, Some(base), false);
        let mut inner = self.inner.borrow_mut();
        let def = inner.types.get_mut(&ty.0).unwrap();
        def.is_enum = true;
        def.enum_names = names.iter().map(|(k, v)| (*k, v.to_string())).collect();
        ty
    }

    pub fn mark_generic_instance(&self, ty: NativeTypeId, args: &[NativeTypeId]) {
        let mut inner = self.inner.borrow_mut();
        let def = inner.types.get_mut(&ty.0).unwrap();
        def.generic_instance = true;
        def.generic_arguments = args.to_vec();
    }

    pub fn mark_generic_definition(&self, ty: NativeTypeId) {
        self.inner.borrow_mut().types.get_mut(&ty.0).unwrap().generic_definition = true;
    }

    pub fn map_instantiation(&self, definition: NativeTypeId, args: &[NativeTypeId], result: NativeTypeId) {
        self.inner.borrow_mut().instantiations.insert(
            (definition.0, args.iter().map(|a| a.0).collect()),
            result,
        );
    }

    pub fn set_generic_dispatch_type(&self, ty: NativeTypeId) {
        self.inner.borrow_mut().generic_dispatch = Some(ty);
    }

    fn add_member(&self, ty: NativeTypeId, member: MemberDef) {
        self.inner
            .borrow_mut()
            .types
            .get_mut(&ty.0)
            .unwrap()
            .members
            .push(member);
    }

    /// A mutable field backed by a shared cell; returns the cell so the
    /// test can observe writes.
    pub fn add_field(
        &self,
        ty: NativeTypeId,
        name: &str,
        is_static: bool,
        initial: ScriptValue,
    ) -> Rc<RefCell<ScriptValue>> {
        let store = Rc::new(RefCell::new(initial));
        let cell = store.clone();
        let accessor = Callable::new(move |_recv, args| {
            if args.is_empty() {
                Ok(cell.borrow().clone())
            } else {
                *cell.borrow_mut() = args[0].clone();
                Ok(ScriptValue::Null)
            }
        });
        self.add_member(
            ty,
            MemberDef {
                name: name.to_string(),
                is_static,
                public: true,
                resolved: ResolvedNativeMember::new(
                    MemberKinds::FIELD,
                    NativeUnit::Accessor(accessor),
                ),
            },
        );
        store
    }

    pub fn add_const(&self, ty: NativeTypeId, name: &str, value: ScriptValue) {
        self.add_member(
            ty,
            MemberDef {
                name: name.to_string(),
                is_static: true,
                public: true,
                resolved: ResolvedNativeMember::new(
                    MemberKinds::FIELD | MemberKinds::STATIC_CONST,
                    NativeUnit::Const(value),
                ),
            },
        );
    }

    pub fn add_method<F>(&self, ty: NativeTypeId, name: &str, is_static: bool, f: F)
    where
        F: Fn(Option<&ScriptValue>, &[ScriptValue]) -> NativeResult<ScriptValue> + 'static,
    {
        self.add_member(
            ty,
            MemberDef {
                name: name.to_string(),
                is_static,
                public: true,
                resolved: ResolvedNativeMember::new(
                    MemberKinds::METHOD,
                    NativeUnit::Method(Callable::new(f)),
                ),
            },
        );
    }

    pub fn add_property(
        &self,
        ty: NativeTypeId,
        name: &str,
        is_static: bool,
        setter_only: bool,
    ) -> Rc<RefCell<ScriptValue>> {
        let store = Rc::new(RefCell::new(ScriptValue::Null));
        let cell = store.clone();
        let accessor = Callable::new(move |_recv, args| {
            if args.is_empty() {
                Ok(cell.borrow().clone())
            } else {
                *cell.borrow_mut() = args[0].clone();
                Ok(ScriptValue::Null)
            }
        });
        let kinds = if setter_only {
            MemberKinds::PROPERTY | MemberKinds::SETTER_ONLY
        } else {
            MemberKinds::PROPERTY
        };
        self.add_member(
            ty,
            MemberDef {
                name: name.to_string(),
                is_static,
                public: true,
                resolved: ResolvedNativeMember::new(kinds, NativeUnit::Accessor(accessor)),
            },
        );
        store
    }

    /// A non-public instance property with a dotted interface-accessor
    /// name (e.g. "Collections.IEnumerator.Current").
    pub fn add_private_property(&self, ty: NativeTypeId, dotted_name: &str) -> Rc<RefCell<ScriptValue>> {
        let store = Rc::new(RefCell::new(ScriptValue::Null));
        let cell = store.clone();
        let accessor = Callable::new(move |_recv, args| {
            if args.is_empty() {
                Ok(cell.borrow().clone())
            } else {
                *cell.borrow_mut() = args[0].clone();
                Ok(ScriptValue::Null)
            }
        });
        self.add_member(
            ty,
            MemberDef {
                name: dotted_name.to_string(),
                is_static: false,
                public: false,
                resolved: ResolvedNativeMember::new(
                    MemberKinds::PROPERTY,
                    NativeUnit::Accessor(accessor),
                ),
            },
        );
        store
    }

    pub fn add_nested(&self, ty: NativeTypeId, name: &str, nested: NativeTypeId) {
        self.add_member(
            ty,
            MemberDef {
                name: name.to_string(),
                is_static: true,
                public: true,
                resolved: ResolvedNativeMember::new(
                    MemberKinds::NESTED_TYPE,
                    NativeUnit::NestedType(nested),
                ),
            },
        );
    }

    pub fn resolve_calls(&self) -> usize {
        self.inner.borrow().resolve_calls
    }

    pub fn instantiate_calls(&self) -> usize {
        self.inner.borrow().instantiate_calls
    }

    pub fn discard_calls(&self) -> usize {
        self.inner.borrow().discard_calls
    }

    pub fn queries(&self) -> Vec<String> {
        self.inner.borrow().queries.clone()
    }
}

impl NativeReflector for StubReflector {
    fn resolve(
        &self,
        ty: NativeTypeId,
        name: &str,
        kinds: MemberKinds,
        flags: BindingFlags,
    ) -> NativeResult<Option<ResolvedNativeMember>> {
        let mut inner = self.inner.borrow_mut();
        inner.resolve_calls += 1;
        let type_name = inner
            .types
            .get(&ty.0)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        inner.queries.push(format!("{type_name}::{name}"));

        let Some(def) = inner.types.get(&ty.0) else {
            return Err(format!("unknown type id {}", ty.0).into());
        };
        let wants_static = flags.contains(BindingFlags::STATIC);
        let wants_instance = flags.contains(BindingFlags::INSTANCE);
        for member in &def.members {
            if member.name != name {
                continue;
            }
            if !member.resolved.kinds.intersects(kinds) {
                continue;
            }
            if member.is_static && !wants_static {
                continue;
            }
            if !member.is_static && !wants_instance {
                continue;
            }
            let visible = (member.public && flags.contains(BindingFlags::PUBLIC))
                || (!member.public && flags.contains(BindingFlags::NON_PUBLIC));
            if !visible {
                continue;
            }
            return Ok(Some(member.resolved.clone()));
        }
        Ok(None)
    }

    fn base_type(&self, ty: NativeTypeId) -> Option<NativeTypeId> {
        self.inner.borrow().types.get(&ty.0).and_then(|t| t.base)
    }

    fn is_root(&self, ty: NativeTypeId) -> bool {
        self.inner.borrow().types.get(&ty.0).is_some_and(|t| t.root)
    }

    fn is_enum(&self, ty: NativeTypeId) -> bool {
        self.inner.borrow().types.get(&ty.0).is_some_and(|t| t.is_enum)
    }

    fn enum_name(&self, ty: NativeTypeId, ordinal: i64) -> Option<String> {
        self.inner
            .borrow()
            .types
            .get(&ty.0)
            .and_then(|t| t.enum_names.get(&ordinal).cloned())
    }

    fn instantiate_generic_method(
        &self,
        _ty: NativeTypeId,
        method: &str,
        type_args: &[NativeTypeId],
    ) -> NativeResult<Callable> {
        let mut inner = self.inner.borrow_mut();
        inner.instantiate_calls += 1;
        let arg_names: Vec<String> = type_args
            .iter()
            .map(|a| {
                inner
                    .types
                    .get(&a.0)
                    .map(|t| t.name.clone())
                    .unwrap_or_default()
            })
            .collect();
        let tag = format!("{method}<{}>", arg_names.join(","));
        Ok(Callable::new(move |_recv, _args| {
            Ok(ScriptValue::Str(tag.clone()))
        }))
    }

    fn is_generic_definition(&self, ty: NativeTypeId) -> bool {
        self.inner
            .borrow()
            .types
            .get(&ty.0)
            .is_some_and(|t| t.generic_definition)
    }

    fn is_generic_instance(&self, ty: NativeTypeId) -> bool {
        self.inner
            .borrow()
            .types
            .get(&ty.0)
            .is_some_and(|t| t.generic_instance)
    }

    fn generic_arguments(&self, ty: NativeTypeId) -> Vec<NativeTypeId> {
        self.inner
            .borrow()
            .types
            .get(&ty.0)
            .map(|t| t.generic_arguments.clone())
            .unwrap_or_default()
    }

    fn instantiate_generic_type(
        &self,
        definition: NativeTypeId,
        args: &[NativeTypeId],
    ) -> NativeResult<NativeTypeId> {
        let key = (definition.0, args.iter().map(|a| a.0).collect::<Vec<_>>());
        self.inner
            .borrow()
            .instantiations
            .get(&key)
            .copied()
            .ok_or_else(|| "no instantiation mapping".into())
    }

    fn declared_property_names(&self, ty: NativeTypeId, flags: BindingFlags) -> Vec<String> {
        let inner = self.inner.borrow();
        let Some(def) = inner.types.get(&ty.0) else {
            return Vec::new();
        };
        def.members
            .iter()
            .filter(|m| {
                m.resolved.kinds.contains(MemberKinds::PROPERTY)
                    && !m.is_static
                    && ((m.public && flags.contains(BindingFlags::PUBLIC))
                        || (!m.public && flags.contains(BindingFlags::NON_PUBLIC)))
            })
            .map(|m| m.name.clone())
            .collect()
    }

    fn type_name(&self, ty: NativeTypeId) -> String {
        self.inner
            .borrow()
            .types
            .get(&ty.0)
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    fn generic_dispatch_type(&self) -> Option<NativeTypeId> {
        self.inner.borrow().generic_dispatch
    }

    fn discard_callback_state(&self) {
        self.inner.borrow_mut().discard_calls += 1;
    }
}
