//! The type store: every module, type and method known to the runtime.
//!
//! Tables are append-only. Entries are handed out as `Arc` clones so callers
//! never hold a table lock while they work (method bodies re-enter the
//! store). Types can be declared first and completed later, which lets
//! signatures refer to types that are defined afterwards.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::builder::{MethodBuilder, TypeBuilder};
use crate::def::{MethodDef, ModuleDef, TypeDef, TypeKind, Visibility};
use crate::flags::{MethodFlags, TypeFlags};
use crate::idx::{MethodId, ModuleId, TypeId};
use crate::invoke::InvokeError;
use crate::ty::TypeRef;
use crate::value::Value;

mod dispatch;
mod format;

/// Shared registry of runtime type metadata.
pub struct TypeStore {
    modules: RwLock<Vec<ModuleDef>>,
    types: RwLock<Vec<Arc<TypeDef>>>,
    methods: RwLock<Vec<Arc<MethodDef>>>,
    /// Full name -> type.
    names: RwLock<FxHashMap<String, TypeId>>,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeStore")
            .field("modules", &self.modules.read().len())
            .field("types", &self.types.read().len())
            .field("methods", &self.methods.read().len())
            .finish()
    }
}

impl TypeStore {
    /// Create a store holding the core module and the well-known types.
    pub fn new() -> Self {
        let store = TypeStore {
            modules: RwLock::new(vec![ModuleDef {
                name: "CoreLib".to_string(),
                allows_access_waiver: false,
            }]),
            types: RwLock::new(Vec::new()),
            methods: RwLock::new(Vec::new()),
            names: RwLock::new(FxHashMap::default()),
        };
        store.register_well_known();
        store
    }

    fn register_well_known(&self) {
        let object = self.define(
            TypeBuilder::class("System.Object")
                .method(
                    MethodBuilder::new("ToString")
                        .returns(TypeRef::of(TypeId::STRING))
                        .with_flags(MethodFlags::VIRTUAL)
                        .body(|inv| {
                            let name = inv
                                .this
                                .and_then(Value::runtime_type)
                                .map_or_else(String::new, |ty| inv.store.full_name(&ty));
                            Ok(Value::string(name))
                        }),
                )
                .method(
                    MethodBuilder::new("Equals")
                        .param("other", TypeRef::object())
                        .returns(TypeRef::of(TypeId::BOOL))
                        .with_flags(MethodFlags::VIRTUAL)
                        .body(|inv| {
                            let this = inv.this.cloned().unwrap_or_default();
                            Ok(Value::Bool(this.same_instance(inv.arg(0))))
                        }),
                )
                .method(
                    MethodBuilder::new("GetHashCode")
                        .returns(TypeRef::of(TypeId::INT32))
                        .with_flags(MethodFlags::VIRTUAL)
                        .body(|inv| {
                            let hash = match inv.this {
                                Some(Value::Object(obj)) => Arc::as_ptr(obj) as usize,
                                _ => 0,
                            };
                            Ok(Value::I32(i32::try_from(hash & 0x7fff_ffff).unwrap_or(0)))
                        }),
                )
                .method(
                    MethodBuilder::new("Finalize")
                        .visibility(Visibility::Protected)
                        .with_flags(MethodFlags::VIRTUAL)
                        .body(|_| Ok(Value::Null)),
                ),
        );
        let primitives = [
            ("System.Void", TypeId::VOID),
            ("System.Boolean", TypeId::BOOL),
            ("System.Int32", TypeId::INT32),
            ("System.Int64", TypeId::INT64),
            ("System.Double", TypeId::FLOAT64),
        ];
        debug_assert_eq!(object, TypeId::OBJECT);
        for (name, expected) in primitives {
            let id = self.define(TypeBuilder::structure(name).flags(TypeFlags::SEALED));
            debug_assert_eq!(id, expected);
        }
        let string = self.define(TypeBuilder::class("System.String").flags(TypeFlags::SEALED));
        debug_assert_eq!(string, TypeId::STRING);
        let duck = self.define(
            TypeBuilder::interface("Duck.IDuckType").method(
                MethodBuilder::new("GetInstance")
                    .returns(TypeRef::object())
                    .with_flags(MethodFlags::ABSTRACT | MethodFlags::VIRTUAL),
            ),
        );
        debug_assert_eq!(duck, TypeId::DUCK_TYPE);
        debug_assert_eq!(
            self.ty(TypeId::DUCK_TYPE).methods.first().copied(),
            Some(MethodId::DUCK_GET_INSTANCE)
        );
    }

    // Modules

    pub fn add_module(&self, name: &str, allows_access_waiver: bool) -> ModuleId {
        let mut modules = self.modules.write();
        let id = ModuleId::from_raw(table_index(modules.len()));
        modules.push(ModuleDef {
            name: name.to_string(),
            allows_access_waiver,
        });
        id
    }

    pub fn module(&self, id: ModuleId) -> ModuleDef {
        self.modules.read()[id.index()].clone()
    }

    // Definition

    /// Declare a type without members, so signatures can refer to it before
    /// it is completed.
    pub fn declare(&self, builder: &TypeBuilder) -> TypeId {
        let mut types = self.types.write();
        let id = TypeId::from_raw(table_index(types.len()));
        let def = TypeDef {
            id,
            name: builder.name.clone(),
            namespace: builder.namespace.clone(),
            module: builder.module,
            kind: builder.kind,
            visibility: builder.visibility,
            declaring_type: builder.declaring_type,
            flags: builder.flags,
            generic_params: builder.generic_params.clone(),
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        let full_name = def.full_name();
        types.push(Arc::new(def));
        drop(types);
        self.names.write().entry(full_name).or_insert(id);
        id
    }

    /// Fill in the members of a previously declared type.
    pub fn complete(&self, id: TypeId, builder: TypeBuilder) -> TypeId {
        let is_interface = builder.kind == TypeKind::Interface;
        let method_ids: Vec<MethodId> = {
            let mut methods = self.methods.write();
            builder
                .methods
                .into_iter()
                .map(|m| {
                    let method_id = MethodId::from_raw(table_index(methods.len()));
                    let mut flags = m.flags;
                    if is_interface && !flags.contains(MethodFlags::STATIC) && m.body.is_none() {
                        flags |= MethodFlags::ABSTRACT | MethodFlags::VIRTUAL;
                    }
                    methods.push(Arc::new(MethodDef {
                        id: method_id,
                        name: m.name,
                        declaring: id,
                        visibility: m.visibility,
                        flags,
                        params: m.params,
                        generic_params: m.generic_params,
                        ret: m.ret,
                        overrides: m.overrides,
                        annotations: m.annotations,
                        body: m.body,
                    }));
                    method_id
                })
                .collect()
        };

        let base = match builder.kind {
            TypeKind::Interface => None,
            TypeKind::Class | TypeKind::Struct if id == TypeId::OBJECT => None,
            TypeKind::Class | TypeKind::Struct => builder.base,
        };
        let mut types = self.types.write();
        let mut def = TypeDef::clone(&types[id.index()]);
        def.flags |= builder.flags;
        def.base = base;
        def.interfaces = builder.interfaces;
        def.fields = builder.fields;
        def.methods = method_ids;
        types[id.index()] = Arc::new(def);
        id
    }

    /// Declare and complete in one step.
    pub fn define(&self, builder: TypeBuilder) -> TypeId {
        let id = self.declare(&builder);
        self.complete(id, builder)
    }

    // Lookup

    pub fn ty(&self, id: TypeId) -> Arc<TypeDef> {
        Arc::clone(&self.types.read()[id.index()])
    }

    pub fn method(&self, id: MethodId) -> Arc<MethodDef> {
        Arc::clone(&self.methods.read()[id.index()])
    }

    /// Methods declared directly on `id`.
    pub fn declared_methods(&self, id: TypeId) -> Vec<Arc<MethodDef>> {
        let def = self.ty(id);
        let methods = self.methods.read();
        def.methods
            .iter()
            .map(|m| Arc::clone(&methods[m.index()]))
            .collect()
    }

    /// First method declared directly on `id` with the given name.
    pub fn find_declared(&self, id: TypeId, name: &str) -> Option<MethodId> {
        self.declared_methods(id)
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.id)
    }

    /// Look a type up by name.
    ///
    /// Accepts `Namespace.Name` and `Namespace.Name, Module`.
    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        let (full, module) = match name.split_once(',') {
            Some((full, module)) => (full.trim(), Some(module.trim())),
            None => (name.trim(), None),
        };
        let id = *self.names.read().get(full)?;
        match module {
            Some(module) if self.module(self.ty(id).module).name != module => None,
            _ => Some(id),
        }
    }

    // Type queries

    fn def_of(&self, ty: &TypeRef) -> Option<Arc<TypeDef>> {
        ty.def_id().map(|id| self.ty(id))
    }

    /// Value types never hold null and are never duck chained.
    pub fn is_value_type(&self, ty: &TypeRef) -> bool {
        self.def_of(ty).is_some_and(|def| def.is_value_type())
    }

    pub fn is_interface(&self, ty: &TypeRef) -> bool {
        self.def_of(ty).is_some_and(|def| def.is_interface())
    }

    /// Interfaces and abstract classes.
    pub fn is_abstract(&self, ty: &TypeRef) -> bool {
        self.def_of(ty).is_some_and(|def| def.is_abstract())
    }

    pub fn has_flag(&self, ty: &TypeRef, flag: TypeFlags) -> bool {
        self.def_of(ty).is_some_and(|def| def.flags.contains(flag))
    }

    pub fn module_of(&self, ty: &TypeRef) -> Option<ModuleId> {
        self.def_of(ty).map(|def| def.module)
    }

    /// Check if `id` and every type enclosing it are public.
    pub fn is_type_public(&self, id: TypeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let def = self.ty(id);
            if !def.visibility.is_public() {
                return false;
            }
            current = def.declaring_type;
        }
        true
    }

    /// Check if a type reference, including its generic arguments, names only
    /// public types.
    pub fn is_ref_public(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Def { id, args } => {
                self.is_type_public(*id) && args.iter().all(|arg| self.is_ref_public(arg))
            }
            TypeRef::Param(_) => true,
            TypeRef::ByRef(inner) => self.is_ref_public(inner),
        }
    }

    /// Check if a method is callable by code outside its module.
    pub fn is_public_surface(&self, method: MethodId) -> bool {
        let def = self.method(method);
        def.visibility.is_public() && self.is_type_public(def.declaring)
    }

    // Hierarchy

    /// Base class chain of `ty`, most derived first, starting with `ty`
    /// itself. Generic arguments are substituted along the way.
    pub fn class_chain(&self, ty: &TypeRef) -> SmallVec<[TypeRef; 8]> {
        let mut chain = SmallVec::new();
        let mut current = Some(ty.element().clone());
        while let Some(TypeRef::Def { id, args }) = current {
            let def = self.ty(id);
            current = def.base.as_ref().map(|base| base.substitute(&args, &[]));
            chain.push(TypeRef::Def { id, args });
        }
        chain
    }

    /// Every interface `ty` implements or extends, transitively, with
    /// generic arguments substituted. Does not include `ty` itself.
    pub fn all_interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut stack: Vec<TypeRef> = Vec::new();
        for class in self.class_chain(ty) {
            if let TypeRef::Def { id, args } = &class {
                let def = self.ty(*id);
                stack.extend(def.interfaces.iter().map(|i| i.substitute(args, &[])));
            }
        }
        while let Some(iface) = stack.pop() {
            if !seen.insert(iface.clone()) {
                continue;
            }
            if let TypeRef::Def { id, args } = &iface {
                let def = self.ty(*id);
                stack.extend(def.interfaces.iter().map(|i| i.substitute(args, &[])));
            }
            out.push(iface);
        }
        out
    }

    /// Check if a value of type `from` can be stored in a location of type
    /// `to` without conversion.
    ///
    /// By-ref types are only assignable to themselves. Generic arguments are
    /// invariant.
    pub fn is_assignable(&self, to: &TypeRef, from: &TypeRef) -> bool {
        if to == from {
            return true;
        }
        if to.is_by_ref() || from.is_by_ref() || from.is_generic_param() {
            return false;
        }
        if to.is_object() {
            return true;
        }
        if to.is_generic_param() {
            return false;
        }
        if self.is_interface(to) {
            return self.all_interfaces(from).iter().any(|i| i == to);
        }
        self.class_chain(from).iter().any(|c| c == to)
    }

    /// Check if `value` may be stored in a location of type `ty`.
    pub fn is_instance_of(&self, value: &Value, ty: &TypeRef) -> bool {
        if ty.is_generic_param() {
            return true;
        }
        match value.runtime_type() {
            None => !self.is_value_type(ty),
            Some(runtime) => self.is_assignable(ty, &runtime),
        }
    }

    /// Fail with `InvalidCast` unless `value` fits `ty`.
    pub fn check_cast(&self, value: &Value, ty: &TypeRef) -> Result<(), InvokeError> {
        if self.is_instance_of(value, ty) {
            return Ok(());
        }
        Err(InvokeError::InvalidCast {
            from: value
                .runtime_type()
                .map_or_else(|| "null".to_string(), |rt| self.full_name(&rt)),
            to: self.full_name(ty),
        })
    }
}

fn table_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("type store table exceeded u32::MAX entries"))
}

#[cfg(test)]
mod tests;
