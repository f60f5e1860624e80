//! Builders for defining types at run time.
//!
//! ```text
//! let thing = store.define(
//!     TypeBuilder::class("Acme.Internal.Thing")
//!         .module(acme)
//!         .visibility(Visibility::Internal)
//!         .method(MethodBuilder::new("Get").returns(TypeId::INT32.into()).body(|_| Ok(Value::I32(1)))),
//! );
//! ```

use std::sync::Arc;

use crate::def::{Annotations, FieldDef, ParamDef, TypeKind, Visibility};
use crate::flags::{MethodFlags, TypeFlags};
use crate::idx::{MethodId, ModuleId, TypeId};
use crate::invoke::{InvokeResult, Invocation, MethodBody};
use crate::ty::{ParamMode, TypeRef};
use crate::value::Value;

/// Describes a type to be declared or defined in a [`TypeStore`](crate::TypeStore).
#[derive(Clone, Debug)]
pub struct TypeBuilder {
    pub(crate) name: String,
    pub(crate) namespace: String,
    pub(crate) module: ModuleId,
    pub(crate) kind: TypeKind,
    pub(crate) visibility: Visibility,
    pub(crate) declaring_type: Option<TypeId>,
    pub(crate) flags: TypeFlags,
    pub(crate) generic_params: Vec<String>,
    pub(crate) base: Option<TypeRef>,
    pub(crate) interfaces: Vec<TypeRef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) methods: Vec<MethodBuilder>,
}

impl TypeBuilder {
    fn new(full_name: &str, kind: TypeKind) -> Self {
        let (namespace, name) = match full_name.rsplit_once('.') {
            Some((ns, name)) => (ns.to_string(), name.to_string()),
            None => (String::new(), full_name.to_string()),
        };
        TypeBuilder {
            name,
            namespace,
            module: ModuleId::CORE,
            kind,
            visibility: Visibility::Public,
            declaring_type: None,
            flags: TypeFlags::empty(),
            generic_params: Vec::new(),
            base: match kind {
                TypeKind::Class | TypeKind::Struct => Some(TypeRef::object()),
                TypeKind::Interface => None,
            },
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn class(full_name: &str) -> Self {
        Self::new(full_name, TypeKind::Class)
    }

    pub fn interface(full_name: &str) -> Self {
        Self::new(full_name, TypeKind::Interface)
    }

    pub fn structure(full_name: &str) -> Self {
        Self::new(full_name, TypeKind::Struct)
    }

    #[must_use]
    pub fn module(mut self, module: ModuleId) -> Self {
        self.module = module;
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn nested_in(mut self, outer: TypeId) -> Self {
        self.declaring_type = Some(outer);
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn generic_params(mut self, names: &[&str]) -> Self {
        self.generic_params = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    #[must_use]
    pub fn base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn field(mut self, name: &str, ty: TypeRef) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }
}

/// Describes a method of a [`TypeBuilder`].
#[derive(Clone)]
pub struct MethodBuilder {
    pub(crate) name: String,
    pub(crate) visibility: Visibility,
    pub(crate) flags: MethodFlags,
    pub(crate) params: Vec<ParamDef>,
    pub(crate) generic_params: Vec<String>,
    pub(crate) ret: TypeRef,
    pub(crate) overrides: Option<MethodId>,
    pub(crate) annotations: Annotations,
    pub(crate) body: Option<MethodBody>,
}

impl std::fmt::Debug for MethodBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodBuilder")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

impl MethodBuilder {
    /// A public instance method returning void.
    pub fn new(name: &str) -> Self {
        MethodBuilder {
            name: name.to_string(),
            visibility: Visibility::Public,
            flags: MethodFlags::empty(),
            params: Vec::new(),
            generic_params: Vec::new(),
            ret: TypeRef::void(),
            overrides: None,
            annotations: Annotations::default(),
            body: None,
        }
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.ret = ty;
        self
    }

    #[must_use]
    pub fn param(mut self, name: &str, ty: TypeRef) -> Self {
        self.params.push(ParamDef::new(name, ty));
        self
    }

    /// A by-reference parameter; `ty` is the element type.
    #[must_use]
    pub fn by_ref_param(mut self, name: &str, ty: TypeRef, mode: ParamMode) -> Self {
        let mut param = ParamDef::new(name, TypeRef::by_ref(ty));
        param.mode = mode;
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn optional_param(mut self, name: &str, ty: TypeRef, default: Value) -> Self {
        let mut param = ParamDef::new(name, ty);
        param.optional = true;
        param.default = Some(default);
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn param_def(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn generic_params(mut self, names: &[&str]) -> Self {
        self.generic_params = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn overrides(mut self, method: MethodId) -> Self {
        self.overrides = Some(method);
        self
    }

    #[must_use]
    pub fn annotate(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(Invocation<'_>) -> InvokeResult + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    #[must_use]
    pub fn body_arc(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }
}
