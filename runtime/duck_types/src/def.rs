//! Metadata records for modules, types and members.

use std::fmt;

use crate::flags::{AnnotationFlags, BindingScope, MethodFlags, TypeFlags};
use crate::idx::{MethodId, ModuleId, TypeId};
use crate::invoke::MethodBody;
use crate::ty::{ParamMode, TypeRef};
use crate::value::Value;

/// A unit of code that types are defined in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDef {
    pub name: String,
    /// Whether generated code may be granted access to this module's
    /// non-public members.
    pub allows_access_waiver: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Visible inside the defining module only.
    Internal,
    /// Visible to derived types.
    Protected,
    Private,
}

impl Visibility {
    #[inline]
    pub const fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeKind {
    Class,
    Interface,
    /// A value type: copied on assignment, never null.
    Struct,
}

/// A defined type.
#[derive(Clone, Debug)]
pub struct TypeDef {
    pub id: TypeId,
    pub name: String,
    pub namespace: String,
    pub module: ModuleId,
    pub kind: TypeKind,
    pub visibility: Visibility,
    /// Enclosing type for nested types.
    pub declaring_type: Option<TypeId>,
    pub flags: TypeFlags,
    pub generic_params: Vec<String>,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodId>,
}

impl TypeDef {
    /// `Namespace.Name`, or just `Name` outside any namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    #[inline]
    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Struct
    }

    /// Abstract classes and interfaces.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.flags.contains(TypeFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
    }

    #[inline]
    pub fn is_generic_definition(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
}

/// A method parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDef {
    pub name: String,
    /// Declared type; a `TypeRef::ByRef` for `in`/`out`/`ref` parameters.
    pub ty: TypeRef,
    pub mode: ParamMode,
    pub optional: bool,
    /// Value supplied when an optional parameter is omitted.
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParamDef {
            name: name.into(),
            ty,
            mode: ParamMode::Value,
            optional: false,
            default: None,
        }
    }
}

/// Attribute-like binding hints attached to a contract member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Bind to a target member with this name instead of the declared one.
    pub name: Option<String>,
    /// Restricts exact-signature lookups.
    pub binding_scope: Option<BindingScope>,
    /// Target parameter types by name, for disambiguation.
    pub parameter_type_names: Option<Vec<String>>,
    /// Interface whose explicit implementation should be bound; `*` accepts
    /// any qualifier.
    pub explicit_interface: Option<String>,
    /// Generic arguments to close a generic target member with when the
    /// contract member is not generic.
    pub generic_parameter_type_names: Option<Vec<String>>,
    pub flags: AnnotationFlags,
}

impl Annotations {
    #[inline]
    pub fn ignore(&self) -> bool {
        self.flags.contains(AnnotationFlags::IGNORE)
    }

    #[inline]
    pub fn include(&self) -> bool {
        self.flags.contains(AnnotationFlags::INCLUDE)
    }

    #[inline]
    pub fn reverse(&self) -> bool {
        self.flags.contains(AnnotationFlags::REVERSE)
    }
}

/// A method definition.
#[derive(Clone)]
pub struct MethodDef {
    pub id: MethodId,
    pub name: String,
    pub declaring: TypeId,
    pub visibility: Visibility,
    pub flags: MethodFlags,
    pub params: Vec<ParamDef>,
    pub generic_params: Vec<String>,
    pub ret: TypeRef,
    /// Base or interface member this method explicitly overrides.
    pub overrides: Option<MethodId>,
    pub annotations: Annotations,
    /// Native implementation; `None` for abstract members.
    pub body: Option<MethodBody>,
}

impl MethodDef {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.flags
            .intersects(MethodFlags::VIRTUAL.union(MethodFlags::ABSTRACT))
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Effective binding name: the annotation override or the declared name.
    pub fn binding_name(&self) -> &str {
        self.annotations.name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("visibility", &self.visibility)
            .field("flags", &self.flags)
            .field("params", &self.params)
            .field("generic_params", &self.generic_params)
            .field("ret", &self.ret)
            .field("overrides", &self.overrides)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}
