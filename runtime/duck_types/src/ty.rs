//! The recursive type descriptor.
//!
//! `TypeRef` is a plain value: it names a defined type (possibly instantiated
//! with generic arguments), a generic parameter, or a by-reference wrapper.
//! Member matching works over these values, never over live objects, so the
//! matcher can be exercised without running any target code.

use crate::idx::TypeId;

/// Reference to a type as it appears in a signature or on an object.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeRef {
    /// A defined type. `args` is empty for non-generic types.
    Def { id: TypeId, args: Vec<TypeRef> },
    /// A generic parameter of the declaring type or method.
    Param(GenericParam),
    /// Managed by-reference wrapper used by `in`/`out`/`ref` parameters.
    ByRef(Box<TypeRef>),
}

/// Where a generic parameter is declared.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ParamScope {
    Type,
    Method,
}

/// A generic parameter reference.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GenericParam {
    pub scope: ParamScope,
    pub index: u32,
    pub name: String,
}

impl TypeRef {
    /// Non-generic reference to `id`.
    #[inline]
    pub fn of(id: TypeId) -> Self {
        TypeRef::Def {
            id,
            args: Vec::new(),
        }
    }

    /// Generic instantiation of `id`.
    pub fn generic(id: TypeId, args: Vec<TypeRef>) -> Self {
        TypeRef::Def { id, args }
    }

    pub fn by_ref(inner: TypeRef) -> Self {
        TypeRef::ByRef(Box::new(inner))
    }

    pub fn type_param(index: u32, name: impl Into<String>) -> Self {
        TypeRef::Param(GenericParam {
            scope: ParamScope::Type,
            index,
            name: name.into(),
        })
    }

    pub fn method_param(index: u32, name: impl Into<String>) -> Self {
        TypeRef::Param(GenericParam {
            scope: ParamScope::Method,
            index,
            name: name.into(),
        })
    }

    #[inline]
    pub fn object() -> Self {
        Self::of(TypeId::OBJECT)
    }

    #[inline]
    pub fn void() -> Self {
        Self::of(TypeId::VOID)
    }

    /// The defined type this reference names, ignoring generic arguments.
    ///
    /// By-ref wrappers and generic parameters have no definition.
    pub fn def_id(&self) -> Option<TypeId> {
        match self {
            TypeRef::Def { id, .. } => Some(*id),
            TypeRef::Param(_) | TypeRef::ByRef(_) => None,
        }
    }

    #[inline]
    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeRef::ByRef(_))
    }

    /// Strip one by-ref wrapper, if present.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::ByRef(inner) => inner,
            other => other,
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.def_id() == Some(TypeId::VOID)
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, TypeRef::Def { id, args } if *id == TypeId::OBJECT && args.is_empty())
    }

    #[inline]
    pub fn is_generic_param(&self) -> bool {
        matches!(self, TypeRef::Param(_))
    }

    /// Generic arguments of an instantiation; empty otherwise.
    pub fn generic_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Def { args, .. } => args,
            TypeRef::Param(_) | TypeRef::ByRef(_) => &[],
        }
    }

    #[inline]
    pub fn is_generic_instance(&self) -> bool {
        !self.generic_args().is_empty()
    }

    /// Check if any generic parameter (of either scope) occurs in this type.
    pub fn has_params(&self) -> bool {
        match self {
            TypeRef::Def { args, .. } => args.iter().any(TypeRef::has_params),
            TypeRef::Param(_) => true,
            TypeRef::ByRef(inner) => inner.has_params(),
        }
    }

    /// Replace generic parameters with the supplied arguments.
    ///
    /// Parameters without a corresponding argument are left in place.
    #[must_use]
    pub fn substitute(&self, type_args: &[TypeRef], method_args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::Def { id, args } => TypeRef::Def {
                id: *id,
                args: args
                    .iter()
                    .map(|arg| arg.substitute(type_args, method_args))
                    .collect(),
            },
            TypeRef::Param(param) => {
                let source = match param.scope {
                    ParamScope::Type => type_args,
                    ParamScope::Method => method_args,
                };
                source
                    .get(param.index as usize)
                    .cloned()
                    .unwrap_or_else(|| self.clone())
            }
            TypeRef::ByRef(inner) => {
                TypeRef::ByRef(Box::new(inner.substitute(type_args, method_args)))
            }
        }
    }
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        TypeRef::of(id)
    }
}

/// How an argument is passed.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum ParamMode {
    /// Passed by value.
    #[default]
    Value,
    /// Read-only reference.
    In,
    /// Written by the callee before it returns.
    Out,
    /// Read and written by the callee.
    Ref,
}

impl ParamMode {
    #[inline]
    pub const fn is_by_ref(self) -> bool {
        !matches!(self, ParamMode::Value)
    }

    /// Check if the callee writes the argument back.
    #[inline]
    pub const fn writes_back(self) -> bool {
        matches!(self, ParamMode::Out | ParamMode::Ref)
    }
}

#[cfg(test)]
mod tests;
