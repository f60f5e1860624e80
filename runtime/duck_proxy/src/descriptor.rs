//! The two sides of a binding: what the contract asks for and what the
//! target offers.

use std::fmt;

use duck_types::{
    AnnotationFlags, BindingScope, MethodDef, MethodId, ParamDef, TypeId, TypeRef, TypeStore,
    Visibility,
};

/// Direction and receiver kind of an adapter.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ProxyMode {
    /// Contract members forward to instance members of the target.
    Forward,
    /// Contract members forward to static members of the target type.
    Static,
    /// Reverse-marked members of an implementation type override members
    /// of a base type.
    Reverse,
}

impl ProxyMode {
    #[inline]
    pub fn is_reverse(self) -> bool {
        self == ProxyMode::Reverse
    }
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProxyMode::Forward => "forward",
            ProxyMode::Static => "static",
            ProxyMode::Reverse => "reverse",
        })
    }
}

/// One member of the shape the caller wants.
///
/// Built once from a contract (or reverse implementation) method; generic
/// arguments of the declaring type are already substituted.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractMemberDescriptor {
    pub method: MethodId,
    pub declaring: TypeId,
    pub name: String,
    /// Bind to a target member with this name instead.
    pub target_name: Option<String>,
    pub binding_scope: Option<BindingScope>,
    pub parameter_type_names: Option<Vec<String>>,
    /// Interface qualifier of the target member name; `*` accepts any.
    pub explicit_interface: Option<String>,
    pub generic_parameter_type_names: Option<Vec<String>>,
    pub flags: AnnotationFlags,
    pub params: Vec<ParamDef>,
    pub generic_params: Vec<String>,
    pub ret: TypeRef,
    pub is_abstract: bool,
}

/// Wildcard accepted by `explicit_interface`.
pub const ANY_INTERFACE: &str = "*";

impl ContractMemberDescriptor {
    /// Describe `def` as seen through a declaring type instantiated with
    /// `type_args`.
    pub fn from_method(def: &MethodDef, type_args: &[TypeRef]) -> Self {
        let ann = &def.annotations;
        ContractMemberDescriptor {
            method: def.id,
            declaring: def.declaring,
            name: def.name.clone(),
            target_name: ann.name.clone(),
            binding_scope: ann.binding_scope,
            parameter_type_names: ann.parameter_type_names.clone(),
            explicit_interface: ann.explicit_interface.clone(),
            generic_parameter_type_names: ann.generic_parameter_type_names.clone(),
            flags: ann.flags,
            params: substitute_params(&def.params, type_args),
            generic_params: def.generic_params.clone(),
            ret: def.ret.substitute(type_args, &[]),
            is_abstract: def.is_abstract(),
        }
    }

    /// Name a target member must carry, before any interface qualifier.
    pub fn expected_name(&self) -> &str {
        self.target_name.as_deref().unwrap_or(&self.name)
    }

    /// Check if `candidate` carries the expected (possibly qualified) name.
    pub fn name_matches(&self, candidate: &str) -> bool {
        let expected = self.expected_name();
        match self.explicit_interface.as_deref() {
            None => candidate == expected,
            Some(ANY_INTERFACE) => {
                candidate == expected
                    || candidate
                        .strip_suffix(expected)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            Some(iface) => candidate
                .strip_prefix(iface)
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|rest| rest == expected),
        }
    }

    #[inline]
    pub fn is_ignored(&self) -> bool {
        self.flags.contains(AnnotationFlags::IGNORE)
    }

    #[inline]
    pub fn must_include(&self) -> bool {
        self.flags.contains(AnnotationFlags::INCLUDE)
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.flags.contains(AnnotationFlags::REVERSE)
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Signature string used for deduplication.
    pub fn signature(&self, store: &TypeStore) -> String {
        store.format_signature(&self.ret, &self.name, self.generic_params.len(), &self.params)
    }

    /// `Type.Name(Params)` for diagnostics.
    pub fn display(&self, store: &TypeStore) -> String {
        store.display_method(self.method)
    }
}

/// One member of the target type, enumerated fresh for every resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetMemberCandidate {
    pub method: MethodId,
    pub name: String,
    pub declaring: TypeId,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub params: Vec<ParamDef>,
    pub generic_params: Vec<String>,
    pub ret: TypeRef,
}

impl TargetMemberCandidate {
    pub fn from_method(def: &MethodDef, type_args: &[TypeRef]) -> Self {
        TargetMemberCandidate {
            method: def.id,
            name: def.name.clone(),
            declaring: def.declaring,
            visibility: def.visibility,
            is_static: def.is_static(),
            is_abstract: def.is_abstract(),
            params: substitute_params(&def.params, type_args),
            generic_params: def.generic_params.clone(),
            ret: def.ret.substitute(type_args, &[]),
        }
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn signature(&self, store: &TypeStore) -> String {
        store.format_signature(&self.ret, &self.name, self.generic_params.len(), &self.params)
    }

    pub fn display(&self, store: &TypeStore) -> String {
        store.display_method(self.method)
    }
}

fn substitute_params(params: &[ParamDef], type_args: &[TypeRef]) -> Vec<ParamDef> {
    params
        .iter()
        .map(|p| ParamDef {
            ty: p.ty.substitute(type_args, &[]),
            ..p.clone()
        })
        .collect()
}
