//! Target method resolution.
//!
//! Matches one contract member to exactly one target candidate. Tried in
//! order, first success wins:
//!
//! 1. exact name and parameter types from the member's explicit
//!    parameter-type names, when all of them resolve;
//! 2. otherwise exact name and the member's own declared parameter types;
//! 3. a structural scan of every candidate with the expected name.
//!
//! The structural pass lets members declared with interfaces, abstract
//! bases or the object type line up with the target's concrete (possibly
//! inaccessible) types.

use std::borrow::Cow;

use duck_types::{BindingScope, ParamDef, TypeRef, TypeStore};
use tracing::{debug, trace};

use crate::binding::GenericBinding;
use crate::descriptor::{ContractMemberDescriptor, ProxyMode, TargetMemberCandidate};
use crate::error::DuckError;

/// Resolve `member` against `candidates` of `target`.
#[tracing::instrument(level = "trace", skip_all, fields(member = %member.name))]
pub fn resolve_member<'a>(
    store: &TypeStore,
    member: &ContractMemberDescriptor,
    candidates: &'a [TargetMemberCandidate],
    mode: ProxyMode,
    target: &TypeRef,
) -> Result<&'a TargetMemberCandidate, DuckError> {
    let explicit = member.parameter_type_names.as_deref();
    if let Some(names) = explicit {
        if mode.is_reverse() && names.len() != member.params.len() {
            return Err(DuckError::ReverseAttributeParameterCountMismatch {
                member: member.display(store),
                expected: member.params.len(),
                found: names.len(),
            });
        }
        if names.len() < member.params.len() {
            return Err(DuckError::SignatureMismatch {
                member: member.display(store),
                candidate: store.full_name(target),
                reason: format!(
                    "{} parameter type names for {} parameters",
                    names.len(),
                    member.params.len()
                ),
            });
        }
    }

    let scope = member.binding_scope.unwrap_or(BindingScope::ALL);
    let fixed = fixed_generic_args(store, member)?;
    let named: Vec<(&TargetMemberCandidate, Cow<'_, TargetMemberCandidate>)> = candidates
        .iter()
        .filter(|c| member.name_matches(&c.name) && in_scope(scope, mode, c))
        .map(|c| (c, close(c, fixed.as_deref())))
        .collect();

    let resolved: Option<Vec<TypeRef>> = explicit.and_then(|names| {
        names
            .iter()
            .map(|name| store.lookup_type(name).map(TypeRef::of))
            .collect()
    });
    let exact: Vec<&TargetMemberCandidate> = match &resolved {
        Some(types) => named
            .iter()
            .filter(|(_, c)| {
                c.params.len() == types.len()
                    && c.params.iter().zip(types).all(|(p, ty)| p.ty.element() == ty)
                    && modes_agree(member, c)
                    && trailing_optional(member, c)
            })
            .map(|(original, _)| *original)
            .collect(),
        None => named
            .iter()
            .filter(|(_, c)| {
                c.params.len() == member.params.len()
                    && c.params
                        .iter()
                        .zip(&member.params)
                        .all(|(p, q)| p.mode == q.mode && p.ty == q.ty)
            })
            .map(|(original, _)| *original)
            .collect(),
    };
    if let [only] = exact.as_slice() {
        debug!(candidate = %only.display(store), "exact match");
        return Ok(only);
    }

    let survivors: Vec<&TargetMemberCandidate> = named
        .iter()
        .filter(|(_, c)| structural_match(store, member, c, explicit, mode))
        .map(|(original, _)| *original)
        .collect();
    match survivors.as_slice() {
        [] => Err(DuckError::MemberNotFound {
            member: member.display(store),
            target: store.full_name(target),
        }),
        [only] => {
            debug!(candidate = %only.display(store), "structural match");
            Ok(only)
        }
        many => Err(DuckError::AmbiguousMatch {
            member: member.display(store),
            target: store.full_name(target),
            candidates: many.iter().map(|c| c.display(store)).collect(),
        }),
    }
}

/// Generic arguments a non-generic member supplies for a generic target.
fn fixed_generic_args(
    store: &TypeStore,
    member: &ContractMemberDescriptor,
) -> Result<Option<Vec<TypeRef>>, DuckError> {
    let Some(names) = member.generic_parameter_type_names.as_deref() else {
        return Ok(None);
    };
    if member.is_generic() {
        return Ok(None);
    }
    names
        .iter()
        .map(|name| {
            store
                .lookup_type(name)
                .map(TypeRef::of)
                .ok_or_else(|| DuckError::TypeNotFound {
                    name: name.clone(),
                    member: member.display(store),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// View of `candidate` with its method generic parameters replaced by
/// `fixed`, when the arities agree.
fn close<'a>(
    candidate: &'a TargetMemberCandidate,
    fixed: Option<&[TypeRef]>,
) -> Cow<'a, TargetMemberCandidate> {
    match fixed {
        Some(args) if candidate.generic_params.len() == args.len() && !args.is_empty() => {
            Cow::Owned(TargetMemberCandidate {
                params: candidate
                    .params
                    .iter()
                    .map(|p| ParamDef {
                        ty: p.ty.substitute(&[], args),
                        ..p.clone()
                    })
                    .collect(),
                ret: candidate.ret.substitute(&[], args),
                ..candidate.clone()
            })
        }
        _ => Cow::Borrowed(candidate),
    }
}

/// In, out and ref must agree for every parameter the member declares.
fn modes_agree(member: &ContractMemberDescriptor, candidate: &TargetMemberCandidate) -> bool {
    member.params.len() <= candidate.params.len()
        && member
            .params
            .iter()
            .zip(&candidate.params)
            .all(|(mine, theirs)| {
                mine.mode == theirs.mode && mine.ty.is_by_ref() == theirs.ty.is_by_ref()
            })
}

/// Candidate parameters past the member's own must all be optional.
fn trailing_optional(member: &ContractMemberDescriptor, candidate: &TargetMemberCandidate) -> bool {
    candidate
        .params
        .get(member.params.len()..)
        .is_some_and(|rest| rest.iter().all(|p| p.optional))
}

fn in_scope(scope: BindingScope, mode: ProxyMode, candidate: &TargetMemberCandidate) -> bool {
    let kind = if candidate.is_static {
        BindingScope::STATIC
    } else {
        BindingScope::INSTANCE
    };
    let access = if candidate.visibility.is_public() {
        BindingScope::PUBLIC
    } else {
        BindingScope::NON_PUBLIC
    };
    let wants_static = mode == ProxyMode::Static;
    scope.contains(kind | access) && candidate.is_static == wants_static
}

fn structural_match(
    store: &TypeStore,
    member: &ContractMemberDescriptor,
    candidate: &TargetMemberCandidate,
    explicit: Option<&[String]>,
    mode: ProxyMode,
) -> bool {
    if let Some(names) = explicit {
        let ok = candidate.params.len() == names.len()
            && candidate
                .params
                .iter()
                .zip(names)
                .all(|(p, name)| type_name_matches(store, p.ty.element(), name))
            && modes_agree(member, candidate)
            && trailing_optional(member, candidate);
        if !ok {
            trace!(candidate = %candidate.display(store), "parameter type names differ");
        }
        return ok;
    }

    let declared = member.params.len();
    let offered = candidate.params.len();
    if (mode.is_reverse() && declared != offered) || declared > offered {
        trace!(candidate = %candidate.display(store), declared, offered, "parameter count");
        return false;
    }
    for (mine, theirs) in member.params.iter().zip(&candidate.params) {
        if mine.mode != theirs.mode || mine.ty.is_by_ref() != theirs.ty.is_by_ref() {
            trace!(candidate = %candidate.display(store), param = %theirs.name, "by-ref shape");
            return false;
        }
        if !param_compatible(store, mine.ty.element(), theirs.ty.element(), mode, true) {
            trace!(candidate = %candidate.display(store), param = %theirs.name, "parameter type");
            return false;
        }
    }
    let ok = trailing_optional(member, candidate);
    if !ok {
        trace!(candidate = %candidate.display(store), "required trailing parameter");
    }
    ok
}

/// Parameter compatibility between a contract-side type and a
/// candidate-side type.
///
/// Value types must match exactly. Concrete reference types must be
/// assignable in the direction values flow; failing that, two
/// instantiations of the same generic type are compared argument by
/// argument, one level deep. Interfaces, abstract types, the object type
/// and generic parameters accept anything and are left to conversion.
fn param_compatible(
    store: &TypeStore,
    contract: &TypeRef,
    candidate: &TypeRef,
    mode: ProxyMode,
    recurse: bool,
) -> bool {
    if contract == candidate {
        return true;
    }
    if contract.is_by_ref() != candidate.is_by_ref() {
        return false;
    }
    let (contract, candidate) = (contract.element(), candidate.element());
    if store.is_value_type(contract) {
        return false;
    }
    if contract.is_generic_param() || contract.is_object() || store.is_abstract(contract) {
        return true;
    }
    let assignable = if mode.is_reverse() {
        store.is_assignable(contract, candidate)
    } else {
        store.is_assignable(candidate, contract)
    };
    if assignable {
        return true;
    }
    recurse
        && contract.is_generic_instance()
        && contract.def_id() == candidate.def_id()
        && contract.generic_args().len() == candidate.generic_args().len()
        && contract
            .generic_args()
            .iter()
            .zip(candidate.generic_args())
            .all(|(a, b)| param_compatible(store, a, b, mode, false))
}

fn type_name_matches(store: &TypeStore, ty: &TypeRef, name: &str) -> bool {
    store.full_name(ty) == name || store.short_name(ty) == name || store.qualified_name(ty) == name
}

/// Check a chosen pairing for return and generic compatibility, and decide
/// where the target's generic arguments come from.
pub(crate) fn check_signature(
    store: &TypeStore,
    member: &ContractMemberDescriptor,
    candidate: &TargetMemberCandidate,
    mode: ProxyMode,
) -> Result<GenericBinding, DuckError> {
    if member.ret.is_void() != candidate.ret.is_void() {
        return Err(DuckError::ReturnTypeMismatch {
            member: member.display(store),
            candidate: candidate.display(store),
        });
    }
    let mismatch = |reason: &str| DuckError::SignatureMismatch {
        member: member.display(store),
        candidate: candidate.display(store),
        reason: reason.to_string(),
    };
    let (mine, theirs) = (member.generic_params.len(), candidate.generic_params.len());
    match (mine, theirs) {
        (0, 0) => Ok(GenericBinding::None),
        _ if mode.is_reverse() && theirs > 0 && mine != theirs => {
            Err(DuckError::ReverseGenericArityMismatch {
                member: member.display(store),
                candidate: candidate.display(store),
                expected: theirs,
                found: mine,
            })
        }
        (0, _) => {
            let Some(names) = &member.generic_parameter_type_names else {
                return Err(mismatch(
                    "target member is generic; generic parameter type names are required",
                ));
            };
            if names.len() != theirs {
                return Err(mismatch("generic parameter type name count differs"));
            }
            let types = names
                .iter()
                .map(|name| {
                    store
                        .lookup_type(name)
                        .map(TypeRef::of)
                        .ok_or_else(|| DuckError::TypeNotFound {
                            name: name.clone(),
                            member: member.display(store),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GenericBinding::Fixed(types))
        }
        (_, 0) => Err(mismatch("contract member is generic but the target member is not")),
        _ if mine == theirs => Ok(GenericBinding::PassThrough),
        _ => Err(mismatch("generic arity differs")),
    }
}
