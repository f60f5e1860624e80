//! Member candidate collection.
//!
//! Enumerates the methods a contract, reverse implementation, reverse base
//! or target type exposes for binding. Deduplication is by signature string,
//! first occurrence wins, and types are visited most derived first.

use std::sync::Arc;

use duck_types::{MethodFlags, TypeDef, TypeId, TypeKind, TypeRef, TypeStore, Visibility};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::descriptor::{ContractMemberDescriptor, TargetMemberCandidate};
use crate::error::DuckError;

/// Members of a forward contract.
///
/// Interface contracts contribute every member of the interface and the
/// interfaces it extends, except those of the root capability marker.
/// Class contracts contribute overridable instance members; members
/// declared on the object base are skipped unless marked must-include.
pub fn contract_members(
    store: &TypeStore,
    contract: &TypeRef,
) -> Result<Vec<ContractMemberDescriptor>, DuckError> {
    let def = contract_def(store, contract)?;
    let members = match def.kind {
        TypeKind::Interface => interface_members(store, contract),
        TypeKind::Class if def.is_sealed() => {
            return Err(invalid(store, contract, "sealed classes cannot be derived from"))
        }
        TypeKind::Class => class_members(store, contract),
        TypeKind::Struct => return Err(invalid(store, contract, "value types cannot be proxied")),
    };
    if let Some(reverse) = members.iter().find(|m| m.is_reverse()) {
        return Err(DuckError::IncorrectReverseMethodUsage {
            member: reverse.display(store),
            reason: "reverse members cannot appear on a forward contract".to_string(),
        });
    }
    Ok(members)
}

fn interface_members(store: &TypeStore, contract: &TypeRef) -> Vec<ContractMemberDescriptor> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    let interfaces = std::iter::once(contract.clone()).chain(store.all_interfaces(contract));
    for iface in interfaces {
        let Some(id) = iface.def_id() else { continue };
        if id == TypeId::DUCK_TYPE {
            continue;
        }
        for method in store.declared_methods(id) {
            if method.is_static() {
                continue;
            }
            let desc = ContractMemberDescriptor::from_method(&method, iface.generic_args());
            if !seen.insert(desc.signature(store)) {
                trace!(member = %desc.display(store), "already collected");
                continue;
            }
            // Ignored members stay in `seen` so they also hide duplicates
            // inherited from other interfaces.
            if desc.is_ignored() {
                continue;
            }
            out.push(desc);
        }
    }
    out
}

fn class_members(store: &TypeStore, contract: &TypeRef) -> Vec<ContractMemberDescriptor> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for class in store.class_chain(contract) {
        let Some(id) = class.def_id() else { continue };
        for method in store.declared_methods(id) {
            if method.is_static() {
                continue;
            }
            let desc = ContractMemberDescriptor::from_method(&method, class.generic_args());
            if !seen.insert(desc.signature(store)) || desc.is_ignored() {
                continue;
            }
            if !is_overridable(method.flags, method.visibility) {
                continue;
            }
            if id == TypeId::OBJECT && !desc.must_include() {
                continue;
            }
            out.push(desc);
        }
    }
    out
}

/// Reverse-marked instance members declared directly on `implementation`.
pub fn reverse_members(
    store: &TypeStore,
    implementation: &TypeRef,
) -> Result<Vec<ContractMemberDescriptor>, DuckError> {
    let Some(id) = implementation.def_id() else {
        return Err(invalid(store, implementation, "not a defined type"));
    };
    Ok(store
        .declared_methods(id)
        .iter()
        .filter(|m| !m.is_static() && m.annotations.reverse() && !m.annotations.ignore())
        .map(|m| ContractMemberDescriptor::from_method(m, implementation.generic_args()))
        .collect())
}

/// Members of a reverse base that a proxy may override.
pub fn override_candidates(
    store: &TypeStore,
    base: &TypeRef,
) -> Result<Vec<TargetMemberCandidate>, DuckError> {
    let def = contract_def(store, base)?;
    if def.is_value_type() {
        return Err(invalid(store, base, "value types cannot be derived from"));
    }
    if def.is_sealed() {
        return Err(invalid(store, base, "sealed classes cannot be derived from"));
    }
    let types: Vec<TypeRef> = if def.is_interface() {
        std::iter::once(base.clone())
            .chain(store.all_interfaces(base))
            .filter(|i| i.def_id() != Some(TypeId::DUCK_TYPE))
            .collect()
    } else {
        store.class_chain(base).into_vec()
    };

    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for ty in types {
        let Some(id) = ty.def_id() else { continue };
        for method in store.declared_methods(id) {
            if method.is_static() {
                continue;
            }
            let candidate = TargetMemberCandidate::from_method(&method, ty.generic_args());
            if !seen.insert(candidate.signature(store)) {
                continue;
            }
            if is_overridable(method.flags, method.visibility) {
                out.push(candidate);
            }
        }
    }
    Ok(out)
}

/// Every method a target type offers: all members it declares plus the
/// non-private members it inherits. A derived member hides an inherited
/// one with the same signature.
pub fn target_candidates(store: &TypeStore, target: &TypeRef) -> Vec<TargetMemberCandidate> {
    let types: Vec<TypeRef> = if store.is_interface(target) {
        std::iter::once(target.clone())
            .chain(store.all_interfaces(target))
            .collect()
    } else {
        store.class_chain(target).into_vec()
    };

    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for (depth, ty) in types.iter().enumerate() {
        let Some(id) = ty.def_id() else { continue };
        for method in store.declared_methods(id) {
            if depth > 0 && method.visibility == Visibility::Private {
                continue;
            }
            let candidate = TargetMemberCandidate::from_method(&method, ty.generic_args());
            if seen.insert(candidate.signature(store)) {
                out.push(candidate);
            }
        }
    }
    out
}

fn is_overridable(flags: MethodFlags, visibility: Visibility) -> bool {
    flags.is_overridable()
        && !flags.contains(MethodFlags::SPECIAL_NAME)
        && visibility != Visibility::Private
}

fn contract_def(
    store: &TypeStore,
    contract: &TypeRef,
) -> Result<Arc<TypeDef>, DuckError> {
    match contract {
        TypeRef::Def { id, .. } => Ok(store.ty(*id)),
        TypeRef::Param(_) | TypeRef::ByRef(_) => {
            Err(invalid(store, contract, "not a defined type"))
        }
    }
}

fn invalid(store: &TypeStore, contract: &TypeRef, reason: &str) -> DuckError {
    DuckError::InvalidContract {
        contract: store.full_name(contract),
        reason: reason.to_string(),
    }
}
