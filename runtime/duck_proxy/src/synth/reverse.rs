//! Reverse proxies: the proxy derives from a base type and its overrides
//! call reverse-marked methods of an implementation instance.

use duck_types::{MethodId, TypeBuilder, TypeId, TypeRef, TypeStore};
use rustc_hash::FxHashSet;
use tracing::debug;

use super::{get_instance_method, override_method, Shape};
use crate::binding::{Binding, BindingSet, GenericBinding, OutputRefSlot};
use crate::collect::{override_candidates, reverse_members};
use crate::context::GenerationContext;
use crate::convert::{plan, Crossing};
use crate::descriptor::{ContractMemberDescriptor, ProxyMode, TargetMemberCandidate};
use crate::dispatch::{DispatchStrategy, WaiverRegistry};
use crate::error::DuckError;
use crate::resolve::{check_signature, resolve_member};

#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(base = %store.full_name(base), implementation = %store.full_name(implementation))
)]
pub(super) fn bind(
    store: &TypeStore,
    waivers: &WaiverRegistry,
    base: &TypeRef,
    implementation: &TypeRef,
) -> Result<BindingSet, DuckError> {
    let candidates = override_candidates(store, base)?;
    let members = reverse_members(store, implementation)?;
    let mut must_implement: FxHashSet<MethodId> = candidates
        .iter()
        .filter(|c| c.is_abstract)
        .map(|c| c.method)
        .collect();

    // The implementation is called from code this context generates.
    if let Some(module) = store.module_of(implementation) {
        waivers.adopt(module);
    }

    let mut bindings = Vec::with_capacity(members.len());
    for member in members {
        let candidate = resolve_member(store, &member, &candidates, ProxyMode::Reverse, base)?;
        let generics = check_signature(store, &member, candidate, ProxyMode::Reverse)?;
        must_implement.remove(&candidate.method);
        debug!(member = %member.name, overrides = %candidate.display(store), "bound");
        bindings.push(binding(store, member, candidate.clone(), generics));
    }

    if !must_implement.is_empty() {
        let members = candidates
            .iter()
            .filter(|c| must_implement.contains(&c.method))
            .map(|c| c.name.clone())
            .collect();
        return Err(DuckError::ReverseMissingImplementation {
            base: store.full_name(base),
            members,
        });
    }

    Ok(BindingSet {
        mode: ProxyMode::Reverse,
        contract: base.clone(),
        target: implementation.clone(),
        bindings,
    })
}

fn binding(
    store: &TypeStore,
    member: ContractMemberDescriptor,
    candidate: TargetMemberCandidate,
    generics: GenericBinding,
) -> Binding {
    let args = member
        .params
        .iter()
        .zip(&candidate.params)
        .map(|(mine, theirs)| plan(store, &mine.ty, &theirs.ty, Crossing::OutOfTarget))
        .collect();
    let ret = plan(store, &member.ret, &candidate.ret, Crossing::IntoTarget);
    let out_slots = member
        .params
        .iter()
        .zip(&candidate.params)
        .enumerate()
        .filter(|(_, (mine, _))| mine.mode.writes_back())
        .map(|(index, (mine, theirs))| OutputRefSlot {
            index,
            mode: mine.mode,
            target_type: mine.ty.element().clone(),
            read_back: plan(store, &mine.ty, &theirs.ty, Crossing::IntoTarget),
        })
        .collect();

    Binding {
        overrides: candidate.method,
        calls: member.method,
        calls_static: false,
        args,
        trailing: Vec::new(),
        ret,
        out_slots,
        generics,
        dispatch: DispatchStrategy::Direct,
        member,
        candidate,
    }
}

pub(super) fn define(ctx: &GenerationContext, set: &BindingSet) -> TypeRef {
    let store = ctx.store();
    let name = ctx.proxy_name(&set.contract, &set.target, "Reverse");
    let mut builder = TypeBuilder::class(&name).module(ctx.module());
    builder = if store.is_interface(&set.contract) {
        builder.implements(set.contract.clone())
    } else {
        builder.base(set.contract.clone())
    };
    builder = builder
        .implements(TypeRef::of(TypeId::DUCK_TYPE))
        .method(get_instance_method());
    for binding in &set.bindings {
        let candidate = &binding.candidate;
        builder = builder.method(override_method(
            ctx,
            binding,
            Shape {
                name: &candidate.name,
                params: &candidate.params,
                generic_params: &candidate.generic_params,
                ret: &candidate.ret,
                visibility: candidate.visibility,
            },
        ));
    }
    let proxy = TypeRef::of(store.define(builder));
    debug!(proxy = %store.full_name(&proxy), overrides = set.bindings.len(), "reverse proxy defined");
    proxy
}
