//! Forward proxies: the proxy implements the contract and calls the target.

use duck_types::{TypeBuilder, TypeId, TypeRef, TypeStore};
use tracing::debug;

use super::{get_instance_method, override_method, Shape};
use crate::binding::{Binding, BindingSet, GenericBinding, OutputRefSlot};
use crate::collect::{contract_members, target_candidates};
use crate::context::GenerationContext;
use crate::convert::{plan, Crossing};
use crate::descriptor::{ContractMemberDescriptor, ProxyMode, TargetMemberCandidate};
use crate::dispatch::{select_strategy, DispatchStrategy, GrantAccess};
use crate::error::DuckError;
use crate::resolve::{check_signature, resolve_member};

#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(contract = %store.full_name(contract), target = %store.full_name(target), %mode)
)]
pub(super) fn bind(
    store: &TypeStore,
    access: &dyn GrantAccess,
    contract: &TypeRef,
    target: &TypeRef,
    mode: ProxyMode,
) -> Result<BindingSet, DuckError> {
    let members = contract_members(store, contract)?;
    let candidates = target_candidates(store, target);
    let bindings = members
        .into_iter()
        .map(|member| {
            let candidate = resolve_member(store, &member, &candidates, mode, target)?;
            let generics = check_signature(store, &member, candidate, mode)?;
            let dispatch = select_strategy(store, access, candidate)?;
            debug!(
                member = %member.name,
                candidate = %candidate.display(store),
                direct = dispatch.is_direct(),
                "bound"
            );
            Ok(binding(store, member, candidate.clone(), generics, dispatch))
        })
        .collect::<Result<Vec<_>, DuckError>>()?;
    Ok(BindingSet {
        mode,
        contract: contract.clone(),
        target: target.clone(),
        bindings,
    })
}

fn binding(
    store: &TypeStore,
    member: ContractMemberDescriptor,
    candidate: TargetMemberCandidate,
    generics: GenericBinding,
    dispatch: DispatchStrategy,
) -> Binding {
    let fixed: &[TypeRef] = match &generics {
        GenericBinding::Fixed(types) => types,
        GenericBinding::None | GenericBinding::PassThrough => &[],
    };
    let target_ty = |ty: &TypeRef| ty.substitute(&[], fixed);

    let args = member
        .params
        .iter()
        .zip(&candidate.params)
        .map(|(mine, theirs)| plan(store, &mine.ty, &target_ty(&theirs.ty), Crossing::IntoTarget))
        .collect();
    let trailing = candidate
        .params
        .get(member.params.len()..)
        .unwrap_or_default()
        .iter()
        .map(|p| p.default.clone().unwrap_or_default())
        .collect();
    let ret = plan(store, &member.ret, &target_ty(&candidate.ret), Crossing::OutOfTarget);
    let out_slots = member
        .params
        .iter()
        .zip(&candidate.params)
        .enumerate()
        .filter(|(_, (mine, _))| mine.mode.writes_back())
        .map(|(index, (mine, theirs))| {
            let target_type = target_ty(theirs.ty.element());
            OutputRefSlot {
                index,
                mode: mine.mode,
                read_back: plan(store, &mine.ty, &target_type, Crossing::OutOfTarget),
                target_type,
            }
        })
        .collect();

    Binding {
        overrides: member.method,
        calls: candidate.method,
        calls_static: candidate.is_static,
        args,
        trailing,
        ret,
        out_slots,
        generics,
        dispatch,
        member,
        candidate,
    }
}

pub(super) fn define(ctx: &GenerationContext, set: &BindingSet) -> TypeRef {
    let store = ctx.store();
    let name = ctx.proxy_name(&set.contract, &set.target, "Proxy");
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
        let member = &binding.member;
        builder = builder.method(override_method(
            ctx,
            binding,
            Shape {
                name: &member.name,
                params: &member.params,
                generic_params: &member.generic_params,
                ret: &member.ret,
                visibility: store.method(member.method).visibility,
            },
        ));
    }
    let proxy = TypeRef::of(store.define(builder));
    debug!(proxy = %store.full_name(&proxy), members = set.bindings.len(), "forward proxy defined");
    proxy
}
