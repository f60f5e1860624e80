//! Forward and reverse proxy synthesis.
//!
//! A binding set becomes a proxy type defined in the generation context's
//! module. Each binding turns into an override whose body is a forwarding
//! closure; virtual dispatch in the type store routes contract calls to it.

mod forward;
mod reverse;

use std::sync::{Arc, Weak};

use duck_types::{
    Invocation, InvokeError, InvokeResult, MethodBody, MethodBuilder, MethodFlags, MethodId, ParamDef,
    TypeRef, TypeStore, Value, Visibility,
};

use crate::adapter::{instance_accessor, AdapterFactory, ProxyState};
use crate::binding::{Binding, BindingSet};
use crate::context::GenerationContext;
use crate::descriptor::ProxyMode;
use crate::dispatch::WaiverRegistry;
use crate::error::DuckError;

/// Resolve every member for the pair in `mode`.
pub(crate) fn resolve(
    store: &TypeStore,
    waivers: &WaiverRegistry,
    contract: &TypeRef,
    target: &TypeRef,
    mode: ProxyMode,
) -> Result<BindingSet, DuckError> {
    match mode {
        ProxyMode::Forward | ProxyMode::Static => {
            forward::bind(store, waivers, contract, target, mode)
        }
        ProxyMode::Reverse => reverse::bind(store, waivers, contract, target),
    }
}

/// Define the proxy type for `set`.
pub(crate) fn synthesize(
    ctx: &GenerationContext,
    set: &BindingSet,
    mode: ProxyMode,
) -> Result<AdapterFactory, DuckError> {
    if set.mode.is_reverse() != mode.is_reverse() {
        let store = ctx.store();
        let member = set.bindings.first().map_or_else(
            || store.full_name(&set.contract),
            |b| b.member.display(store),
        );
        return Err(DuckError::IncorrectReverseMethodUsage {
            member,
            reason: format!("bindings resolved for {} synthesis used for {mode}", set.mode),
        });
    }
    let proxy = if mode.is_reverse() {
        reverse::define(ctx, set)
    } else {
        forward::define(ctx, set)
    };
    Ok(AdapterFactory::new(ctx, set, mode, proxy))
}

/// Proxy override member for `binding` with the given visible shape.
fn override_method(ctx: &GenerationContext, binding: &Binding, shape: Shape<'_>) -> MethodBuilder {
    let generic_names: Vec<&str> = shape.generic_params.iter().map(String::as_str).collect();
    shape
        .params
        .iter()
        .fold(MethodBuilder::new(shape.name), |m, p| m.param_def(p.clone()))
        .generic_params(&generic_names)
        .returns(shape.ret.clone())
        .visibility(shape.visibility)
        .with_flags(MethodFlags::VIRTUAL)
        .overrides(binding.overrides)
        .body_arc(forwarding_body(ctx.weak(), Arc::new(binding.clone())))
}

/// The signature the proxy declares for one override.
struct Shape<'a> {
    name: &'a str,
    params: &'a [ParamDef],
    generic_params: &'a [String],
    ret: &'a TypeRef,
    visibility: Visibility,
}

fn get_instance_method() -> MethodBuilder {
    MethodBuilder::new("GetInstance")
        .returns(TypeRef::object())
        .with_flags(MethodFlags::VIRTUAL)
        .overrides(MethodId::DUCK_GET_INSTANCE)
        .body_arc(instance_accessor())
}

fn forwarding_body(ctx: Weak<GenerationContext>, binding: Arc<Binding>) -> MethodBody {
    Arc::new(move |inv: Invocation<'_>| {
        let ctx = ctx.upgrade().ok_or_else(|| InvokeError::Chain {
            message: "the generation context of this adapter was dropped".to_string(),
        })?;
        let instance = inv.this_state::<ProxyState>()?.instance.clone();
        forward_call(&ctx, &binding, &instance, inv.args, inv.generic_args)
    })
}

/// Run one binding: convert arguments, fill trailing optionals, call,
/// convert the result, then write staged out/ref values back.
fn forward_call(
    ctx: &GenerationContext,
    binding: &Binding,
    instance: &Value,
    args: &mut [Value],
    generic_args: &[TypeRef],
) -> InvokeResult {
    let store = ctx.store();
    let mut forwarded = Vec::with_capacity(binding.args.len() + binding.trailing.len());
    for (index, plan) in binding.args.iter().enumerate() {
        let value = args.get(index).cloned().unwrap_or_default();
        forwarded.push(if binding.is_out(index) {
            Value::Null
        } else {
            plan.apply(store, ctx, value)?
        });
    }
    forwarded.extend(binding.trailing.iter().cloned());

    let generic_args = binding.generics.arguments(generic_args);
    let this = (!binding.calls_static).then_some(instance);
    let ret = binding
        .dispatch
        .invoke(store, ctx, binding.calls, this, &mut forwarded, &generic_args)?;
    let ret = binding.ret.apply(store, ctx, ret)?;

    for slot in &binding.out_slots {
        let staged = forwarded.get_mut(slot.index).map(std::mem::take).unwrap_or_default();
        let value = slot.read_back.apply(store, ctx, staged)?;
        if let Some(arg) = args.get_mut(slot.index) {
            *arg = value;
        }
    }
    Ok(ret)
}
