//! Conversion and duck chaining for values crossing an adapter boundary.
//!
//! A plan is chosen once per crossing point when a binding is built and
//! applied to every value that passes through it at call time.

use duck_types::{InvokeError, InvokeResult, TypeFlags, TypeId, TypeRef, TypeStore, Value};

use crate::adapter::unwrap_instance;

/// Which way a value moves relative to the target.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Crossing {
    /// Contract side to target side: arguments of a forward call.
    IntoTarget,
    /// Target side to contract side: returns and out/ref read-back.
    OutOfTarget,
}

/// What happens to a value at one crossing point.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConversionPlan {
    /// Cast, box or widen to `to`.
    Straight { to: TypeRef },
    /// Build an adapter over the value with `contract` as its contract.
    Wrap { contract: TypeRef },
    /// Replace an adapter with the instance it wraps, then cast to `to`.
    Unwrap { to: TypeRef },
    /// Copy field by field into the `into` shape.
    Copy { into: TypeRef },
}

/// Check if a value typed `target` on one side and `contract` on the other
/// needs a nested adapter.
///
/// Value types, generic parameters, types assignable without conversion and
/// core runtime types are never chained.
pub fn needs_chaining(store: &TypeStore, contract: &TypeRef, target: &TypeRef) -> bool {
    let contract = contract.element();
    let target = target.element();
    contract != target
        && !store.is_value_type(contract)
        && !contract.is_generic_param()
        && !store.is_assignable(contract, target)
        && store.module_of(contract).is_some_and(|m| !m.is_core())
}

/// Choose the conversion for a value crossing between `contract` and
/// `target` types in direction `crossing`.
///
/// Reverse adapters use the same rule with the implementation member on
/// the contract side, so their directions come out inverted.
pub fn plan(
    store: &TypeStore,
    contract: &TypeRef,
    target: &TypeRef,
    crossing: Crossing,
) -> ConversionPlan {
    let (contract, target) = (contract.element(), target.element());
    let to = match crossing {
        Crossing::IntoTarget => target,
        Crossing::OutOfTarget => contract,
    };
    if store.has_flag(contract, TypeFlags::DUCK_COPY) {
        return ConversionPlan::Copy { into: to.clone() };
    }
    if !needs_chaining(store, contract, target) {
        return ConversionPlan::Straight { to: to.clone() };
    }
    match crossing {
        Crossing::IntoTarget => ConversionPlan::Unwrap { to: to.clone() },
        Crossing::OutOfTarget => ConversionPlan::Wrap {
            contract: contract.clone(),
        },
    }
}

/// Produces nested adapters while a forwarding body runs.
pub(crate) trait Chain {
    fn chain(&self, contract: &TypeRef, value: Value) -> InvokeResult;
}

impl ConversionPlan {
    /// Convert one value. Null passes through every plan unchanged.
    pub(crate) fn apply(&self, store: &TypeStore, chain: &dyn Chain, value: Value) -> InvokeResult {
        if value.is_null() {
            return Ok(value);
        }
        match self {
            ConversionPlan::Straight { to } => straight(store, value, to),
            ConversionPlan::Wrap { contract } => chain.chain(contract, value),
            ConversionPlan::Unwrap { to } => straight(store, unwrap_instance(&value), to),
            ConversionPlan::Copy { into } => copy(store, &value, into),
        }
    }
}

fn straight(store: &TypeStore, value: Value, to: &TypeRef) -> InvokeResult {
    if to.is_void() {
        return Ok(Value::Null);
    }
    let widened = match (&value, to.def_id()) {
        (Value::I32(n), Some(id)) if id == TypeId::INT64 => Value::I64(i64::from(*n)),
        (Value::I32(n), Some(id)) if id == TypeId::FLOAT64 => Value::F64(f64::from(*n)),
        _ => value,
    };
    store.check_cast(&widened, to)?;
    Ok(widened)
}

fn copy(store: &TypeStore, value: &Value, into: &TypeRef) -> InvokeResult {
    let Some(source) = value.as_struct() else {
        store.check_cast(value, into)?;
        return Ok(value.clone());
    };
    let Some(id) = into.def_id() else {
        return Ok(value.clone());
    };
    let def = store.ty(id);
    if !def.is_value_type() {
        return Err(InvokeError::InvalidCast {
            from: store.full_name(&source.ty),
            to: store.full_name(into),
        });
    }
    let fields = if def.fields.is_empty() {
        source.fields.clone()
    } else {
        def.fields
            .iter()
            .map(|f| (f.name.clone(), source.field(&f.name).cloned().unwrap_or_default()))
            .collect()
    };
    Ok(Value::structure(into.clone(), fields))
}

#[cfg(test)]
mod tests;
