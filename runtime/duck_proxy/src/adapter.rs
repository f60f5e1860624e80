//! Adapter factories and adapter handles.

use std::sync::Arc;

use duck_types::{
    Invocation, InvokeError, InvokeResult, MethodBody, MethodId, PublicOnly, TypeId, TypeRef,
    TypeStore, Value,
};

use crate::binding::BindingSet;
use crate::context::GenerationContext;
use crate::descriptor::ProxyMode;
use crate::error::DuckError;

/// Object state of every proxy instance.
#[derive(Debug)]
pub(crate) struct ProxyState {
    /// The wrapped target, or the implementation for reverse proxies.
    /// `Null` for static adapters.
    pub(crate) instance: Value,
}

/// Body of `GetInstance()` on every proxy type.
pub(crate) fn instance_accessor() -> MethodBody {
    Arc::new(|inv: Invocation<'_>| Ok(inv.this_state::<ProxyState>()?.instance.clone()))
}

/// The instance `value` wraps if it is an adapter, otherwise `value`.
pub(crate) fn unwrap_instance(value: &Value) -> Value {
    value
        .as_object()
        .and_then(|obj| obj.state::<ProxyState>())
        .map_or_else(|| value.clone(), |state| state.instance.clone())
}

/// Creates adapters of one synthesized proxy type.
#[derive(Debug)]
pub struct AdapterFactory {
    store: Arc<TypeStore>,
    mode: ProxyMode,
    contract: TypeRef,
    target: TypeRef,
    proxy: TypeRef,
}

impl AdapterFactory {
    pub(crate) fn new(
        ctx: &GenerationContext,
        set: &BindingSet,
        mode: ProxyMode,
        proxy: TypeRef,
    ) -> Self {
        AdapterFactory {
            store: Arc::clone(ctx.store()),
            mode,
            contract: set.contract.clone(),
            target: set.target.clone(),
            proxy,
        }
    }

    pub fn mode(&self) -> ProxyMode {
        self.mode
    }

    /// The contract (forward) or base type (reverse) adapters expose.
    pub fn contract(&self) -> &TypeRef {
        &self.contract
    }

    /// The target (forward) or implementation type (reverse).
    pub fn target(&self) -> &TypeRef {
        &self.target
    }

    /// The synthesized proxy type.
    pub fn proxy_type(&self) -> &TypeRef {
        &self.proxy
    }

    /// Wrap `instance`, which must be an instance of the target type.
    pub fn create(&self, instance: Value) -> Result<Adapter, DuckError> {
        if self.mode == ProxyMode::Static {
            return Ok(self.create_static());
        }
        if instance.is_null() {
            return Err(DuckError::NullInstance {
                contract: self.store.full_name(&self.contract),
            });
        }
        if !self.store.is_instance_of(&instance, &self.target) {
            return Err(DuckError::InstanceMismatch {
                expected: self.store.full_name(&self.target),
                found: instance
                    .runtime_type()
                    .map_or_else(String::new, |ty| self.store.full_name(&ty)),
            });
        }
        Ok(self.adapter(instance))
    }

    /// An adapter without an instance, for static forwarding.
    pub fn create_static(&self) -> Adapter {
        self.adapter(Value::Null)
    }

    fn adapter(&self, instance: Value) -> Adapter {
        Adapter {
            store: Arc::clone(&self.store),
            contract: self.contract.clone(),
            value: Value::object(self.proxy.clone(), ProxyState { instance }),
        }
    }
}

/// A proxy instance together with the contract it implements.
#[derive(Clone, Debug)]
pub struct Adapter {
    store: Arc<TypeStore>,
    contract: TypeRef,
    value: Value,
}

impl Adapter {
    /// The proxy object, usable wherever a contract-typed value is expected.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn contract(&self) -> &TypeRef {
        &self.contract
    }

    /// The wrapped instance; `Null` for static adapters.
    pub fn instance(&self) -> &Value {
        self.value
            .as_object()
            .and_then(|obj| obj.state::<ProxyState>())
            .map_or(&Value::Null, |state| &state.instance)
    }

    /// Call the contract member `member` taking `args.len()` arguments.
    /// `out`/`ref` results are written back into `args`.
    pub fn call(&self, member: &str, args: &mut [Value]) -> InvokeResult {
        self.call_generic(member, &[], args)
    }

    /// Call a generic contract member with explicit generic arguments.
    pub fn call_generic(
        &self,
        member: &str,
        generic_args: &[TypeRef],
        args: &mut [Value],
    ) -> InvokeResult {
        let method = self.find_member(member, args.len()).ok_or_else(|| {
            InvokeError::target(format!(
                "`{}` has no member `{member}` taking {} argument(s)",
                self.store.full_name(&self.contract),
                args.len()
            ))
        })?;
        self.store
            .call(&PublicOnly, method, Some(&self.value), args, generic_args)
    }

    fn find_member(&self, name: &str, arity: usize) -> Option<MethodId> {
        let types = self
            .store
            .class_chain(&self.contract)
            .into_iter()
            .chain(self.store.all_interfaces(&self.contract))
            .chain(std::iter::once(TypeRef::of(TypeId::DUCK_TYPE)));
        for ty in types {
            let Some(id) = ty.def_id() else { continue };
            let found = self
                .store
                .declared_methods(id)
                .into_iter()
                .find(|m| m.name == name && m.params.len() == arity && !m.is_static());
            if let Some(method) = found {
                return Some(method.id);
            }
        }
        None
    }
}
