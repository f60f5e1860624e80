//! The generation context: owner of synthesized proxy types, the access
//! waiver registry and the adapter cache.
//!
//! Synthesis for a (contract, target, mode) key runs at most once at a time.
//! Concurrent requesters for the same key block on the in-flight synthesis
//! and share its result, failures included.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use duck_types::{AccessPolicy, InvokeError, InvokeResult, ModuleId, TypeRef, TypeStore, Value};
use tracing::debug;

use crate::adapter::{unwrap_instance, Adapter, AdapterFactory};
use crate::binding::BindingSet;
use crate::config::DuckConfig;
use crate::convert::Chain;
use crate::descriptor::ProxyMode;
use crate::dispatch::WaiverRegistry;
use crate::error::DuckError;
use crate::synth;

type CacheSlot = Arc<OnceLock<Result<Arc<AdapterFactory>, DuckError>>>;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct CacheKey {
    contract: TypeRef,
    target: TypeRef,
    mode: ProxyMode,
}

static NEXT_CONTEXT: AtomicU32 = AtomicU32::new(0);

/// Scope for adapter synthesis.
///
/// Each context defines its proxy types in a module of its own and holds
/// its own access waivers. Adapters stop forwarding once their context is
/// dropped.
#[derive(Debug)]
pub struct GenerationContext {
    this: Weak<GenerationContext>,
    store: Arc<TypeStore>,
    module: ModuleId,
    config: DuckConfig,
    waivers: WaiverRegistry,
    cache: DashMap<CacheKey, CacheSlot>,
    next_proxy: AtomicU32,
}

impl GenerationContext {
    pub fn new(store: Arc<TypeStore>) -> Arc<Self> {
        Self::with_config(store, DuckConfig::default())
    }

    pub fn with_config(store: Arc<TypeStore>, config: DuckConfig) -> Arc<Self> {
        let n = NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed);
        let module = store.add_module(&format!("DuckProxies{n}"), false);
        let waivers = WaiverRegistry::new(config.access_waivers);
        waivers.adopt(module);
        Arc::new_cyclic(|this| GenerationContext {
            this: this.clone(),
            store,
            module,
            config,
            waivers,
            cache: DashMap::new(),
            next_proxy: AtomicU32::new(0),
        })
    }

    pub fn store(&self) -> &Arc<TypeStore> {
        &self.store
    }

    /// Module that synthesized proxy types are defined in.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn config(&self) -> &DuckConfig {
        &self.config
    }

    pub fn waivers(&self) -> &WaiverRegistry {
        &self.waivers
    }

    pub(crate) fn weak(&self) -> Weak<GenerationContext> {
        self.this.clone()
    }

    pub(crate) fn proxy_name(&self, contract: &TypeRef, target: &TypeRef, suffix: &str) -> String {
        let n = self.next_proxy.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}.{}_{}{suffix}{n}",
            self.store.module(self.module).name,
            self.store.short_name(contract),
            self.store.short_name(target),
        )
    }

    /// Bind every member of `contract` to a member of `target`.
    ///
    /// For [`ProxyMode::Reverse`], `contract` is the base type and `target`
    /// the implementation type.
    pub fn resolve(
        &self,
        contract: &TypeRef,
        target: &TypeRef,
        mode: ProxyMode,
    ) -> Result<BindingSet, DuckError> {
        synth::resolve(&self.store, &self.waivers, contract, target, mode)
    }

    /// Define the proxy type for `set` and return a factory for it.
    pub fn synthesize(&self, set: &BindingSet, mode: ProxyMode) -> Result<AdapterFactory, DuckError> {
        synth::synthesize(self, set, mode)
    }

    /// Factory for the pair, from the cache when enabled.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(contract = %self.store.full_name(contract), target = %self.store.full_name(target), %mode)
    )]
    pub fn factory(
        &self,
        contract: &TypeRef,
        target: &TypeRef,
        mode: ProxyMode,
    ) -> Result<Arc<AdapterFactory>, DuckError> {
        if !self.config.cache_adapters {
            return self.build(contract, target, mode).map(Arc::new);
        }
        let key = CacheKey {
            contract: contract.clone(),
            target: target.clone(),
            mode,
        };
        // Clone the slot out so no map shard stays locked during synthesis.
        let slot = Arc::clone(self.cache.entry(key).or_default().value());
        slot.get_or_init(|| {
            debug!("synthesizing");
            self.build(contract, target, mode).map(Arc::new)
        })
        .clone()
    }

    fn build(
        &self,
        contract: &TypeRef,
        target: &TypeRef,
        mode: ProxyMode,
    ) -> Result<AdapterFactory, DuckError> {
        let set = self.resolve(contract, target, mode)?;
        self.synthesize(&set, mode)
    }

    /// Number of (contract, target, mode) keys with a finished synthesis.
    pub fn cached_factories(&self) -> usize {
        self.cache.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    /// Adapter exposing `contract` over `instance`.
    pub fn create(&self, contract: &TypeRef, instance: &Value) -> Result<Adapter, DuckError> {
        let target = instance.runtime_type().ok_or_else(|| DuckError::NullInstance {
            contract: self.store.full_name(contract),
        })?;
        self.factory(contract, &target, ProxyMode::Forward)?
            .create(instance.clone())
    }

    /// Adapter forwarding `contract` to static members of `target`.
    pub fn create_static(&self, contract: &TypeRef, target: &TypeRef) -> Result<Adapter, DuckError> {
        Ok(self.factory(contract, target, ProxyMode::Static)?.create_static())
    }

    /// Adapter deriving from `base` whose overrides call the reverse
    /// members of `implementation`.
    pub fn create_reverse(&self, base: &TypeRef, implementation: &Value) -> Result<Adapter, DuckError> {
        let target = implementation
            .runtime_type()
            .ok_or_else(|| DuckError::NullInstance {
                contract: self.store.full_name(base),
            })?;
        self.factory(base, &target, ProxyMode::Reverse)?
            .create(implementation.clone())
    }

    /// Check if a forward adapter for the pair can be built.
    pub fn can_create(&self, contract: &TypeRef, target: &TypeRef) -> bool {
        self.factory(contract, target, ProxyMode::Forward).is_ok()
    }

    /// Duck-chain wrap: null and values already of the contract type pass
    /// through, anything else gets a forward adapter.
    pub fn wrap(&self, contract: &TypeRef, value: Value) -> Result<Value, DuckError> {
        if value.is_null() || self.store.is_instance_of(&value, contract) {
            return Ok(value);
        }
        self.create(contract, &value).map(Adapter::into_value)
    }

    /// Duck-chain unwrap: the instance behind an adapter, or `value` itself.
    pub fn unwrap(&self, value: &Value) -> Value {
        unwrap_instance(value)
    }
}

impl Chain for GenerationContext {
    fn chain(&self, contract: &TypeRef, value: Value) -> InvokeResult {
        self.wrap(contract, value).map_err(|err| InvokeError::Chain {
            message: err.to_string(),
        })
    }
}

impl AccessPolicy for GenerationContext {
    fn has_waiver(&self, module: ModuleId) -> bool {
        self.waivers.is_granted(module)
    }
}
