//! Visibility checks and dispatch strategy selection.
//!
//! Forwarding code calls a target member directly when the member is on the
//! public surface or its module grants an access waiver to the generation
//! context. Everything else goes through a trampoline that takes erased
//! types and invokes with visibility checks bypassed. Generic members
//! cannot be called that way.

use duck_types::{
    AccessPolicy, InvokeResult, MethodId, ModuleId, TypeRef, TypeStore, Value,
};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::descriptor::TargetMemberCandidate;
use crate::error::DuckError;

/// Capability to let generated code call non-public members of a module.
pub trait GrantAccess {
    /// Request a waiver for `module`. Returns `false` when none can be
    /// arranged. Requesting an already granted waiver is a no-op.
    fn grant_access(&self, store: &TypeStore, module: ModuleId) -> bool;
}

/// Modules a generation context holds access waivers for.
#[derive(Debug)]
pub struct WaiverRegistry {
    enabled: bool,
    granted: Mutex<FxHashSet<ModuleId>>,
}

impl WaiverRegistry {
    /// `enabled: false` refuses every request; adopted modules still count.
    pub fn new(enabled: bool) -> Self {
        WaiverRegistry {
            enabled,
            granted: Mutex::new(FxHashSet::default()),
        }
    }

    /// Record a module the context itself owns. Always succeeds.
    pub fn adopt(&self, module: ModuleId) {
        self.granted.lock().insert(module);
    }

    pub fn is_granted(&self, module: ModuleId) -> bool {
        self.granted.lock().contains(&module)
    }

    /// Granted modules in id order.
    pub fn granted(&self) -> Vec<ModuleId> {
        let mut modules: Vec<_> = self.granted.lock().iter().copied().collect();
        modules.sort_unstable();
        modules
    }
}

impl GrantAccess for WaiverRegistry {
    fn grant_access(&self, store: &TypeStore, module: ModuleId) -> bool {
        let mut granted = self.granted.lock();
        if granted.contains(&module) {
            return true;
        }
        if !self.enabled {
            debug!(?module, "access waivers disabled");
            return false;
        }
        let def = store.module(module);
        if !def.allows_access_waiver {
            warn!(module = %def.name, "module refuses access waivers");
            return false;
        }
        granted.insert(module);
        debug!(module = %def.name, "access waiver granted");
        true
    }
}

impl AccessPolicy for WaiverRegistry {
    fn has_waiver(&self, module: ModuleId) -> bool {
        self.is_granted(module)
    }
}

/// How a forwarding body reaches its target member.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DispatchStrategy {
    /// Ordinary visibility-checked call.
    Direct,
    /// Through a trampoline typed at the nearest accessible types.
    Indirect(ErasedSignature),
}

/// Parameter and return types the trampoline exposes: the real type when it
/// is public and non-generic, the object type otherwise.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ErasedSignature {
    /// `None` for static members.
    pub receiver: Option<TypeRef>,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
}

/// Choose the dispatch strategy for calling `candidate`, requesting an
/// access waiver when that makes a direct call possible.
pub fn select_strategy(
    store: &TypeStore,
    access: &dyn GrantAccess,
    candidate: &TargetMemberCandidate,
) -> Result<DispatchStrategy, DuckError> {
    if store.is_public_surface(candidate.method) {
        return Ok(DispatchStrategy::Direct);
    }
    let module = store.ty(candidate.declaring).module;
    if access.grant_access(store, module) {
        return Ok(DispatchStrategy::Direct);
    }
    if candidate.is_generic() {
        return Err(DuckError::UnsupportedGenericInIndirectDispatch {
            candidate: candidate.display(store),
        });
    }
    let erased = ErasedSignature::of(store, candidate);
    debug!(candidate = %candidate.display(store), ?erased, "indirect dispatch");
    Ok(DispatchStrategy::Indirect(erased))
}

impl ErasedSignature {
    pub fn of(store: &TypeStore, candidate: &TargetMemberCandidate) -> Self {
        let receiver = (!candidate.is_static).then(|| {
            let declaring = store.ty(candidate.declaring);
            if declaring.is_generic_definition() {
                TypeRef::object()
            } else {
                erase(store, &TypeRef::of(candidate.declaring))
            }
        });
        ErasedSignature {
            receiver,
            params: candidate.params.iter().map(|p| erase(store, &p.ty)).collect(),
            ret: erase(store, &candidate.ret),
        }
    }

    fn trampoline(
        &self,
        store: &TypeStore,
        method: MethodId,
        this: Option<&Value>,
        args: &mut [Value],
    ) -> InvokeResult {
        if let (Some(receiver), Some(this)) = (&self.receiver, this) {
            store.check_cast(this, receiver)?;
        }
        for (value, ty) in args.iter().zip(&self.params) {
            if !ty.is_by_ref() {
                store.check_cast(value, ty)?;
            }
        }
        let ret = store.call_ignoring_visibility(method, this, args, &[])?;
        if !self.ret.is_void() {
            store.check_cast(&ret, &self.ret)?;
        }
        Ok(ret)
    }
}

fn erase(store: &TypeStore, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::ByRef(inner) => TypeRef::by_ref(erase(store, inner)),
        _ if ty.is_void() => TypeRef::void(),
        _ if !ty.has_params() && store.is_ref_public(ty) => ty.clone(),
        _ => TypeRef::object(),
    }
}

impl DispatchStrategy {
    pub(crate) fn invoke(
        &self,
        store: &TypeStore,
        access: &dyn AccessPolicy,
        method: MethodId,
        this: Option<&Value>,
        args: &mut [Value],
        generic_args: &[TypeRef],
    ) -> InvokeResult {
        match self {
            DispatchStrategy::Direct => store.call(access, method, this, args, generic_args),
            DispatchStrategy::Indirect(erased) => erased.trampoline(store, method, this, args),
        }
    }

    #[inline]
    pub fn is_direct(&self) -> bool {
        matches!(self, DispatchStrategy::Direct)
    }
}
