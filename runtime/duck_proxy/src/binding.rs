//! Resolved pairings of contract members to target members.

use duck_types::{MethodId, ParamMode, TypeRef, Value};

use crate::convert::ConversionPlan;
use crate::descriptor::{ContractMemberDescriptor, ProxyMode, TargetMemberCandidate};
use crate::dispatch::DispatchStrategy;

/// Where the generic arguments of the called member come from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GenericBinding {
    /// Neither side is generic.
    None,
    /// Both sides have the same arity; the caller's arguments are forwarded.
    PassThrough,
    /// Non-generic contract member bound to a generic target member with
    /// arguments named by the member's annotations.
    Fixed(Vec<TypeRef>),
}

impl GenericBinding {
    /// Generic arguments for the forwarded call, given those the proxy
    /// method was called with.
    pub(crate) fn arguments(&self, supplied: &[TypeRef]) -> Vec<TypeRef> {
        match self {
            GenericBinding::None => Vec::new(),
            GenericBinding::PassThrough => supplied.to_vec(),
            GenericBinding::Fixed(types) => types.clone(),
        }
    }
}

/// Staging for one `out`/`ref` parameter: the forwarded call writes into a
/// temporary of `target_type`, which is read back through `read_back`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OutputRefSlot {
    pub index: usize,
    pub mode: ParamMode,
    pub target_type: TypeRef,
    pub read_back: ConversionPlan,
}

/// One contract member bound to one target member.
///
/// In forward bindings the proxy overrides `member` and calls `candidate`.
/// In reverse bindings `member` is the implementation's reverse method and
/// `candidate` the base member the proxy overrides. Plans are always
/// oriented from the proxy's caller towards the called method.
#[derive(Clone, PartialEq, Debug)]
pub struct Binding {
    pub member: ContractMemberDescriptor,
    pub candidate: TargetMemberCandidate,
    /// Method the proxy overrides.
    pub overrides: MethodId,
    /// Method the forwarding body calls.
    pub calls: MethodId,
    pub calls_static: bool,
    /// One plan per proxy parameter.
    pub args: Vec<ConversionPlan>,
    /// Values for trailing optional parameters the proxy does not declare.
    pub trailing: Vec<Value>,
    pub ret: ConversionPlan,
    pub out_slots: Vec<OutputRefSlot>,
    pub generics: GenericBinding,
    pub dispatch: DispatchStrategy,
}

impl Binding {
    pub(crate) fn is_out(&self, index: usize) -> bool {
        self.out_slots
            .iter()
            .any(|slot| slot.index == index && slot.mode == ParamMode::Out)
    }
}

/// Every binding for one (contract, target) pair.
///
/// For reverse sets `contract` is the base type the proxy derives from and
/// `target` the implementation type.
#[derive(Clone, PartialEq, Debug)]
pub struct BindingSet {
    pub mode: ProxyMode,
    pub contract: TypeRef,
    pub target: TypeRef,
    pub bindings: Vec<Binding>,
}

impl BindingSet {
    /// Binding for the contract member named `name`, if any.
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.member.name == name)
    }
}
