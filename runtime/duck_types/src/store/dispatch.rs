//! Virtual dispatch and the two invocation primitives.

use crate::def::MethodDef;
use crate::idx::MethodId;
use crate::invoke::{AccessPolicy, InvokeError, InvokeResult, Invocation};
use crate::ty::TypeRef;
use crate::value::Value;

use super::TypeStore;

impl TypeStore {
    /// Find the implementation of `method` that runs for a receiver of
    /// runtime type `receiver`.
    ///
    /// Walks the receiver's class chain from the most derived type. On each
    /// type an explicit override link wins over a name-and-signature match.
    /// Interface members also match public methods of the same name and
    /// explicit `Interface.Name` implementations.
    pub fn resolve_override(&self, method: MethodId, receiver: &TypeRef) -> Option<MethodId> {
        let target = self.method(method);
        let declaring = self.ty(target.declaring);
        let interface_member = declaring.is_interface() && !target.is_static();
        if target.is_static() || !(target.is_virtual() || interface_member) {
            return target.body.is_some().then_some(method);
        }

        let qualified = format!("{}.{}", declaring.full_name(), target.name);
        for class in self.class_chain(receiver) {
            let Some(id) = class.def_id() else {
                continue;
            };
            let candidates: Vec<_> = self
                .declared_methods(id)
                .into_iter()
                .filter(|m| m.body.is_some() && !m.is_static())
                .collect();

            if let Some(m) = candidates
                .iter()
                .find(|m| self.overrides_transitively(m, method))
            {
                return Some(m.id);
            }

            let by_name = candidates.iter().find(|m| {
                if m.id == method {
                    return true;
                }
                let name_matches = if interface_member {
                    (m.name == target.name && m.visibility.is_public()) || m.name == qualified
                } else {
                    m.name == target.name && m.is_virtual()
                };
                name_matches && signatures_match(&target, m)
            });
            if let Some(m) = by_name {
                return Some(m.id);
            }
        }

        target.body.is_some().then_some(method)
    }

    fn overrides_transitively(&self, candidate: &MethodDef, method: MethodId) -> bool {
        let mut current = candidate.overrides;
        while let Some(id) = current {
            if id == method {
                return true;
            }
            current = self.method(id).overrides;
        }
        false
    }

    /// Call `method` as ordinary code would: non-public members are only
    /// reachable when `access` holds a waiver for their module.
    pub fn call(
        &self,
        access: &dyn AccessPolicy,
        method: MethodId,
        this: Option<&Value>,
        args: &mut [Value],
        generic_args: &[TypeRef],
    ) -> InvokeResult {
        if !self.is_public_surface(method) {
            let module = self.ty(self.method(method).declaring).module;
            if !access.has_waiver(module) {
                return Err(InvokeError::AccessDenied {
                    method: self.display_method(method),
                });
            }
        }
        self.call_ignoring_visibility(method, this, args, generic_args)
    }

    /// Low-level call that skips every visibility check.
    pub fn call_ignoring_visibility(
        &self,
        method: MethodId,
        this: Option<&Value>,
        args: &mut [Value],
        generic_args: &[TypeRef],
    ) -> InvokeResult {
        let def = self.method(method);
        if args.len() != def.params.len() {
            return Err(InvokeError::ArgumentCount {
                method: self.display_method(method),
                expected: def.params.len(),
                found: args.len(),
            });
        }
        if generic_args.len() != def.generic_params.len() {
            return Err(InvokeError::GenericArgumentCount {
                method: self.display_method(method),
                expected: def.generic_params.len(),
                found: generic_args.len(),
            });
        }

        let (implementation, this) = if def.is_static() {
            (method, None)
        } else {
            let receiver = match this {
                Some(value) if !value.is_null() => value,
                _ => {
                    return Err(InvokeError::NullReference {
                        method: self.display_method(method),
                    })
                }
            };
            let runtime = receiver.runtime_type().unwrap_or_else(TypeRef::object);
            let implementation = self
                .resolve_override(method, &runtime)
                .ok_or_else(|| InvokeError::AbstractMethod {
                    method: self.display_method(method),
                    receiver: self.full_name(&runtime),
                })?;
            (implementation, Some(receiver))
        };

        let Some(body) = self.method(implementation).body.clone() else {
            return Err(InvokeError::AbstractMethod {
                method: self.display_method(method),
                receiver: this
                    .and_then(Value::runtime_type)
                    .map_or_else(String::new, |rt| self.full_name(&rt)),
            });
        };
        tracing::trace!(method = %self.display_method(implementation), "invoke");
        body(Invocation {
            store: self,
            method: implementation,
            this,
            args,
            generic_args,
        })
    }
}

/// Loose signature equality used for override matching: same arity, same
/// parameter modes, and equal parameter types unless either side is generic.
fn signatures_match(a: &MethodDef, b: &MethodDef) -> bool {
    a.params.len() == b.params.len()
        && a.generic_params.len() == b.generic_params.len()
        && a.params.iter().zip(&b.params).all(|(pa, pb)| {
            pa.mode == pb.mode && (pa.ty == pb.ty || pa.ty.has_params() || pb.ty.has_params())
        })
}
