//! Human-readable names for types and methods.
//!
//! These strings are also the matching keys used by name-based lookups and
//! signature deduplication, so their shape must stay stable.

use std::fmt::Write;

use crate::def::ParamDef;
use crate::idx::MethodId;
use crate::ty::{ParamMode, TypeRef};

use super::TypeStore;

impl TypeStore {
    /// `Namespace.Name`, with generic arguments as `<A, B>` and by-ref as `&`.
    pub fn full_name(&self, ty: &TypeRef) -> String {
        self.render(ty, true)
    }

    /// The name without its namespace; generic arguments use short names too.
    pub fn short_name(&self, ty: &TypeRef) -> String {
        self.render(ty, false)
    }

    /// `Namespace.Name, Module` for defined types; the full name otherwise.
    pub fn qualified_name(&self, ty: &TypeRef) -> String {
        match self.module_of(ty) {
            Some(module) => format!("{}, {}", self.full_name(ty), self.module(module).name),
            None => self.full_name(ty),
        }
    }

    fn render(&self, ty: &TypeRef, full: bool) -> String {
        match ty {
            TypeRef::Def { id, args } => {
                let def = self.ty(*id);
                let mut out = if full { def.full_name() } else { def.name.clone() };
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.render(arg, full));
                    }
                    out.push('>');
                }
                out
            }
            TypeRef::Param(param) => param.name.clone(),
            TypeRef::ByRef(inner) => format!("{}&", self.render(inner, full)),
        }
    }

    /// Signature string: `Ret Name<2>(ref T&, U)`.
    ///
    /// Two methods with equal signature strings are the same member for
    /// deduplication purposes, regardless of which type declares them.
    pub fn method_signature(&self, method: MethodId) -> String {
        let def = self.method(method);
        self.format_signature(&def.ret, &def.name, def.generic_params.len(), &def.params)
    }

    /// Signature string for a member whose types have already been
    /// substituted.
    pub fn format_signature(
        &self,
        ret: &TypeRef,
        name: &str,
        generic_arity: usize,
        params: &[ParamDef],
    ) -> String {
        let mut out = String::new();
        let _ = write!(out, "{} {name}", self.full_name(ret));
        if generic_arity > 0 {
            let _ = write!(out, "<{generic_arity}>");
        }
        out.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match param.mode {
                ParamMode::Value => {}
                ParamMode::In => out.push_str("in "),
                ParamMode::Out => out.push_str("out "),
                ParamMode::Ref => out.push_str("ref "),
            }
            out.push_str(&self.full_name(&param.ty));
        }
        out.push(')');
        out
    }

    /// `Namespace.Type.Name(ParamTypes)` for diagnostics.
    pub fn display_method(&self, method: MethodId) -> String {
        let def = self.method(method);
        let owner = self.ty(def.declaring).full_name();
        let params: Vec<String> = def
            .params
            .iter()
            .map(|p| self.short_name(&p.ty))
            .collect();
        format!("{owner}.{}({})", def.name, params.join(", "))
    }
}
