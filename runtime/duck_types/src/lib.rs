//! Runtime type metadata for duck proxies.
//!
//! A [`TypeStore`] holds modules, types and methods defined at run time. Types
//! are referred to by [`TypeRef`] values, which are plain data and can be
//! compared structurally without touching any live object. Methods carry
//! native bodies and are invoked either through [`TypeStore::call`], which
//! enforces visibility, or [`TypeStore::call_ignoring_visibility`].

mod builder;
mod def;
mod flags;
mod idx;
mod invoke;
mod store;
mod ty;
mod value;

pub use builder::{MethodBuilder, TypeBuilder};
pub use def::{
    Annotations, FieldDef, MethodDef, ModuleDef, ParamDef, TypeDef, TypeKind, Visibility,
};
pub use flags::{AnnotationFlags, BindingScope, MethodFlags, TypeFlags};
pub use idx::{MethodId, ModuleId, TypeId};
pub use invoke::{AccessPolicy, InvokeError, InvokeResult, Invocation, MethodBody, PublicOnly};
pub use store::TypeStore;
pub use ty::{GenericParam, ParamMode, ParamScope, TypeRef};
pub use value::{Object, ObjectRef, StructValue, Value};
