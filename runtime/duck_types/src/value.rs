//! Runtime values crossing adapter boundaries.
//!
//! Primitives are stored inline. Objects are reference counted and compared
//! by identity; their state is opaque to this crate. Struct values are
//! compared field by field.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::idx::TypeId;
use crate::ty::TypeRef;

/// Shared handle to a heap object.
pub type ObjectRef = Arc<Object>;

/// A heap object: its runtime type plus opaque state.
pub struct Object {
    ty: TypeRef,
    state: Box<dyn Any + Send + Sync>,
}

impl Object {
    pub fn new<T: Any + Send + Sync>(ty: TypeRef, state: T) -> ObjectRef {
        Arc::new(Object {
            ty,
            state: Box::new(state),
        })
    }

    /// The exact runtime type of this object.
    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Borrow the object state as `T`, if that is what it holds.
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A value-type instance with named fields.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    pub ty: TypeRef,
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// A runtime value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(Arc<str>),
    Struct(Arc<StructValue>),
    Object(ObjectRef),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Allocate a new object of type `ty`.
    pub fn object<T: Any + Send + Sync>(ty: impl Into<TypeRef>, state: T) -> Self {
        Value::Object(Object::new(ty.into(), state))
    }

    pub fn structure(ty: impl Into<TypeRef>, fields: Vec<(String, Value)>) -> Self {
        Value::Struct(Arc::new(StructValue {
            ty: ty.into(),
            fields,
        }))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The runtime type of this value. `Null` has none.
    pub fn runtime_type(&self) -> Option<TypeRef> {
        let id = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeId::BOOL,
            Value::I32(_) => TypeId::INT32,
            Value::I64(_) => TypeId::INT64,
            Value::F64(_) => TypeId::FLOAT64,
            Value::Str(_) => TypeId::STRING,
            Value::Struct(s) => return Some(s.ty.clone()),
            Value::Object(obj) => return Some(obj.ty().clone()),
        };
        Some(TypeRef::of(id))
    }

    /// Reference identity for objects, value equality for everything else.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::F64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
