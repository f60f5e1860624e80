//! Native method bodies and the call frame they receive.

use std::any::Any;
use std::sync::Arc;

use crate::idx::{MethodId, ModuleId};
use crate::store::TypeStore;
use crate::ty::TypeRef;
use crate::value::Value;

/// Result of running a method body.
pub type InvokeResult = Result<Value, InvokeError>;

/// A native method implementation.
///
/// Bodies may re-enter the store (to call other methods); the store never
/// holds a lock while a body runs.
pub type MethodBody = Arc<dyn Fn(Invocation<'_>) -> InvokeResult + Send + Sync>;

/// Call frame handed to a [`MethodBody`].
pub struct Invocation<'a> {
    pub store: &'a TypeStore,
    /// The implementation actually running (after virtual dispatch).
    pub method: MethodId,
    /// Receiver; `None` for static calls.
    pub this: Option<&'a Value>,
    /// Arguments. Bodies write `out`/`ref` results back into their slot.
    pub args: &'a mut [Value],
    /// Method-level generic arguments supplied by the caller.
    pub generic_args: &'a [TypeRef],
}

impl Invocation<'_> {
    /// Borrow the receiver's object state as `T`.
    pub fn this_state<T: Any>(&self) -> Result<&T, InvokeError> {
        self.this
            .and_then(Value::as_object)
            .and_then(|obj| obj.state::<T>())
            .ok_or_else(|| InvokeError::Target {
                message: format!(
                    "receiver of `{}` does not carry the expected state",
                    self.store.display_method(self.method)
                ),
            })
    }

    /// Argument `index`, or `Null` past the end.
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&Value::Null)
    }

    /// Write an `out`/`ref` result.
    pub fn set(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.args.get_mut(index) {
            *slot = value;
        }
    }
}

/// Decides whether code may call non-public members of a module.
pub trait AccessPolicy {
    fn has_waiver(&self, module: ModuleId) -> bool;
}

/// Access policy of ordinary code: the public surface only.
#[derive(Copy, Clone, Debug, Default)]
pub struct PublicOnly;

impl AccessPolicy for PublicOnly {
    fn has_waiver(&self, _module: ModuleId) -> bool {
        false
    }
}

/// Failure raised while calling a method.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    #[error("`{method}` requires an instance but none was supplied")]
    NullReference { method: String },

    #[error("`{method}` is not accessible from the calling code")]
    AccessDenied { method: String },

    #[error("`{method}` expects {expected} argument(s), got {found}")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("`{method}` expects {expected} generic argument(s), got {found}")]
    GenericArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("`{method}` has no implementation on `{receiver}`")]
    AbstractMethod { method: String, receiver: String },

    #[error("cannot convert a value of type `{from}` to `{to}`")]
    InvalidCast { from: String, to: String },

    /// A nested adapter could not be produced while forwarding.
    #[error("duck chaining failed: {message}")]
    Chain { message: String },

    /// Raised by a method body.
    #[error("{message}")]
    Target { message: String },
}

impl InvokeError {
    pub fn target(message: impl Into<String>) -> Self {
        InvokeError::Target {
            message: message.into(),
        }
    }
}
