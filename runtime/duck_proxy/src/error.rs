//! Resolution and synthesis failures.
//!
//! Every error aborts the whole resolve/synthesize call for its
//! (contract, target) pair; there is no partial adapter. Errors are `Clone`
//! so the adapter cache can hand the same failure to every requester.

/// Failure to bind or synthesize an adapter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DuckError {
    /// No candidate matched a contract member.
    #[error("no member of `{target}` matches `{member}`")]
    MemberNotFound { member: String, target: String },

    /// More than one indistinguishable candidate matched.
    #[error("`{member}` matches more than one member of `{target}`: {}", candidates.join(", "))]
    AmbiguousMatch {
        member: String,
        target: String,
        /// Every surviving candidate, for diagnostics.
        candidates: Vec<String>,
    },

    /// Parameter count, direction or by-ref shape disagree, or generic
    /// arguments cannot be supplied.
    #[error("`{member}` cannot bind to `{candidate}`: {reason}")]
    SignatureMismatch {
        member: String,
        candidate: String,
        reason: String,
    },

    /// One side returns void and the other does not.
    #[error("`{member}` and `{candidate}` disagree on whether a value is returned")]
    ReturnTypeMismatch { member: String, candidate: String },

    /// A generic target member is reachable only through indirect dispatch.
    #[error("generic member `{candidate}` is not directly callable and cannot be dispatched indirectly")]
    UnsupportedGenericInIndirectDispatch { candidate: String },

    /// A reverse-only member was used in a forward binding, or the other
    /// way around.
    #[error("`{member}` used incorrectly: {reason}")]
    IncorrectReverseMethodUsage { member: String, reason: String },

    #[error("`{member}` declares {found} generic parameter(s) but `{candidate}` has {expected}")]
    ReverseGenericArityMismatch {
        member: String,
        candidate: String,
        expected: usize,
        found: usize,
    },

    /// Abstract base members no reverse member binds to, reported together.
    #[error("`{base}` has no implementation for: {}", members.join(", "))]
    ReverseMissingImplementation { base: String, members: Vec<String> },

    #[error("`{member}` lists {found} parameter type name(s) but declares {expected} parameter(s)")]
    ReverseAttributeParameterCountMismatch {
        member: String,
        expected: usize,
        found: usize,
    },

    /// A type named in a member annotation could not be found where it is
    /// required.
    #[error("type `{name}` named by `{member}` was not found")]
    TypeNotFound { name: String, member: String },

    /// The contract (or reverse base) cannot be proxied.
    #[error("`{contract}` cannot be used as a contract: {reason}")]
    InvalidContract { contract: String, reason: String },

    /// An adapter was requested over a null instance.
    #[error("cannot create an adapter for `{contract}` over null")]
    NullInstance { contract: String },

    /// The instance is not of the type the factory was built for.
    #[error("adapter expects an instance of `{expected}`, got `{found}`")]
    InstanceMismatch { expected: String, found: String },
}
