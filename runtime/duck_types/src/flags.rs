//! Metadata flag sets.
//!
//! Flags are fixed when a type or method is defined and never recomputed,
//! so queries like "is this method overridable" are a single mask test.

use bitflags::bitflags;

bitflags! {
    /// Properties of a type definition.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u16 {
        /// Cannot be instantiated; may declare abstract members.
        const ABSTRACT = 1 << 0;
        /// Cannot be derived from.
        const SEALED = 1 << 1;
        /// Values crossing an adapter boundary into this shape are copied
        /// field by field instead of being duck chained.
        const DUCK_COPY = 1 << 2;
    }
}

bitflags! {
    /// Properties of a method definition.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MethodFlags: u16 {
        const STATIC = 1 << 0;
        const VIRTUAL = 1 << 1;
        const ABSTRACT = 1 << 2;
        /// Virtual but not further overridable.
        const FINAL = 1 << 3;
        /// Compiler-reserved name (accessors, operators, constructors).
        const SPECIAL_NAME = 1 << 4;
    }
}

impl MethodFlags {
    /// Check if a derived type may override this method.
    #[inline]
    pub const fn is_overridable(self) -> bool {
        self.intersects(Self::VIRTUAL.union(Self::ABSTRACT)) && !self.contains(Self::FINAL)
    }
}

bitflags! {
    /// Restricts which members a name/signature lookup may return.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct BindingScope: u8 {
        const INSTANCE = 1 << 0;
        const STATIC = 1 << 1;
        const PUBLIC = 1 << 2;
        const NON_PUBLIC = 1 << 3;
    }
}

impl BindingScope {
    /// Everything: instance and static, public and non-public.
    pub const ALL: Self = Self::all();
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::ALL
    }
}

bitflags! {
    /// Boolean switches carried by member annotations.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct AnnotationFlags: u8 {
        /// Never bind this member.
        const IGNORE = 1 << 0;
        /// Bind this member even if it is inherited from the object base.
        const INCLUDE = 1 << 1;
        /// The member is an override supplied for a reverse adapter.
        const REVERSE = 1 << 2;
    }
}

#[cfg(test)]
mod tests;
