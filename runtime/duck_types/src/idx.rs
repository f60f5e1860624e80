//! Index handles into the [`TypeStore`](crate::TypeStore).
//!
//! Types, methods and modules are stored in flat append-only tables and
//! referenced by 32-bit indices. Well-known types are pre-registered at
//! fixed indices so they can be named without a store.

use std::fmt;

/// A 32-bit index into the type table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Well-known types (indices 0-7) ===
    // Registered by `TypeStore::new` in the core module.

    /// The universal object base type.
    pub const OBJECT: Self = Self(0);
    /// The void return type.
    pub const VOID: Self = Self(1);
    /// `bool`.
    pub const BOOL: Self = Self(2);
    /// 32-bit signed integer.
    pub const INT32: Self = Self(3);
    /// 64-bit signed integer.
    pub const INT64: Self = Self(4);
    /// 64-bit floating point.
    pub const FLOAT64: Self = Self(5);
    /// Immutable string (a sealed reference type).
    pub const STRING: Self = Self(6);
    /// The root capability marker implemented by every adapter.
    pub const DUCK_TYPE: Self = Self(7);

    /// Number of pre-registered types.
    pub const WELL_KNOWN_COUNT: u32 = 8;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is one of the pre-registered types.
    #[inline]
    pub const fn is_well_known(self) -> bool {
        self.0 < Self::WELL_KNOWN_COUNT
    }

    /// Name of a well-known type, or `None` for user types.
    pub const fn well_known_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("Object"),
            1 => Some("Void"),
            2 => Some("Boolean"),
            3 => Some("Int32"),
            4 => Some("Int64"),
            5 => Some("Double"),
            6 => Some("String"),
            7 => Some("IDuckType"),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.well_known_name() {
            Some(name) => write!(f, "TypeId({name})"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

/// A 32-bit index into the method table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct MethodId(u32);

impl MethodId {
    /// `IDuckType.GetInstance()`, registered after the four `Object` members.
    pub const DUCK_GET_INSTANCE: Self = Self(4);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A 32-bit index into the module table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    /// The core runtime module that defines the well-known types.
    pub const CORE: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_core(self) -> bool {
        self.0 == Self::CORE.0
    }
}
