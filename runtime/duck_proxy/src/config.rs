//! Generation settings.

use std::ffi::OsString;

/// Environment variable that disables access waivers.
pub const NO_ACCESS_WAIVERS_ENV: &str = "DUCK_NO_ACCESS_WAIVERS";
/// Environment variable that disables the adapter cache.
pub const NO_CACHE_ENV: &str = "DUCK_NO_CACHE";

/// Settings for a [`GenerationContext`](crate::GenerationContext).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuckConfig {
    /// Request access waivers for modules that allow them. When off, every
    /// non-public target member goes through indirect dispatch.
    pub access_waivers: bool,
    /// Reuse adapter factories per (contract, target, mode).
    pub cache_adapters: bool,
}

impl Default for DuckConfig {
    fn default() -> Self {
        DuckConfig {
            access_waivers: true,
            cache_adapters: true,
        }
    }
}

impl DuckConfig {
    /// Defaults overridden by `DUCK_NO_ACCESS_WAIVERS` and `DUCK_NO_CACHE`.
    ///
    /// A variable counts as set unless it is empty, `0` or `false`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let is_set = |key: &str| {
            lookup(key).is_some_and(|v| !matches!(v.to_str(), Some("" | "0" | "false")))
        };
        DuckConfig {
            access_waivers: !is_set(NO_ACCESS_WAIVERS_ENV),
            cache_adapters: !is_set(NO_CACHE_ENV),
        }
    }

    #[must_use]
    pub fn with_access_waivers(mut self, enabled: bool) -> Self {
        self.access_waivers = enabled;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_adapters = enabled;
        self
    }
}
