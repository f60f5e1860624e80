//! Run-time synthesis of forwarding adapters ("duck proxies").
//!
//! Given a contract type the caller programs against and a target type only
//! discovered at run time, this crate decides which target member backs each
//! contract member and defines a proxy type whose overrides forward to the
//! target. Reverse adapters go the other way: an implementation type supplies
//! overrides for a base type it does not reference.
//!
//! The pipeline is `collect` -> `resolve` -> (`convert` + `dispatch`) ->
//! `synth`. [`GenerationContext`] ties it together and caches the resulting
//! [`AdapterFactory`] per (contract, target, mode).
//!
//! # Tracing
//!
//! Resolution and synthesis are instrumented with `tracing`. Call
//! [`init_tracing`] and run with `RUST_LOG=duck_proxy=debug` to see binding
//! decisions, or `=trace` for every rejected candidate.

mod adapter;
mod binding;
mod collect;
mod config;
mod context;
mod convert;
mod descriptor;
mod dispatch;
mod error;
mod resolve;
mod synth;

use std::sync::Once;

pub use adapter::{Adapter, AdapterFactory};
pub use binding::{Binding, BindingSet, GenericBinding, OutputRefSlot};
pub use collect::{contract_members, override_candidates, reverse_members, target_candidates};
pub use config::{DuckConfig, NO_ACCESS_WAIVERS_ENV, NO_CACHE_ENV};
pub use context::GenerationContext;
pub use convert::{needs_chaining, plan, ConversionPlan, Crossing};
pub use descriptor::{ContractMemberDescriptor, ProxyMode, TargetMemberCandidate};
pub use dispatch::{select_strategy, DispatchStrategy, ErasedSignature, GrantAccess, WaiverRegistry};
pub use error::DuckError;
pub use resolve::resolve_member;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
