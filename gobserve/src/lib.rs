//! Observability hooks for country resolution and dialogue turns.
//!
//! ```rust
//! use gobserve::{
//!     MetricsObservabilityHooks, SafeDialogueHooks, SafeResolverHooks, TracingObservabilityHooks,
//! };
//!
//! let _resolver_hooks = SafeResolverHooks::new(TracingObservabilityHooks);
//! let _dialogue_hooks = SafeDialogueHooks::new(MetricsObservabilityHooks);
//! ```

mod combined;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use combined::ObservabilityHooks;
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeDialogueHooks, SafeResolverHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, ObservabilityHooks, SafeDialogueHooks, SafeResolverHooks,
        TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
