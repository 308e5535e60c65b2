//! Core state for the NANDA agent service.
//!
//! Everything here is transport-agnostic: the HTTP layer owns a
//! [`session::SessionState`] behind a single lock and composes the
//! limiter, transformer, tool commands and memory store into responses.

pub mod memory;
pub mod rate_limit;
pub mod session;
pub mod tools;
pub mod transform;

pub use memory::{MemoryError, MemoryStore, Metrics, Note, PersistStats, PersistedMemory};
pub use rate_limit::FixedWindowLimiter;
pub use session::SessionState;
pub use tools::ToolCommand;
pub use transform::{transform, TAG};

fn since_epoch() -> std::time::Duration {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
}

/// Current wall-clock time as float epoch seconds.
pub fn epoch_secs_f64() -> f64 {
    since_epoch().as_secs_f64()
}

/// Current wall-clock time as whole epoch seconds.
pub fn epoch_secs() -> u64 {
    since_epoch().as_secs()
}
