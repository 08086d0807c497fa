//! Observability for the failover core
//!
//! Failover runs exactly when the rest of the system is least healthy, so
//! logging here is deliberately primitive:
//!
//! 1. Structured logs (JSON), one line = one event
//! 2. Synchronous writes, no buffering, no background threads
//! 3. Deterministic key ordering
//!
//! A failover attempt that cannot be reconstructed from its log lines is a
//! support case that cannot be closed.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
