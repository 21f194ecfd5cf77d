//! Safety supervision
//!
//! Detects inactivity and paces command processing.

pub mod supervisor;

pub use supervisor::{ActivitySupervisor, SafetyStatus};
