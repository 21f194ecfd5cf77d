//! Configuration types
//!
//! Board-agnostic configuration structures, optionally deserializable
//! with serde for build-time validation.

pub mod types;

pub use types::*;
