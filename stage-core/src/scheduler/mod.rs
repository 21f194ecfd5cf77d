//! Motion scheduling
//!
//! Balances stepping throughput against command responsiveness.

pub mod motion;

pub use motion::{advance, CycleReport, MotionScheduler, TickBudget};
