//! Hardware abstraction traits
//!
//! These traits define the interface between the stage logic
//! and hardware-specific implementations.

pub mod axis;

pub use axis::{AxisEngine, TickOutcome};
