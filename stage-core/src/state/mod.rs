//! Controller state and control mode
//!
//! The mode machine is explicit, finite and deterministic: the next mode
//! is a function of the current mode and an event.

pub mod controller;
pub mod machine;

pub use controller::ControllerState;
pub use machine::{manual_allowed, scheduled_motion_allowed, transition, ModeEvent, Transition};
