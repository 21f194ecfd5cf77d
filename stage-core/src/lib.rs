//! Board-agnostic core logic for the two-axis stage controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Axis engine trait implemented by the stepper drivers
//! - Control mode state machine
//! - Command dispatcher
//! - Motion scheduler with large-move throttling
//! - Activity and safety supervision
//! - Joystick manual control
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod manual;
pub mod safety;
pub mod scheduler;
pub mod state;
pub mod traits;

#[cfg(test)]
mod mock;

pub use controller::{EncodedResponse, OfferError, StageController, TickReport};
