//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in stage-core, written against `embedded-hal` 1.0:
//!
//! - Stepper axes driven through STEP/DIR/ENABLE lines
//! - Debounced push-button input
//! - Joystick ADC scaling

#![no_std]
#![deny(unsafe_code)]

pub mod input;
pub mod joystick;
pub mod stepper;
