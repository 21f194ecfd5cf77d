//! Stage Command Protocol
//!
//! This crate defines the binary protocol between a host (the scan
//! orchestrator) and the stage controller. The host sends fixed-size
//! command records; the stage answers every command with exactly one
//! fixed-size response record carrying a full snapshot of both axes.
//!
//! # Protocol Overview
//!
//! ```text
//! Command (10 bytes)
//! ┌─────┬──────┬────────┬────────┐
//! │ CMD │ AXES │ PARAM1 │ PARAM2 │
//! │ 1B  │ 1B   │ i32 LE │ i32 LE │
//! └─────┴──────┴────────┴────────┘
//!
//! Response (23 bytes)
//! ┌────┬──────┬──────┬──────┬────────┬────────┬─────┬─────┬──────┬─────┬─────────┐
//! │ ID │ ECHO │ XPOS │ YPOS │ XSPEED │ YSPEED │ XRUN│ YRUN│ MODE │ SEQ │ PAYLOAD │
//! │ 1B │ 1B   │ i32  │ i32  │ i16    │ i16    │ 1B  │ 1B  │ 1B   │ u16 │ i32     │
//! └────┴──────┴──────┴──────┴────────┴────────┴─────┴─────┴──────┴─────┴─────────┘
//! ```
//!
//! Records are carried inside the transport frames of [`frame`] on the
//! serial link (115200 baud).

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod frame;
pub mod messages;
pub mod record;
pub mod sequence;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use messages::{Axis, AxisSelector, CommandKind, Mode, ResponseKind};
pub use record::{
    AxisSnapshot, CommandRecord, RecordError, Response, ResponseEncoder, ResponseRecord, Snapshot,
    COMMAND_LEN, RESPONSE_LEN,
};
pub use sequence::{SequenceCheck, SequenceTracker};

/// Serial line rate used by the stage
pub const BAUD_RATE: u32 = 115_200;
