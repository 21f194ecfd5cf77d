//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use stage_core::EncodedResponse;
use stage_protocol::MAX_PAYLOAD_SIZE;

/// Command record bytes as received in a frame
pub type CommandBytes = Vec<u8, MAX_PAYLOAD_SIZE>;

/// Single slot: a command arriving while one is waiting is dropped
const COMMAND_CHANNEL_SIZE: usize = 1;

/// Replies and broadcasts waiting for the UART
const RESPONSE_CHANNEL_SIZE: usize = 4;

/// Command records from the host, consumed by the control task
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, CommandBytes, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Encoded responses to send to the host
pub static RESPONSE_CHANNEL: Channel<
    CriticalSectionRawMutex,
    EncodedResponse,
    RESPONSE_CHANNEL_SIZE,
> = Channel::new();
