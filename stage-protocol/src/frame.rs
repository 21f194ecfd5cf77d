//! Transport framing for records on the serial link
//!
//! Records have no delimiters or checksum of their own, so the firmware
//! wraps each one in a small frame:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-32)
//! - TYPE (1 byte): [`FRAME_COMMAND`] or [`FRAME_RESPONSE`]
//! - PAYLOAD (0-32 bytes): one record
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, and all PAYLOAD bytes

use heapless::Vec;

use crate::record::{CommandRecord, COMMAND_LEN, RESPONSE_LEN};

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Frame type: payload is a command record
pub const FRAME_COMMAND: u8 = 0x01;

/// Frame type: payload is a response record
pub const FRAME_RESPONSE: u8 = 0x02;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Bytes added around the payload (START + LENGTH + TYPE + CHECKSUM)
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

/// Encoded size of a frame carrying one response record
pub const RESPONSE_FRAME_SIZE: usize = FRAME_OVERHEAD + RESPONSE_LEN;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Length byte announces more than [`MAX_PAYLOAD_SIZE`]
    BadLength(u8),
    /// Checksum mismatch
    BadChecksum,
    /// Frame type does not match the expected record
    UnexpectedType(u8),
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// XOR checksum over the length, type and payload bytes
fn checksum(length: u8, msg_type: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ msg_type, |acc, byte| acc ^ byte)
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Frame carrying a command record
    pub fn command(record: &CommandRecord) -> Self {
        Self {
            msg_type: FRAME_COMMAND,
            payload: Vec::from_slice(&record.encode()).unwrap_or_default(),
        }
    }

    /// Frame carrying an encoded response record
    pub fn response(record: &[u8; RESPONSE_LEN]) -> Self {
        Self {
            msg_type: FRAME_RESPONSE,
            payload: Vec::from_slice(record).unwrap_or_default(),
        }
    }

    /// Payload of a command frame
    ///
    /// The payload is handed out as-is; record validation happens in the
    /// record decoder.
    pub fn command_payload(&self) -> Result<&[u8], FrameError> {
        if self.msg_type != FRAME_COMMAND {
            return Err(FrameError::UnexpectedType(self.msg_type));
        }
        Ok(&self.payload)
    }

    /// Payload of a response frame
    pub fn response_payload(&self) -> Result<&[u8], FrameError> {
        if self.msg_type != FRAME_RESPONSE {
            return Err(FrameError::UnexpectedType(self.msg_type));
        }
        Ok(&self.payload)
    }

    /// Encoded size of this frame in bytes
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        let out = buffer
            .get_mut(..frame_len)
            .ok_or(FrameError::BufferTooSmall)?;

        let length = self.payload.len() as u8;
        let (header, rest) = out.split_at_mut(3);
        header.copy_from_slice(&[FRAME_START, length, self.msg_type]);

        let (body, tail) = rest.split_at_mut(self.payload.len());
        body.copy_from_slice(&self.payload);
        tail[0] = checksum(length, self.msg_type, &self.payload);

        Ok(frame_len)
    }
}

/// Parser progress through the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Hunting for START
    Sync,
    /// Got START, next byte is LENGTH
    Length,
    /// Got LENGTH, next byte is TYPE
    Type,
    /// Collecting payload bytes
    Payload,
    /// Next byte is CHECKSUM
    Checksum,
}

/// Byte-at-a-time frame parser
///
/// Bytes outside a frame are skipped until the next START byte, so the
/// parser resynchronizes after line noise or a corrupted frame.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    length: u8,
    msg_type: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a parser waiting for a START byte
    pub const fn new() -> Self {
        Self {
            state: ParseState::Sync,
            length: 0,
            msg_type: 0,
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame and wait for the next START byte
    pub fn reset(&mut self) {
        self.state = ParseState::Sync;
        self.length = 0;
        self.msg_type = 0;
        self.payload.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when the current
    /// frame was rejected.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::Sync => {
                if byte == FRAME_START {
                    self.state = ParseState::Length;
                }
            }
            ParseState::Length => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::BadLength(byte));
                }
                self.length = byte;
                self.state = ParseState::Type;
            }
            ParseState::Type => {
                self.msg_type = byte;
                self.payload.clear();
                self.state = if self.length == 0 {
                    ParseState::Checksum
                } else {
                    ParseState::Payload
                };
            }
            ParseState::Payload => {
                // Capacity is guaranteed by the length check above
                let _ = self.payload.push(byte);
                if self.payload.len() == self.length as usize {
                    self.state = ParseState::Checksum;
                }
            }
            ParseState::Checksum => {
                let expected = checksum(self.length, self.msg_type, &self.payload);
                let frame = Frame {
                    msg_type: self.msg_type,
                    payload: core::mem::take(&mut self.payload),
                };
                self.reset();

                if byte != expected {
                    return Err(FrameError::BadChecksum);
                }
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

// Frame sizes must hold the records they carry
const _: () = assert!(COMMAND_LEN <= MAX_PAYLOAD_SIZE);
const _: () = assert!(RESPONSE_LEN <= MAX_PAYLOAD_SIZE);
