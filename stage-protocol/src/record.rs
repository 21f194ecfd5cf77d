//! Fixed-layout command and response records
//!
//! Command record (10 bytes):
//! - cmd (u8), axis selector (u8), param1 (i32), param2 (i32)
//!
//! Response record (23 bytes):
//! - id (u8), echoed command (u8)
//! - X position (i32), Y position (i32), X speed (i16), Y speed (i16)
//! - X running (u8), Y running (u8), mode (u8)
//! - sequence (u16), payload (i32)
//!
//! All multi-byte fields are little-endian. Records carry no checksum;
//! integrity belongs to the transport framing around them.

use crate::messages::{
    Axis, AxisSelector, CommandKind, Mode, ResponseKind, ECHO_UNSOLICITED,
};

/// Encoded command record size in bytes
pub const COMMAND_LEN: usize = 10;

/// Encoded response record size in bytes
pub const RESPONSE_LEN: usize = 23;

/// Errors that can occur while decoding a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Fewer bytes than the record layout requires
    Truncated,
    /// Response id is not a known response kind
    UnknownKind(u8),
    /// Mode byte is not a known mode
    InvalidMode(u8),
}

/// Little-endian reader over a record buffer
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], required: usize) -> Result<Self, RecordError> {
        if bytes.len() < required {
            return Err(RecordError::Truncated);
        }
        Ok(Self { bytes, pos: 0 })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    fn flag(&mut self) -> bool {
        self.u8() != 0
    }
}

/// Little-endian writer into a fixed record buffer
struct Writer<const N: usize> {
    bytes: [u8; N],
    pos: usize,
}

impl<const N: usize> Writer<N> {
    fn new() -> Self {
        Self {
            bytes: [0u8; N],
            pos: 0,
        }
    }

    fn put(&mut self, data: &[u8]) -> &mut Self {
        self.bytes[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        self
    }

    fn u8(&mut self, value: u8) -> &mut Self {
        self.put(&[value])
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    fn i16(&mut self, value: i16) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    fn i32(&mut self, value: i32) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    fn flag(&mut self, value: bool) -> &mut Self {
        self.u8(value as u8)
    }

    fn finish(&self) -> [u8; N] {
        debug_assert_eq!(self.pos, N);
        self.bytes
    }
}

/// A decoded command record
///
/// The command id is kept raw so that unknown ids still produce a
/// response echoing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRecord {
    /// Raw command id
    pub cmd: u8,
    /// Selected axes
    pub axes: AxisSelector,
    /// First parameter (X value for per-axis commands)
    pub param1: i32,
    /// Second parameter (Y value for per-axis commands)
    pub param2: i32,
}

impl CommandRecord {
    /// Create a record for a known command kind
    pub const fn new(kind: CommandKind, axes: AxisSelector, param1: i32, param2: i32) -> Self {
        Self {
            cmd: kind as u8,
            axes,
            param1,
            param2,
        }
    }

    /// Resolve the command kind, returning the raw id if unknown
    pub fn kind(&self) -> Result<CommandKind, u8> {
        CommandKind::try_from(self.cmd)
    }

    /// Parameter addressed to one axis (param1 for X, param2 for Y)
    pub const fn param_for(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.param1,
            Axis::Y => self.param2,
        }
    }

    /// Decode a command record
    ///
    /// Bytes past the record length are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut r = Reader::new(bytes, COMMAND_LEN)?;
        Ok(Self {
            cmd: r.u8(),
            axes: AxisSelector(r.u8()),
            param1: r.i32(),
            param2: r.i32(),
        })
    }

    /// Encode this record (host side and tests)
    pub fn encode(&self) -> [u8; COMMAND_LEN] {
        Writer::<COMMAND_LEN>::new()
            .u8(self.cmd)
            .u8(self.axes.0)
            .i32(self.param1)
            .i32(self.param2)
            .finish()
    }
}

/// State of one axis as reported in every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSnapshot {
    /// Absolute position in steps
    pub position: i32,
    /// Current speed in steps/s
    pub speed: i16,
    /// Axis has motion pending
    pub running: bool,
}

impl AxisSnapshot {
    /// Build a snapshot, saturating the speed into the wire range
    pub fn new(position: i32, speed: i32, running: bool) -> Self {
        Self {
            position,
            speed: speed_to_wire(speed),
            running,
        }
    }
}

/// Narrow an engine speed to the i16 wire field without wrapping
pub fn speed_to_wire(speed: i32) -> i16 {
    speed.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Full controller snapshot carried by every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub x: AxisSnapshot,
    pub y: AxisSnapshot,
    pub mode: Mode,
}

impl Snapshot {
    /// Snapshot of a single axis
    pub fn axis(&self, axis: Axis) -> &AxisSnapshot {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

/// A response ready to be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub kind: ResponseKind,
    pub echoed_command: u8,
    pub snapshot: Snapshot,
    pub payload: i32,
}

impl Response {
    /// Successful command
    pub const fn ok(echoed_command: u8, snapshot: Snapshot) -> Self {
        Self {
            kind: ResponseKind::Ok,
            echoed_command,
            snapshot,
            payload: 0,
        }
    }

    /// Rejected command with an error code
    pub const fn error(echoed_command: u8, code: i32, snapshot: Snapshot) -> Self {
        Self {
            kind: ResponseKind::Error,
            echoed_command,
            snapshot,
            payload: code,
        }
    }

    /// Status reply
    pub const fn status(echoed_command: u8, snapshot: Snapshot) -> Self {
        Self {
            kind: ResponseKind::Status,
            echoed_command,
            snapshot,
            payload: 0,
        }
    }

    /// Periodic status broadcast not tied to any command
    pub const fn broadcast(snapshot: Snapshot) -> Self {
        Self::status(ECHO_UNSOLICITED, snapshot)
    }

    /// Ping reply echoing the host's value
    pub const fn ping(echoed_command: u8, value: i32, snapshot: Snapshot) -> Self {
        Self {
            kind: ResponseKind::Ping,
            echoed_command,
            snapshot,
            payload: value,
        }
    }
}

/// Response encoder owning the sequence counter
///
/// Every call to [`ResponseEncoder::encode`] stamps the current sequence
/// number and advances it by one, wrapping at 65536.
#[derive(Debug, Clone, Default)]
pub struct ResponseEncoder {
    sequence: u16,
}

impl ResponseEncoder {
    /// Create an encoder starting at sequence 0
    pub const fn new() -> Self {
        Self { sequence: 0 }
    }

    /// Sequence number the next encoded response will carry
    pub fn next_sequence(&self) -> u16 {
        self.sequence
    }

    /// Encode a response and advance the sequence counter
    pub fn encode(&mut self, response: &Response) -> [u8; RESPONSE_LEN] {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let s = &response.snapshot;
        Writer::<RESPONSE_LEN>::new()
            .u8(response.kind as u8)
            .u8(response.echoed_command)
            .i32(s.x.position)
            .i32(s.y.position)
            .i16(s.x.speed)
            .i16(s.y.speed)
            .flag(s.x.running)
            .flag(s.y.running)
            .u8(s.mode.to_byte())
            .u16(sequence)
            .i32(response.payload)
            .finish()
    }
}

/// A decoded response record (host side and tests)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseRecord {
    pub kind: ResponseKind,
    pub echoed_command: u8,
    pub snapshot: Snapshot,
    pub sequence: u16,
    pub payload: i32,
}

impl ResponseRecord {
    /// Decode a response record
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut r = Reader::new(bytes, RESPONSE_LEN)?;

        let id = r.u8();
        let kind = ResponseKind::try_from(id).map_err(RecordError::UnknownKind)?;
        let echoed_command = r.u8();

        let x_position = r.i32();
        let y_position = r.i32();
        let x_speed = r.i16();
        let y_speed = r.i16();
        let x_running = r.flag();
        let y_running = r.flag();

        let mode_byte = r.u8();
        let mode = Mode::from_wire(mode_byte as i32).ok_or(RecordError::InvalidMode(mode_byte))?;

        Ok(Self {
            kind,
            echoed_command,
            snapshot: Snapshot {
                x: AxisSnapshot {
                    position: x_position,
                    speed: x_speed,
                    running: x_running,
                },
                y: AxisSnapshot {
                    position: y_position,
                    speed: y_speed,
                    running: y_running,
                },
                mode,
            },
            sequence: r.u16(),
            payload: r.i32(),
        })
    }
}
