//! Wire identifiers for the stage protocol
//!
//! Identifiers are divided into three groups:
//! - Host → Stage: command ids carried in the first byte of a command record
//! - Stage → Host: response ids carried in the first byte of a response record
//! - Shared values: control modes, axis selection bits, error codes

// Command ids: Host → Stage
pub const CMD_MOVE: u8 = 1;
pub const CMD_MOVE_TO: u8 = 2;
pub const CMD_SET_SPEED: u8 = 3;
pub const CMD_SET_ACCELERATION: u8 = 4;
pub const CMD_HOME: u8 = 5;
pub const CMD_STOP: u8 = 6;
pub const CMD_SET_MODE: u8 = 7;
pub const CMD_STATUS: u8 = 8;
pub const CMD_DISABLE: u8 = 9;
pub const CMD_ENABLE: u8 = 10;
pub const CMD_PING: u8 = 11;

// Response ids: Stage → Host
pub const RESP_OK: u8 = 1;
pub const RESP_ERROR: u8 = 2;
pub const RESP_STATUS: u8 = 3;
pub const RESP_POSITION: u8 = 4;
pub const RESP_PING: u8 = 5;

/// Error code: SetMode carried a value that is not a mode
pub const ERR_INVALID_MODE: i32 = 1;

/// Error code: command id not recognized
pub const ERR_UNKNOWN_COMMAND: i32 = 2;

/// Echoed command value used for unsolicited status broadcasts
pub const ECHO_UNSOLICITED: u8 = 0;

/// Command kinds understood by the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandKind {
    /// Relative move by param1 (X) / param2 (Y) steps
    Move = CMD_MOVE,
    /// Absolute move to param1 (X) / param2 (Y)
    MoveTo = CMD_MOVE_TO,
    /// Maximum speed in steps/s
    SetSpeed = CMD_SET_SPEED,
    /// Acceleration in steps/s²
    SetAcceleration = CMD_SET_ACCELERATION,
    /// Declare the current position zero
    Home = CMD_HOME,
    /// Halt immediately
    Stop = CMD_STOP,
    /// Switch between joystick and serial control
    SetMode = CMD_SET_MODE,
    /// Read-only status request
    StatusRequest = CMD_STATUS,
    /// De-energize outputs
    Disable = CMD_DISABLE,
    /// Energize outputs
    Enable = CMD_ENABLE,
    /// Link check, echoes param1
    Ping = CMD_PING,
}

impl TryFrom<u8> for CommandKind {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            CMD_MOVE => Ok(CommandKind::Move),
            CMD_MOVE_TO => Ok(CommandKind::MoveTo),
            CMD_SET_SPEED => Ok(CommandKind::SetSpeed),
            CMD_SET_ACCELERATION => Ok(CommandKind::SetAcceleration),
            CMD_HOME => Ok(CommandKind::Home),
            CMD_STOP => Ok(CommandKind::Stop),
            CMD_SET_MODE => Ok(CommandKind::SetMode),
            CMD_STATUS => Ok(CommandKind::StatusRequest),
            CMD_DISABLE => Ok(CommandKind::Disable),
            CMD_ENABLE => Ok(CommandKind::Enable),
            CMD_PING => Ok(CommandKind::Ping),
            other => Err(other),
        }
    }
}

/// Response kinds produced by the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ResponseKind {
    Ok = RESP_OK,
    Error = RESP_ERROR,
    Status = RESP_STATUS,
    Position = RESP_POSITION,
    Ping = RESP_PING,
}

impl TryFrom<u8> for ResponseKind {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, u8> {
        match id {
            RESP_OK => Ok(ResponseKind::Ok),
            RESP_ERROR => Ok(ResponseKind::Error),
            RESP_STATUS => Ok(ResponseKind::Status),
            RESP_POSITION => Ok(ResponseKind::Position),
            RESP_PING => Ok(ResponseKind::Ping),
            other => Err(other),
        }
    }
}

/// Which input source drives the axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Manual control from the analog joystick
    #[default]
    Joystick = 0,
    /// Scripted control from the host command stream
    Serial = 1,
}

impl Mode {
    /// Parse a mode from a command parameter
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Mode::Joystick),
            1 => Some(Mode::Serial),
            _ => None,
        }
    }

    /// Wire byte for this mode
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

/// One physical stage axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Both axes in selector bit order
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Array index for per-axis storage
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Axis selection mask carried in every command
///
/// Bit 0 selects X, bit 1 selects Y. Higher bits are preserved but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSelector(pub u8);

impl AxisSelector {
    pub const NONE: AxisSelector = AxisSelector(0);
    pub const X: AxisSelector = AxisSelector(0b01);
    pub const Y: AxisSelector = AxisSelector(0b10);
    pub const BOTH: AxisSelector = AxisSelector(0b11);

    /// Check whether an axis is selected
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// Check whether both X and Y are selected
    pub const fn is_both(self) -> bool {
        self.0 & Self::BOTH.0 == Self::BOTH.0
    }

    /// Iterate over the selected axes in X, Y order
    pub fn axes(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |axis| self.contains(*axis))
    }
}
