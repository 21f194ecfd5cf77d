//! Typed commands
//!
//! A [`CommandRecord`] carries a raw id and two untyped parameters. Here it
//! is resolved into one variant per command kind holding only the fields
//! that kind uses.

use stage_protocol::{Axis, AxisSelector, CommandKind, CommandRecord};

/// Per-axis parameter values paired with the axes they apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisValues {
    pub axes: AxisSelector,
    pub x: i32,
    pub y: i32,
}

impl AxisValues {
    /// Take the selector and per-axis parameters from a record
    pub const fn from_record(record: &CommandRecord) -> Self {
        Self {
            axes: record.axes,
            x: record.param_for(Axis::X),
            y: record.param_for(Axis::Y),
        }
    }

    /// Value addressed to one axis
    pub const fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Iterate the selected axes with their values
    pub fn selected(&self) -> impl Iterator<Item = (Axis, i32)> + '_ {
        self.axes.axes().map(move |axis| (axis, self.get(axis)))
    }
}

/// A decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Move(AxisValues),
    MoveTo(AxisValues),
    SetSpeed(AxisValues),
    SetAcceleration(AxisValues),
    Home { axes: AxisSelector },
    Stop { axes: AxisSelector },
    /// Raw mode value, validated when applied
    SetMode { value: i32 },
    StatusRequest,
    Disable { axes: AxisSelector },
    Enable { axes: AxisSelector },
    Ping { value: i32 },
    /// Unrecognized command id
    Unknown { id: u8 },
}

impl From<&CommandRecord> for Command {
    fn from(record: &CommandRecord) -> Self {
        let values = AxisValues::from_record(record);
        let axes = record.axes;

        match record.kind() {
            Ok(CommandKind::Move) => Command::Move(values),
            Ok(CommandKind::MoveTo) => Command::MoveTo(values),
            Ok(CommandKind::SetSpeed) => Command::SetSpeed(values),
            Ok(CommandKind::SetAcceleration) => Command::SetAcceleration(values),
            Ok(CommandKind::Home) => Command::Home { axes },
            Ok(CommandKind::Stop) => Command::Stop { axes },
            Ok(CommandKind::SetMode) => Command::SetMode {
                value: record.param1,
            },
            Ok(CommandKind::StatusRequest) => Command::StatusRequest,
            Ok(CommandKind::Disable) => Command::Disable { axes },
            Ok(CommandKind::Enable) => Command::Enable { axes },
            Ok(CommandKind::Ping) => Command::Ping {
                value: record.param1,
            },
            Err(id) => Command::Unknown { id },
        }
    }
}
