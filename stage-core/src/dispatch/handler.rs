//! Command handlers

use stage_protocol::messages::{ERR_INVALID_MODE, ERR_UNKNOWN_COMMAND};
use stage_protocol::{Axis, AxisSelector, Mode, Response, Snapshot};

use super::command::{AxisValues, Command};
use crate::manual::ManualControl;
use crate::scheduler::MotionScheduler;
use crate::state::{ControllerState, ModeEvent};
use crate::traits::AxisEngine;

/// Result of applying one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Ok,
    Error(i32),
    Status,
    Ping(i32),
}

impl Reply {
    /// Build the response for this reply
    pub fn into_response(self, echoed_command: u8, snapshot: Snapshot) -> Response {
        match self {
            Reply::Ok => Response::ok(echoed_command, snapshot),
            Reply::Error(code) => Response::error(echoed_command, code, snapshot),
            Reply::Status => Response::status(echoed_command, snapshot),
            Reply::Ping(value) => Response::ping(echoed_command, value, snapshot),
        }
    }
}

/// Everything a command may act on
pub struct Target<'a, A: AxisEngine> {
    pub axes: &'a mut [A; 2],
    pub state: &'a mut ControllerState,
    pub manual: &'a mut ManualControl,
    pub scheduler: &'a MotionScheduler,
}

impl<'a, A: AxisEngine> Target<'a, A> {
    fn axis(&mut self, axis: Axis) -> &mut A {
        &mut self.axes[axis.index()]
    }

    fn for_each_selected(&mut self, axes: AxisSelector, mut f: impl FnMut(&mut A)) {
        for axis in axes.axes() {
            f(self.axis(axis));
        }
    }

    /// Apply a mode event, releasing the joystick when it loses control
    fn enter(&mut self, event: ModeEvent) {
        let previous = self.state.mode;
        let next = self.state.apply(event);

        if next.reset_manual {
            for engine in self.axes.iter_mut() {
                engine.stop();
            }
            self.manual.reset();
            self.state.large_move_in_progress = false;
        } else if previous == Mode::Joystick && next.mode != Mode::Joystick {
            self.manual.release(self.axes);
        }
    }

    fn enable_all(&mut self) {
        for engine in self.axes.iter_mut() {
            engine.enable();
        }
        self.state.motors_enabled = true;
    }

    fn start_moves(&mut self, values: &AxisValues, absolute: bool) {
        self.enter(ModeEvent::MovementCommand);
        self.enable_all();

        for (axis, value) in values.selected() {
            let engine = &mut self.axes[axis.index()];
            let distance = if absolute {
                value as i64 - engine.position() as i64
            } else {
                value as i64
            };

            if self.scheduler.is_large_move(distance) {
                self.state.large_move_in_progress = true;
            }

            if absolute {
                engine.move_to(value);
            } else {
                engine.move_by(value);
            }
        }
    }
}

/// Apply one command
///
/// Never fails: protocol errors come back as [`Reply::Error`].
pub fn apply<A: AxisEngine>(command: Command, target: &mut Target<'_, A>) -> Reply {
    match command {
        Command::Ping { value } => Reply::Ping(value),

        Command::Move(values) => {
            target.start_moves(&values, false);
            Reply::Ok
        }

        Command::MoveTo(values) => {
            target.start_moves(&values, true);
            Reply::Ok
        }

        Command::SetSpeed(values) => {
            for (axis, speed) in values.selected() {
                target.axis(axis).set_max_speed(speed);
            }
            Reply::Ok
        }

        Command::SetAcceleration(values) => {
            for (axis, accel) in values.selected() {
                target.axis(axis).set_acceleration(accel);
            }
            Reply::Ok
        }

        Command::Home { axes } => {
            target.enter(ModeEvent::MovementCommand);
            target.for_each_selected(axes, |engine| engine.zero());
            Reply::Ok
        }

        Command::Stop { axes } => {
            target.for_each_selected(axes, |engine| engine.stop());
            target.state.large_move_in_progress = false;
            // Joystick re-asserts its speed on the next sample
            target.manual.reset();
            Reply::Ok
        }

        Command::SetMode { value } => match Mode::from_wire(value) {
            Some(mode) => {
                target.enter(ModeEvent::Select(mode));
                Reply::Ok
            }
            None => Reply::Error(ERR_INVALID_MODE),
        },

        Command::StatusRequest => Reply::Status,

        Command::Disable { axes } => {
            target.for_each_selected(axes, |engine| engine.disable());
            if axes.is_both() {
                target.state.motors_enabled = false;
            }
            target.manual.reset();
            Reply::Ok
        }

        Command::Enable { axes } => {
            target.for_each_selected(axes, |engine| engine.enable());
            if axes.is_both() {
                target.state.motors_enabled = true;
            }
            target.manual.reset();
            Reply::Ok
        }

        Command::Unknown { .. } => Reply::Error(ERR_UNKNOWN_COMMAND),
    }
}
