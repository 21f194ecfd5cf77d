//! Controller-wide state shared by the dispatcher, scheduler and supervisor

use stage_protocol::Mode;

use super::machine::{transition, ModeEvent, Transition};

/// Process-wide controller state
///
/// Created once at startup in joystick mode with motors disabled and
/// mutated only from within the control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    /// Current control mode
    pub mode: Mode,
    /// Both axes' outputs are energized
    pub motors_enabled: bool,
    /// A move above the large-move threshold is still running
    pub large_move_in_progress: bool,
}

impl ControllerState {
    /// Startup state
    pub const fn new() -> Self {
        Self {
            mode: Mode::Joystick,
            motors_enabled: false,
            large_move_in_progress: false,
        }
    }

    /// Apply a mode event, returning the transition taken
    pub fn apply(&mut self, event: ModeEvent) -> Transition {
        let next = transition(self.mode, event);
        self.mode = next.mode;
        next
    }
}
