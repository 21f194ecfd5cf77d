//! Control mode state machine
//!
//! The stage is either under manual joystick control or scripted serial
//! control. Only commands change the mode; timeouts never do.

use stage_protocol::Mode;

/// Events that can change the control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeEvent {
    /// Move, MoveTo or Home was dispatched
    MovementCommand,
    /// SetMode with a valid mode value
    Select(Mode),
}

/// Outcome of a mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    /// Mode after the event
    pub mode: Mode,
    /// Manual control must be reset (axes stopped, jog speeds cleared)
    pub reset_manual: bool,
}

/// Process an event and return the next mode
pub fn transition(current: Mode, event: ModeEvent) -> Transition {
    use Mode::*;
    use ModeEvent::*;

    let (mode, reset_manual) = match (current, event) {
        (_, MovementCommand) => (Serial, false),
        (_, Select(Serial)) => (Serial, false),
        // Selecting joystick always resets, even when already in joystick mode
        (_, Select(Joystick)) => (Joystick, true),
    };

    Transition { mode, reset_manual }
}

/// Check if the joystick may drive the axes in this mode
pub fn manual_allowed(mode: Mode) -> bool {
    mode == Mode::Joystick
}

/// Check if the motion scheduler drives the axes in this mode
pub fn scheduled_motion_allowed(mode: Mode) -> bool {
    mode == Mode::Serial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_forces_serial() {
        for mode in [Mode::Joystick, Mode::Serial] {
            let next = transition(mode, ModeEvent::MovementCommand);
            assert_eq!(next.mode, Mode::Serial);
            assert!(!next.reset_manual);
        }
    }

    #[test]
    fn test_select_serial() {
        let next = transition(Mode::Joystick, ModeEvent::Select(Mode::Serial));
        assert_eq!(next.mode, Mode::Serial);
        assert!(!next.reset_manual);
    }

    #[test]
    fn test_select_joystick_resets() {
        for mode in [Mode::Joystick, Mode::Serial] {
            let next = transition(mode, ModeEvent::Select(Mode::Joystick));
            assert_eq!(next.mode, Mode::Joystick);
            assert!(next.reset_manual);
        }
    }

    #[test]
    fn test_mode_permissions() {
        assert!(manual_allowed(Mode::Joystick));
        assert!(!manual_allowed(Mode::Serial));
        assert!(scheduled_motion_allowed(Mode::Serial));
        assert!(!scheduled_motion_allowed(Mode::Joystick));
    }
}
