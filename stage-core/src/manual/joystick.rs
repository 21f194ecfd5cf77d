//! Joystick control adapter
//!
//! Maps analog joystick readings to continuous per-axis speeds and toggles
//! the motor outputs on button presses.

use stage_protocol::Axis;

use crate::config::JoystickConfig;
use crate::scheduler::{advance, TickBudget};
use crate::state::ControllerState;
use crate::traits::AxisEngine;

/// One joystick reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickSample {
    /// X reading, 10-bit
    pub x: u16,
    /// Y reading, 10-bit
    pub y: u16,
    /// Button is held down
    pub button_pressed: bool,
}

impl JoystickSample {
    /// Stick at rest, button released
    pub const fn centered(center: u16) -> Self {
        Self {
            x: center,
            y: center,
            button_pressed: false,
        }
    }

    fn reading(&self, axis: Axis) -> u16 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// What happened when a sample was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManualOutcome {
    /// Any speed nonzero, any speed changed, or a button edge
    pub activity: bool,
    /// The button toggled the motors this sample
    pub toggled: Option<bool>,
}

/// Manual control state
#[derive(Debug, Clone)]
pub struct ManualControl {
    config: JoystickConfig,
    /// Speeds last commanded to each axis (X, Y)
    speeds: [i32; 2],
    /// Button level at the previous sample
    button_was_pressed: bool,
}

impl Default for ManualControl {
    fn default() -> Self {
        Self::new(JoystickConfig::default())
    }
}

impl ManualControl {
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            config,
            speeds: [0; 2],
            button_was_pressed: false,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &JoystickConfig {
        &self.config
    }

    /// Speed currently commanded to an axis
    pub fn speed(&self, axis: Axis) -> i32 {
        self.speeds[axis.index()]
    }

    /// Map a reading to a signed speed
    ///
    /// Readings inside the deadzone give 0. At the deadzone edge the speed
    /// is `min_speed`, rising linearly to `max_speed` at full deflection.
    pub fn speed_for(&self, reading: u16) -> i32 {
        let c = &self.config;
        let offset = reading as i32 - c.center as i32;
        let magnitude = offset.abs();
        let deadzone = c.deadzone as i32;

        if magnitude < deadzone {
            return 0;
        }

        let travel = if offset > 0 {
            c.full_scale as i32 - c.center as i32
        } else {
            c.center as i32
        };
        let span = (travel - deadzone).max(1);
        let range = c.max_speed - c.min_speed;

        let scaled = c.min_speed + (magnitude - deadzone) * range / span;
        scaled.min(c.max_speed) * offset.signum()
    }

    /// Zero the manual speed state without touching the axes
    pub fn reset(&mut self) {
        self.speeds = [0; 2];
    }

    /// End any joystick motion and zero the speed state
    pub fn release<A: AxisEngine>(&mut self, axes: &mut [A; 2]) {
        for axis in Axis::ALL {
            if self.speeds[axis.index()] != 0 {
                axes[axis.index()].run_at(0);
            }
        }
        self.reset();
    }

    /// Track the button level without acting on it
    ///
    /// Keeps edge detection current while another mode owns the axes, so a
    /// button already held when joystick mode resumes is not a new press.
    pub fn observe_button(&mut self, sample: &JoystickSample) {
        self.button_was_pressed = sample.button_pressed;
    }

    /// Apply a joystick sample
    ///
    /// A button press toggles both axes' outputs. While motors are enabled
    /// each axis runs continuously at the mapped speed; disabled motors are
    /// never driven.
    pub fn apply<A: AxisEngine>(
        &mut self,
        sample: &JoystickSample,
        axes: &mut [A; 2],
        state: &mut ControllerState,
    ) -> ManualOutcome {
        let mut outcome = ManualOutcome::default();

        let pressed_edge = sample.button_pressed && !self.button_was_pressed;
        self.button_was_pressed = sample.button_pressed;

        if pressed_edge {
            let enable = !state.motors_enabled;
            for engine in axes.iter_mut() {
                if enable {
                    engine.enable();
                } else {
                    engine.disable();
                }
            }
            state.motors_enabled = enable;
            // Outputs were just switched; re-issue speeds from scratch
            self.speeds = [0; 2];
            outcome.toggled = Some(enable);
            outcome.activity = true;
        }

        for axis in Axis::ALL {
            let speed = self.speed_for(sample.reading(axis));
            let previous = self.speeds[axis.index()];

            if speed != 0 || speed != previous {
                outcome.activity = true;
            }

            if state.motors_enabled && speed != previous {
                axes[axis.index()].run_at(speed);
                self.speeds[axis.index()] = speed;
            }
        }

        outcome
    }

    /// Step the axes that are jogging
    pub fn drive<A: AxisEngine>(&self, axes: &mut [A; 2], now_us: u64, max_ticks: u16) {
        for axis in Axis::ALL {
            if self.speeds[axis.index()] != 0 {
                advance(&mut axes[axis.index()], now_us, TickBudget::Drain(max_ticks));
            }
        }
    }
}
