//! Step/direction stepper axis
//!
//! Drives a stepper driver (A4988, DRV8825, TMC2209 in standalone mode...)
//! through three GPIO lines: STEP, DIR and an enable line.
//!
//! # Motion model
//!
//! Positioning moves follow a trapezoidal profile computed per step in
//! integer arithmetic. After each step the squared speed is raised or
//! lowered by `2 * acceleration` (the kinematic relation for one step of
//! travel), and the axis starts to decelerate once the stopping distance
//! `v² / 2a` reaches the remaining distance.
//!
//! Continuous motion (joystick) runs at a constant commanded speed with no
//! ramp.
//!
//! Timing resolution is that of the caller's `tick` cadence: a step is
//! taken when `now_us` has reached the next step deadline.

use embedded_hal::digital::OutputPin;
use stage_core::traits::{AxisEngine, TickOutcome};

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Default maximum speed in steps/s
pub const DEFAULT_MAX_SPEED: u32 = 1000;

/// Default acceleration in steps/s²
pub const DEFAULT_ACCELERATION: u32 = 500;

/// Largest speed limit that still fits a signed speed
const SPEED_LIMIT: u32 = i32::MAX as u32;

/// Enable line polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnablePolarity {
    /// Outputs energized when the line is low (most driver boards)
    ActiveLow,
    /// Outputs energized when the line is high
    ActiveHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    /// Ramp toward `target`
    Positioning,
    /// Constant signed speed
    Continuous(i32),
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // Newton iteration from an upper bound
    let mut x = 1u64 << ((64 - n.leading_zeros()) / 2 + 1);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Stepper axis driven through STEP/DIR/ENABLE pins
pub struct StepDirAxis<S, D, E> {
    step: S,
    dir: D,
    enable: E,
    polarity: EnablePolarity,
    /// Invert the DIR line
    invert_dir: bool,

    position: i32,
    target: i32,
    motion: Motion,
    /// Signed current speed in steps/s
    speed: i32,
    max_speed: u32,
    acceleration: u32,
    next_step_us: u64,
    /// Direction the DIR line currently selects
    dir_positive: Option<bool>,
    enabled: bool,
    pin_errors: u32,
}

impl<S, D, E> StepDirAxis<S, D, E>
where
    S: OutputPin,
    D: OutputPin,
    E: OutputPin,
{
    /// Create an axis with an active-low enable line
    ///
    /// Outputs start de-energized.
    pub fn new(step: S, dir: D, enable: E) -> Self {
        Self::with_polarity(step, dir, enable, EnablePolarity::ActiveLow)
    }

    /// Create an axis with the given enable polarity
    pub fn with_polarity(step: S, dir: D, enable: E, polarity: EnablePolarity) -> Self {
        let mut axis = Self {
            step,
            dir,
            enable,
            polarity,
            invert_dir: false,
            position: 0,
            target: 0,
            motion: Motion::Positioning,
            speed: 0,
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            next_step_us: 0,
            dir_positive: None,
            enabled: false,
            pin_errors: 0,
        };
        let result = axis.step.set_low();
        axis.check(result);
        axis.write_enable(false);
        axis
    }

    /// Invert the direction line (motor wired the other way round)
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_dir = invert;
        self
    }

    /// Number of failed pin writes since creation
    pub fn pin_errors(&self) -> u32 {
        self.pin_errors
    }

    /// Maximum speed in steps/s
    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    /// Acceleration in steps/s²
    pub fn acceleration(&self) -> u32 {
        self.acceleration
    }

    /// Give back the pins
    pub fn release(self) -> (S, D, E) {
        (self.step, self.dir, self.enable)
    }

    fn check<Err>(&mut self, result: Result<(), Err>) {
        if result.is_err() {
            self.pin_errors = self.pin_errors.saturating_add(1);
        }
    }

    fn write_enable(&mut self, on: bool) {
        let high = match self.polarity {
            EnablePolarity::ActiveLow => !on,
            EnablePolarity::ActiveHigh => on,
        };
        let result = if high {
            self.enable.set_high()
        } else {
            self.enable.set_low()
        };
        self.check(result);
    }

    fn write_dir(&mut self, positive: bool) {
        if self.dir_positive == Some(positive) {
            return;
        }
        let result = if positive != self.invert_dir {
            self.dir.set_high()
        } else {
            self.dir.set_low()
        };
        self.check(result);
        self.dir_positive = Some(positive);
    }

    fn pulse(&mut self, positive: bool) {
        self.write_dir(positive);
        let result = self.step.set_high();
        self.check(result);
        let result = self.step.set_low();
        self.check(result);

        self.position = if positive {
            self.position.wrapping_add(1)
        } else {
            self.position.wrapping_sub(1)
        };
    }

    /// Speed reached one step from rest
    fn start_speed(&self) -> u32 {
        let v0 = isqrt(2 * self.acceleration as u64) as u32;
        v0.clamp(1, self.max_speed)
    }

    fn distance_to_go(&self) -> i64 {
        self.target as i64 - self.position as i64
    }

    /// Speed for the step after the one just taken
    fn next_speed(&self) -> i32 {
        match self.motion {
            Motion::Continuous(speed) => speed,
            Motion::Positioning => {
                let remaining = self.distance_to_go();
                if remaining == 0 {
                    return 0;
                }

                let v = self.speed.unsigned_abs() as u64;
                let two_a = 2 * self.acceleration as u64;
                let max = self.max_speed as u64;
                let v0 = self.start_speed() as u64;
                let toward = (self.speed > 0) == (remaining > 0);
                let stopping = v * v / two_a;

                let v2 = if !toward || stopping >= remaining.unsigned_abs() {
                    (v * v).saturating_sub(two_a)
                } else {
                    (v * v + two_a).min(max * max)
                };
                let mut next = isqrt(v2);

                if !toward && next < v0 {
                    // Stopped while moving away: reverse
                    return v0 as i32 * remaining.signum() as i32;
                }
                next = next.clamp(v0, max);
                next as i32 * self.speed.signum()
            }
        }
    }
}

impl<S, D, E> AxisEngine for StepDirAxis<S, D, E>
where
    S: OutputPin,
    D: OutputPin,
    E: OutputPin,
{
    fn move_by(&mut self, delta: i32) {
        self.move_to(self.position.saturating_add(delta));
    }

    fn move_to(&mut self, target: i32) {
        if let Motion::Continuous(_) = self.motion {
            self.speed = 0;
        }
        self.motion = Motion::Positioning;
        self.target = target;
    }

    fn set_max_speed(&mut self, steps_per_s: i32) {
        self.max_speed = steps_per_s.unsigned_abs().clamp(1, SPEED_LIMIT);
        if self.speed.unsigned_abs() > self.max_speed {
            self.speed = self.max_speed as i32 * self.speed.signum();
        }
    }

    fn set_acceleration(&mut self, steps_per_s2: i32) {
        self.acceleration = steps_per_s2.unsigned_abs().max(1);
    }

    fn run_at(&mut self, steps_per_s: i32) {
        let max = self.max_speed as i32;
        let speed = steps_per_s.clamp(-max, max);
        self.target = self.position;
        if speed == 0 {
            self.motion = Motion::Positioning;
            self.speed = 0;
        } else {
            self.motion = Motion::Continuous(speed);
        }
    }

    fn stop(&mut self) {
        self.motion = Motion::Positioning;
        self.target = self.position;
        self.speed = 0;
    }

    fn zero(&mut self) {
        self.stop();
        self.position = 0;
        self.target = 0;
    }

    fn enable(&mut self) {
        self.write_enable(true);
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.stop();
        self.write_enable(false);
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn tick(&mut self, now_us: u64) -> TickOutcome {
        if !self.is_running() {
            self.speed = 0;
            return TickOutcome::Idle;
        }

        if self.speed == 0 {
            self.speed = match self.motion {
                Motion::Continuous(speed) => speed,
                Motion::Positioning => {
                    self.start_speed() as i32 * self.distance_to_go().signum() as i32
                }
            };
            self.next_step_us = now_us;
        }

        if now_us < self.next_step_us {
            return TickOutcome::Waiting;
        }

        self.pulse(self.speed > 0);
        self.speed = self.next_speed();
        if self.speed != 0 {
            self.next_step_us = now_us + MICROS_PER_SECOND / self.speed.unsigned_abs() as u64;
        }
        TickOutcome::Stepped
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn speed(&self) -> i32 {
        self.speed
    }

    fn is_running(&self) -> bool {
        match self.motion {
            Motion::Continuous(_) => true,
            Motion::Positioning => self.position != self.target,
        }
    }
}
