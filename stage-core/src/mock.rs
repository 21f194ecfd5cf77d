//! Simulated axis for host tests
//!
//! Positioning moves advance one step per tick call with no timing, so a
//! short move finishes within a single unthrottled cycle. Continuous motion
//! advances at most one step per distinct timestamp.

use crate::traits::{AxisEngine, TickOutcome};

#[derive(Debug, Clone, Default)]
pub struct MockAxis {
    pub position: i32,
    pub target: i32,
    pub continuous: i32,
    pub max_speed: i32,
    pub acceleration: i32,
    pub enabled: bool,
    /// Number of tick calls received
    pub ticks: u32,
    /// Number of stop calls received
    pub stops: u32,
    last_continuous_step_us: Option<u64>,
}

impl MockAxis {
    pub fn new() -> Self {
        Self {
            max_speed: 1000,
            acceleration: 500,
            ..Default::default()
        }
    }
}

impl AxisEngine for MockAxis {
    fn move_by(&mut self, delta: i32) {
        self.continuous = 0;
        self.target = self.position.saturating_add(delta);
    }

    fn move_to(&mut self, target: i32) {
        self.continuous = 0;
        self.target = target;
    }

    fn set_max_speed(&mut self, steps_per_s: i32) {
        self.max_speed = steps_per_s;
    }

    fn set_acceleration(&mut self, steps_per_s2: i32) {
        self.acceleration = steps_per_s2;
    }

    fn run_at(&mut self, steps_per_s: i32) {
        self.target = self.position;
        self.continuous = steps_per_s;
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.target = self.position;
        self.continuous = 0;
    }

    fn zero(&mut self) {
        self.position = 0;
        self.target = 0;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.stop();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn tick(&mut self, now_us: u64) -> TickOutcome {
        self.ticks += 1;

        if self.continuous != 0 {
            if self.last_continuous_step_us == Some(now_us) {
                return TickOutcome::Waiting;
            }
            self.last_continuous_step_us = Some(now_us);
            self.position += self.continuous.signum();
            return TickOutcome::Stepped;
        }

        if self.position == self.target {
            return TickOutcome::Idle;
        }
        self.position += (self.target - self.position).signum();
        TickOutcome::Stepped
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn speed(&self) -> i32 {
        if self.continuous != 0 {
            self.continuous
        } else if self.position != self.target {
            self.max_speed * (self.target - self.position).signum()
        } else {
            0
        }
    }

    fn is_running(&self) -> bool {
        self.continuous != 0 || self.position != self.target
    }
}
