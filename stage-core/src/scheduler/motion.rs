//! Motion scheduler
//!
//! Decides how many engine ticks each axis gets per control cycle. While a
//! large move is in progress each axis is limited to a few ticks so that
//! command decoding and safety checks stay timely; otherwise an axis is
//! advanced until it has no step due this cycle.

use stage_protocol::Axis;

use crate::config::SchedulerConfig;
use crate::state::ControllerState;
use crate::traits::{AxisEngine, TickOutcome};

/// How many ticks an axis may consume in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickBudget {
    /// At most this many tick calls
    Throttled(u16),
    /// Until the engine stops stepping, bounded by this many calls
    Drain(u16),
}

/// Advance one engine according to a budget
///
/// Returns the number of tick calls made.
pub fn advance<A: AxisEngine>(engine: &mut A, now_us: u64, budget: TickBudget) -> u16 {
    let mut calls = 0;
    match budget {
        TickBudget::Throttled(limit) => {
            while calls < limit {
                calls += 1;
                if engine.tick(now_us) == TickOutcome::Idle {
                    break;
                }
            }
        }
        TickBudget::Drain(limit) => {
            while calls < limit {
                calls += 1;
                if engine.tick(now_us) != TickOutcome::Stepped {
                    break;
                }
            }
        }
    }
    calls
}

/// Per-cycle scheduling report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Tick calls made per axis (X, Y)
    pub ticks: [u16; 2],
    /// At least one axis still has motion pending
    pub running: bool,
    /// The large-move flag was cleared this cycle
    pub large_move_finished: bool,
}

/// Motion scheduler for serial-mode moves
#[derive(Debug, Clone)]
pub struct MotionScheduler {
    config: SchedulerConfig,
}

impl Default for MotionScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl MotionScheduler {
    /// Create a scheduler with the given policy
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Check if a move of this many steps counts as large
    pub fn is_large_move(&self, distance: i64) -> bool {
        distance.unsigned_abs() > self.config.large_move_threshold as u64
    }

    /// Budget for one axis this cycle
    pub fn budget(&self, state: &ControllerState) -> TickBudget {
        if state.large_move_in_progress {
            TickBudget::Throttled(self.config.throttled_ticks)
        } else {
            TickBudget::Drain(self.config.max_ticks_per_cycle)
        }
    }

    /// Run one scheduling cycle over both axes
    pub fn run_cycle<A: AxisEngine>(
        &self,
        axes: &mut [A; 2],
        state: &mut ControllerState,
        now_us: u64,
    ) -> CycleReport {
        let budget = self.budget(state);
        let mut report = CycleReport::default();

        for axis in Axis::ALL {
            let engine = &mut axes[axis.index()];
            if engine.is_running() {
                report.ticks[axis.index()] = advance(engine, now_us, budget);
            }
        }

        report.running = axes.iter().any(|engine| engine.is_running());
        if !report.running && state.large_move_in_progress {
            state.large_move_in_progress = false;
            report.large_move_finished = true;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAxis;

    fn axes() -> [MockAxis; 2] {
        [MockAxis::new(), MockAxis::new()]
    }

    #[test]
    fn test_idle_axes_are_not_ticked() {
        let scheduler = MotionScheduler::default();
        let mut axes = axes();
        let mut state = ControllerState::new();

        let report = scheduler.run_cycle(&mut axes, &mut state, 0);
        assert_eq!(report.ticks, [0, 0]);
        assert!(!report.running);
        assert_eq!(axes[0].ticks, 0);
    }

    #[test]
    fn test_short_move_finishes_in_one_cycle() {
        let scheduler = MotionScheduler::default();
        let mut axes = axes();
        let mut state = ControllerState::new();

        axes[0].move_by(30);
        axes[1].move_by(-50);
        let report = scheduler.run_cycle(&mut axes, &mut state, 0);

        assert_eq!(axes[0].position, 30);
        assert_eq!(axes[1].position, -50);
        assert!(!report.running);
        // The last call finds nothing left to do
        assert_eq!(report.ticks, [31, 51]);
    }

    #[test]
    fn test_large_move_is_throttled() {
        let scheduler = MotionScheduler::default();
        let mut axes = axes();
        let mut state = ControllerState::new();

        axes[0].move_by(1000);
        state.large_move_in_progress = true;

        let report = scheduler.run_cycle(&mut axes, &mut state, 0);
        assert_eq!(report.ticks, [5, 0]);
        assert_eq!(axes[0].position, 5);
        assert!(report.running);
        assert!(state.large_move_in_progress);
    }

    #[test]
    fn test_large_move_completes_and_clears_flag() {
        let scheduler = MotionScheduler::default();
        let mut axes = axes();
        let mut state = ControllerState::new();

        axes[0].move_by(1000);
        state.large_move_in_progress = true;

        let mut cycles = 0;
        loop {
            let before = axes[0].position;
            let report = scheduler.run_cycle(&mut axes, &mut state, cycles);
            assert!(axes[0].position - before <= 5);
            cycles += 1;
            if !report.running {
                assert!(report.large_move_finished);
                break;
            }
            assert!(cycles < 1000, "move never completed");
        }

        assert_eq!(cycles, 200);
        assert_eq!(axes[0].position, 1000);
        assert!(!state.large_move_in_progress);
        assert!(!axes[0].is_running());
    }

    #[test]
    fn test_flag_held_while_other_axis_runs() {
        let scheduler = MotionScheduler::default();
        let mut axes = axes();
        let mut state = ControllerState::new();

        axes[0].move_by(3);
        axes[1].move_by(100);
        state.large_move_in_progress = true;

        scheduler.run_cycle(&mut axes, &mut state, 0);
        assert_eq!(axes[0].position, 3);
        assert!(state.large_move_in_progress);
    }

    #[test]
    fn test_large_move_threshold() {
        let scheduler = MotionScheduler::default();
        assert!(!scheduler.is_large_move(50));
        assert!(!scheduler.is_large_move(-50));
        assert!(scheduler.is_large_move(51));
        assert!(scheduler.is_large_move(-51));
        assert!(scheduler.is_large_move(i32::MIN as i64));
    }

    #[test]
    fn test_drain_is_bounded() {
        let mut axis = MockAxis::new();
        axis.move_by(10_000);
        let calls = advance(&mut axis, 0, TickBudget::Drain(256));
        assert_eq!(calls, 256);
        assert_eq!(axis.position, 256);
    }

    #[test]
    fn test_drain_stops_when_step_not_due() {
        let mut axis = MockAxis::new();
        axis.run_at(200);
        let calls = advance(&mut axis, 7, TickBudget::Drain(256));
        // One step at this timestamp, then Waiting
        assert_eq!(calls, 2);
        assert_eq!(axis.position, 1);
    }
}
