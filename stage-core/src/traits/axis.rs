//! Axis engine trait
//!
//! This trait abstracts over the per-axis motion engine that turns move
//! requests into timed step/direction pulses (step/dir drivers, simulated
//! axes in tests, etc.)

/// Result of advancing an axis engine once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// A step pulse was emitted; another may already be due
    Stepped,
    /// Motion is pending but the next step is not due yet
    Waiting,
    /// Nothing left to do
    Idle,
}

/// Trait for per-axis motion engines
///
/// Implementations own the acceleration ramp and step timing. Every method
/// returns immediately; motion only happens inside [`AxisEngine::tick`].
///
/// Speeds are in steps/s and accelerations in steps/s². Values are passed
/// through unchecked; implementations decide how to treat out-of-range input.
pub trait AxisEngine {
    /// Request a move relative to the current position
    fn move_by(&mut self, delta: i32);

    /// Request a move to an absolute position
    fn move_to(&mut self, target: i32);

    /// Set the speed limit for positioning moves
    fn set_max_speed(&mut self, steps_per_s: i32);

    /// Set the acceleration used for positioning moves
    fn set_acceleration(&mut self, steps_per_s2: i32);

    /// Run continuously at a signed speed, without a target
    ///
    /// A speed of 0 ends continuous motion.
    fn run_at(&mut self, steps_per_s: i32);

    /// Halt immediately, discarding any pending motion
    fn stop(&mut self);

    /// Declare the current position to be zero without moving
    fn zero(&mut self);

    /// Energize the driver outputs
    fn enable(&mut self);

    /// De-energize the driver outputs
    ///
    /// A disabled axis holds no torque, so pending motion is discarded.
    fn disable(&mut self);

    /// Check if the driver outputs are energized
    fn is_enabled(&self) -> bool;

    /// Advance the motion profile by at most one step
    ///
    /// `now_us` is a monotonic timestamp used for step timing.
    fn tick(&mut self, now_us: u64) -> TickOutcome;

    /// Current absolute position in steps
    fn position(&self) -> i32;

    /// Current signed speed in steps/s
    fn speed(&self) -> i32;

    /// Check if motion is pending
    fn is_running(&self) -> bool;
}
