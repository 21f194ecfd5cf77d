//! Configuration type definitions
//!
//! These types describe the tunable behavior of the stage. The firmware
//! bakes them in at build time from `stage.toml`; nothing is persisted.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Joystick scaling parameters
///
/// Readings are 10-bit (0-1023). Offsets from `center` smaller than
/// `deadzone` produce no motion; larger offsets are scaled linearly from
/// the deadzone edge onto `[min_speed, max_speed]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JoystickConfig {
    /// Reading at rest
    pub center: u16,
    /// Half-width of the dead band around center
    pub deadzone: u16,
    /// Largest possible reading
    pub full_scale: u16,
    /// Speed at the edge of the deadzone (steps/s)
    pub min_speed: i32,
    /// Speed at full deflection (steps/s)
    pub max_speed: i32,
}

impl JoystickConfig {
    pub const fn new() -> Self {
        Self {
            center: 512,
            deadzone: 50,
            full_scale: 1023,
            min_speed: 50,
            max_speed: 1000,
        }
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Motion limits applied to an axis at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AxisConfig {
    /// Speed limit in steps/s
    pub max_speed: i32,
    /// Acceleration in steps/s²
    pub acceleration: i32,
}

impl AxisConfig {
    pub const fn new() -> Self {
        Self {
            max_speed: 1000,
            acceleration: 500,
        }
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Activity and safety timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SupervisorConfig {
    /// Outputs are disabled after this long without activity
    pub inactivity_timeout_ms: u32,
    /// Minimum time between two processed commands
    pub command_spacing_ms: u32,
    /// Period of unsolicited status responses in serial mode
    pub status_interval_ms: u32,
}

impl SupervisorConfig {
    pub const fn new() -> Self {
        Self {
            inactivity_timeout_ms: 2000,
            command_spacing_ms: 200,
            status_interval_ms: 1000,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Motion scheduling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Moves longer than this many steps are throttled
    pub large_move_threshold: u32,
    /// Engine ticks per axis per cycle while a large move runs
    pub throttled_ticks: u16,
    /// Upper bound on engine ticks per axis per cycle otherwise
    pub max_ticks_per_cycle: u16,
}

impl SchedulerConfig {
    pub const fn new() -> Self {
        Self {
            large_move_threshold: 50,
            throttled_ticks: 5,
            max_ticks_per_cycle: 256,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete stage configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StageConfig {
    pub joystick: JoystickConfig,
    pub x: AxisConfig,
    pub y: AxisConfig,
    pub supervisor: SupervisorConfig,
    pub scheduler: SchedulerConfig,
}

impl StageConfig {
    pub const fn new() -> Self {
        Self {
            joystick: JoystickConfig::new(),
            x: AxisConfig::new(),
            y: AxisConfig::new(),
            supervisor: SupervisorConfig::new(),
            scheduler: SchedulerConfig::new(),
        }
    }

    /// Check the values for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let j = &self.joystick;
        if j.center <= j.deadzone || j.center.saturating_add(j.deadzone) >= j.full_scale {
            return Err(ConfigError::DeadzoneTooWide);
        }
        if j.min_speed < 0 || j.max_speed < j.min_speed {
            return Err(ConfigError::InvalidSpeedRange);
        }
        if self.x.max_speed <= 0 || self.y.max_speed <= 0 {
            return Err(ConfigError::InvalidSpeedRange);
        }
        if self.x.acceleration <= 0 || self.y.acceleration <= 0 {
            return Err(ConfigError::InvalidAcceleration);
        }
        if self.scheduler.throttled_ticks == 0
            || self.scheduler.max_ticks_per_cycle < self.scheduler.throttled_ticks
        {
            return Err(ConfigError::InvalidTickBudget);
        }
        Ok(())
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration consistency errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Deadzone leaves no travel on one side of center
    DeadzoneTooWide,
    /// Speed limits are negative or inverted
    InvalidSpeedRange,
    /// Acceleration is not positive
    InvalidAcceleration,
    /// Throttled tick count is zero or above the per-cycle bound
    InvalidTickBudget,
}
