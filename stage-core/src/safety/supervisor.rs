//! Activity supervisor
//!
//! Tracks command, motion and joystick activity. Disables the motor outputs
//! after a period of inactivity, paces command processing, and times the
//! periodic status broadcast.

use crate::config::SupervisorConfig;

/// Default safety thresholds
pub const INACTIVITY_TIMEOUT_MS: u32 = 2000;
pub const COMMAND_SPACING_MS: u32 = 200;
pub const STATUS_INTERVAL_MS: u32 = 1000;

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Motors were enabled and nothing happened for too long
    InactivityTimeout,
}

/// Supervisor for activity and pacing
///
/// All timestamps are milliseconds on a monotonic clock.
#[derive(Debug, Clone)]
pub struct ActivitySupervisor {
    config: SupervisorConfig,
    /// Last command, motion or joystick activity
    last_activity_ms: u64,
    /// Last processed command, if any
    last_command_ms: Option<u64>,
    /// Last status broadcast
    last_status_ms: u64,
}

impl Default for ActivitySupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl ActivitySupervisor {
    /// Create a supervisor with all timers at time zero
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            last_activity_ms: 0,
            last_command_ms: None,
            last_status_ms: 0,
        }
    }

    /// Record activity at `now_ms`
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    /// Check if a pending command may be processed now
    pub fn command_ready(&self, now_ms: u64) -> bool {
        match self.last_command_ms {
            None => true,
            Some(last) => {
                now_ms.saturating_sub(last) >= self.config.command_spacing_ms as u64
            }
        }
    }

    /// Record that a command was processed at `now_ms`
    ///
    /// Processing a command also counts as activity.
    pub fn command_processed(&mut self, now_ms: u64) {
        self.last_command_ms = Some(now_ms);
        self.record_activity(now_ms);
    }

    /// Check the inactivity timeout
    ///
    /// Only reports a timeout while motors are enabled, so once the caller
    /// disables them repeated checks return `Ok`.
    pub fn check(&self, now_ms: u64, motors_enabled: bool) -> SafetyStatus {
        let idle_ms = now_ms.saturating_sub(self.last_activity_ms);
        if motors_enabled && idle_ms > self.config.inactivity_timeout_ms as u64 {
            return SafetyStatus::InactivityTimeout;
        }
        SafetyStatus::Ok
    }

    /// Check if a status broadcast is due, restarting the interval if so
    pub fn status_due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_status_ms) >= self.config.status_interval_ms as u64 {
            self.last_status_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Time of the last recorded activity
    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    /// Time of the last processed command
    pub fn last_command_ms(&self) -> Option<u64> {
        self.last_command_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = SupervisorConfig::default();
        assert_eq!(config.inactivity_timeout_ms, INACTIVITY_TIMEOUT_MS);
        assert_eq!(config.command_spacing_ms, COMMAND_SPACING_MS);
        assert_eq!(config.status_interval_ms, STATUS_INTERVAL_MS);
    }

    #[test]
    fn test_no_timeout_while_disabled() {
        let supervisor = ActivitySupervisor::default();
        assert_eq!(supervisor.check(10_000, false), SafetyStatus::Ok);
    }

    #[test]
    fn test_timeout_after_threshold() {
        let mut supervisor = ActivitySupervisor::default();
        supervisor.record_activity(1000);

        assert_eq!(supervisor.check(3000, true), SafetyStatus::Ok);
        assert_eq!(
            supervisor.check(3001, true),
            SafetyStatus::InactivityTimeout
        );
    }

    #[test]
    fn test_activity_defers_timeout() {
        let mut supervisor = ActivitySupervisor::default();
        supervisor.record_activity(1500);
        supervisor.record_activity(2900);
        assert_eq!(supervisor.check(4500, true), SafetyStatus::Ok);
        assert_eq!(supervisor.last_activity_ms(), 2900);
    }

    #[test]
    fn test_activity_never_moves_backwards() {
        let mut supervisor = ActivitySupervisor::default();
        supervisor.record_activity(500);
        supervisor.record_activity(100);
        assert_eq!(supervisor.last_activity_ms(), 500);
    }

    #[test]
    fn test_first_command_is_ready() {
        let supervisor = ActivitySupervisor::default();
        assert!(supervisor.command_ready(0));
        assert_eq!(supervisor.last_command_ms(), None);
    }

    #[test]
    fn test_command_spacing() {
        let mut supervisor = ActivitySupervisor::default();
        supervisor.command_processed(1000);

        assert!(!supervisor.command_ready(1000));
        assert!(!supervisor.command_ready(1199));
        assert!(supervisor.command_ready(1200));
        assert_eq!(supervisor.last_activity_ms(), 1000);
    }

    #[test]
    fn test_status_interval() {
        let mut supervisor = ActivitySupervisor::default();
        assert!(!supervisor.status_due(999));
        assert!(supervisor.status_due(1000));
        assert!(!supervisor.status_due(1500));
        assert!(supervisor.status_due(2000));
    }
}
