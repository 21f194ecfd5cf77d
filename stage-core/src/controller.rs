//! Stage controller
//!
//! Owns both axes and all controller state. The firmware calls
//! [`StageController::offer`] when a command record arrives and
//! [`StageController::tick`] once per control cycle; neither blocks.

use heapless::Vec;
use stage_protocol::{
    AxisSnapshot, CommandRecord, RecordError, Response, ResponseEncoder, Snapshot, RESPONSE_LEN,
};

use crate::config::StageConfig;
use crate::dispatch::{self, Command, Target};
use crate::manual::{JoystickSample, ManualControl};
use crate::safety::{ActivitySupervisor, SafetyStatus};
use crate::scheduler::{CycleReport, MotionScheduler};
use crate::state::{manual_allowed, scheduled_motion_allowed, ControllerState};
use crate::traits::AxisEngine;
use stage_protocol::{Axis, Mode};

/// Why an inbound record was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OfferError {
    /// A command is already waiting; the new one was dropped
    Busy,
    /// The bytes are not a command record
    Record(RecordError),
}

impl From<RecordError> for OfferError {
    fn from(e: RecordError) -> Self {
        OfferError::Record(e)
    }
}

/// Encoded response bytes
pub type EncodedResponse = [u8; RESPONSE_LEN];

/// What one control cycle produced
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Responses to transmit, in order
    pub outbound: Vec<EncodedResponse, 2>,
    /// Command processed this cycle; its reply is `outbound[0]`
    pub handled: Option<CommandRecord>,
    /// Mode after the cycle differs from before it
    pub mode_changed: Option<Mode>,
    /// Button toggled the motors on (`true`) or off (`false`)
    pub button_toggled: Option<bool>,
    /// Inactivity timeout disabled the motors this cycle
    pub outputs_disabled: bool,
    /// Scheduled motion this cycle (all zero outside serial mode)
    pub motion: CycleReport,
}

impl TickReport {
    /// Encoded reply to the command handled this cycle
    pub fn reply(&self) -> Option<&EncodedResponse> {
        self.handled.and(self.outbound.first())
    }
}

/// Two-axis stage controller
pub struct StageController<A: AxisEngine> {
    axes: [A; 2],
    state: ControllerState,
    supervisor: ActivitySupervisor,
    scheduler: MotionScheduler,
    manual: ManualControl,
    encoder: ResponseEncoder,
    /// Single-slot mailbox
    pending: Option<CommandRecord>,
}

impl<A: AxisEngine> StageController<A> {
    /// Create a controller in joystick mode with outputs disabled
    pub fn new(mut x: A, mut y: A, config: &StageConfig) -> Self {
        x.set_max_speed(config.x.max_speed);
        x.set_acceleration(config.x.acceleration);
        y.set_max_speed(config.y.max_speed);
        y.set_acceleration(config.y.acceleration);
        x.disable();
        y.disable();

        Self {
            axes: [x, y],
            state: ControllerState::new(),
            supervisor: ActivitySupervisor::new(config.supervisor),
            scheduler: MotionScheduler::new(config.scheduler),
            manual: ManualControl::new(config.joystick),
            encoder: ResponseEncoder::new(),
            pending: None,
        }
    }

    /// Accept an inbound command record into the mailbox
    ///
    /// While a command is pending, new ones are dropped.
    pub fn offer(&mut self, bytes: &[u8]) -> Result<(), OfferError> {
        if self.pending.is_some() {
            return Err(OfferError::Busy);
        }
        self.pending = Some(CommandRecord::decode(bytes)?);
        Ok(())
    }

    /// Check if a command is waiting to be processed
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply one command immediately and build its response
    ///
    /// Bypasses the mailbox and pacing; processing still counts as activity
    /// and as the last command time.
    pub fn dispatch(&mut self, record: CommandRecord, now_ms: u64) -> Response {
        let command = Command::from(&record);
        let mut target = Target {
            axes: &mut self.axes,
            state: &mut self.state,
            manual: &mut self.manual,
            scheduler: &self.scheduler,
        };
        let reply = dispatch::apply(command, &mut target);
        self.supervisor.command_processed(now_ms);

        reply.into_response(record.cmd, self.snapshot())
    }

    /// Run one control cycle
    pub fn tick(&mut self, now_us: u64, joystick: Option<JoystickSample>) -> TickReport {
        let now_ms = now_us / 1000;
        let mode_before = self.state.mode;
        let mut report = TickReport::default();

        if self.pending.is_some() && self.supervisor.command_ready(now_ms) {
            if let Some(record) = self.pending.take() {
                let response = self.dispatch(record, now_ms);
                self.push(&mut report, &response);
                report.handled = Some(record);
            }
        }

        if scheduled_motion_allowed(self.state.mode) {
            report.motion = self
                .scheduler
                .run_cycle(&mut self.axes, &mut self.state, now_us);
            if let Some(sample) = joystick {
                self.manual.observe_button(&sample);
            }
        } else if manual_allowed(self.state.mode) {
            if let Some(sample) = joystick {
                let outcome = self.manual.apply(&sample, &mut self.axes, &mut self.state);
                if outcome.activity {
                    self.supervisor.record_activity(now_ms);
                }
                report.button_toggled = outcome.toggled;
            }
            let limit = self.scheduler.config().max_ticks_per_cycle;
            self.manual.drive(&mut self.axes, now_us, limit);
        }

        if self.axes.iter().any(|engine| engine.is_running()) {
            self.supervisor.record_activity(now_ms);
        }

        if self.supervisor.check(now_ms, self.state.motors_enabled)
            == SafetyStatus::InactivityTimeout
        {
            self.disable_outputs();
            report.outputs_disabled = true;
        }

        if self.state.mode == Mode::Serial && self.supervisor.status_due(now_ms) {
            let response = Response::broadcast(self.snapshot());
            self.push(&mut report, &response);
        }

        if self.state.mode != mode_before {
            report.mode_changed = Some(self.state.mode);
        }

        report
    }

    fn push(&mut self, report: &mut TickReport, response: &Response) {
        let bytes = self.encoder.encode(response);
        // At most one reply and one broadcast per cycle
        let _ = report.outbound.push(bytes);
    }

    fn disable_outputs(&mut self) {
        for engine in self.axes.iter_mut() {
            engine.disable();
        }
        self.manual.reset();
        self.state.motors_enabled = false;
        self.state.large_move_in_progress = false;
    }

    /// Current snapshot of both axes and the mode
    pub fn snapshot(&self) -> Snapshot {
        let axis = |a: &A| AxisSnapshot::new(a.position(), a.speed(), a.is_running());
        Snapshot {
            x: axis(&self.axes[Axis::X.index()]),
            y: axis(&self.axes[Axis::Y.index()]),
            mode: self.state.mode,
        }
    }

    /// Controller state
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Activity supervisor
    pub fn supervisor(&self) -> &ActivitySupervisor {
        &self.supervisor
    }

    /// One axis
    pub fn axis(&self, axis: Axis) -> &A {
        &self.axes[axis.index()]
    }

    /// Sequence number the next response will carry
    pub fn next_sequence(&self) -> u16 {
        self.encoder.next_sequence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAxis;
    use proptest::prelude::*;
    use stage_protocol::messages::{ECHO_UNSOLICITED, ERR_INVALID_MODE, ERR_UNKNOWN_COMMAND};
    use stage_protocol::{AxisSelector, CommandKind, ResponseKind, ResponseRecord};
    use std::vec::Vec as StdVec;

    const MS: u64 = 1000;

    fn controller() -> StageController<MockAxis> {
        StageController::new(MockAxis::new(), MockAxis::new(), &StageConfig::default())
    }

    fn record(kind: CommandKind, axes: AxisSelector, p1: i32, p2: i32) -> CommandRecord {
        CommandRecord::new(kind, axes, p1, p2)
    }

    fn decode(bytes: &EncodedResponse) -> ResponseRecord {
        ResponseRecord::decode(bytes).unwrap()
    }

    /// Offer a command and tick until its reply comes back
    fn send(c: &mut StageController<MockAxis>, rec: CommandRecord, now_ms: &mut u64) -> ResponseRecord {
        c.offer(&rec.encode()).unwrap();
        loop {
            let report = c.tick(*now_ms * MS, None);
            if let Some(reply) = report.reply() {
                return decode(reply);
            }
            *now_ms += 10;
        }
    }

    #[test]
    fn test_new_applies_axis_config() {
        let mut config = StageConfig::default();
        config.y.max_speed = 250;
        config.y.acceleration = 40;
        let c = StageController::new(MockAxis::new(), MockAxis::new(), &config);

        assert_eq!(c.axis(Axis::X).max_speed, 1000);
        assert_eq!(c.axis(Axis::Y).max_speed, 250);
        assert_eq!(c.axis(Axis::Y).acceleration, 40);
        assert!(!c.axis(Axis::X).enabled);
        assert_eq!(c.state().mode, Mode::Joystick);
    }

    #[test]
    fn test_reply_echoes_and_carries_snapshot() {
        let mut c = controller();
        let mut now = 0;
        let r = send(&mut c, record(CommandKind::StatusRequest, AxisSelector::NONE, 0, 0), &mut now);

        assert_eq!(r.kind, ResponseKind::Status);
        assert_eq!(r.echoed_command, CommandKind::StatusRequest as u8);
        assert_eq!(r.sequence, 0);
        assert_eq!(r.snapshot.mode, Mode::Joystick);
        assert_eq!(c.next_sequence(), 1);
    }

    #[test]
    fn test_set_mode_invalid_leaves_mode() {
        let mut c = controller();
        let mut now = 0;
        let r = send(&mut c, record(CommandKind::SetMode, AxisSelector::NONE, 99, 0), &mut now);

        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.payload, ERR_INVALID_MODE);
        assert_eq!(c.state().mode, Mode::Joystick);
    }

    #[test]
    fn test_unknown_command_id() {
        let mut c = controller();
        let bytes = CommandRecord {
            cmd: 255,
            axes: AxisSelector::BOTH,
            param1: 1,
            param2: 2,
        }
        .encode();
        c.offer(&bytes).unwrap();

        let report = c.tick(0, None);
        let r = decode(report.reply().unwrap());
        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.echoed_command, 255);
        assert_eq!(r.payload, ERR_UNKNOWN_COMMAND);
    }

    #[test]
    fn test_large_move_throttled_end_to_end() {
        let mut c = controller();
        c.offer(&record(CommandKind::Move, AxisSelector::X, 1000, 0).encode())
            .unwrap();

        let mut now_ms = 0;
        let report = c.tick(now_ms * MS, None);
        assert!(report.reply().is_some());
        assert_eq!(report.mode_changed, Some(Mode::Serial));
        assert_eq!(c.state().mode, Mode::Serial);
        assert!(c.state().motors_enabled);
        assert!(c.state().large_move_in_progress);
        assert_eq!(c.axis(Axis::X).position, 5);
        assert_eq!(report.motion.ticks, [5, 0]);

        let mut cycles = 1;
        let mut finished = 0;
        while c.axis(Axis::X).is_running() {
            now_ms += 1;
            let before = c.axis(Axis::X).position;
            let report = c.tick(now_ms * MS, None);
            assert!(c.axis(Axis::X).position - before <= 5);
            if report.motion.large_move_finished {
                finished += 1;
            }
            cycles += 1;
            assert!(cycles <= 200);
        }
        assert_eq!(finished, 1);

        assert_eq!(c.axis(Axis::X).position, 1000);
        assert!(!c.state().large_move_in_progress);
        assert!(!c.snapshot().x.running);
    }

    #[test]
    fn test_set_mode_joystick_after_moves() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::Move, AxisSelector::BOTH, 5000, -5000), &mut now);
        now += 200;
        let r = send(&mut c, record(CommandKind::SetMode, AxisSelector::NONE, 0, 0), &mut now);

        assert_eq!(r.kind, ResponseKind::Ok);
        assert_eq!(r.snapshot.mode, Mode::Joystick);
        assert!(!r.snapshot.x.running);
        assert!(!r.snapshot.y.running);
        assert!(!c.state().large_move_in_progress);
    }

    #[test]
    fn test_disable_enable_both() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::Disable, AxisSelector::BOTH, 0, 0), &mut now);
        assert!(!c.state().motors_enabled);
        assert!(!c.axis(Axis::X).enabled && !c.axis(Axis::Y).enabled);

        now += 200;
        send(&mut c, record(CommandKind::Enable, AxisSelector::BOTH, 0, 0), &mut now);
        assert!(c.state().motors_enabled);
        assert!(c.axis(Axis::X).enabled && c.axis(Axis::Y).enabled);
    }

    #[test]
    fn test_inactivity_disables_once() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::Enable, AxisSelector::BOTH, 0, 0), &mut now);
        assert!(c.state().motors_enabled);

        assert!(!c.tick(2000 * MS, None).outputs_disabled);
        let report = c.tick(2001 * MS, None);
        assert!(report.outputs_disabled);
        assert!(!c.state().motors_enabled);
        assert!(!c.axis(Axis::X).enabled && !c.axis(Axis::Y).enabled);

        for t in 2002..2100 {
            assert!(!c.tick(t * MS, None).outputs_disabled);
        }
        assert_eq!(c.state().mode, Mode::Joystick);
    }

    #[test]
    fn test_joystick_activity_defers_timeout() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::Enable, AxisSelector::BOTH, 0, 0), &mut now);

        let deflected = JoystickSample {
            x: 900,
            y: 512,
            button_pressed: false,
        };
        for t in (0..5000).step_by(20) {
            assert!(!c.tick(t * MS, Some(deflected)).outputs_disabled);
        }
        assert!(c.axis(Axis::X).position > 0);
    }

    #[test]
    fn test_joystick_ignored_in_serial_mode() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::SetMode, AxisSelector::NONE, 1, 0), &mut now);
        send(&mut c, record(CommandKind::Enable, AxisSelector::BOTH, 0, 0), &mut now);

        let deflected = JoystickSample {
            x: 1023,
            y: 0,
            button_pressed: true,
        };
        c.tick(500 * MS, Some(deflected));
        assert!(!c.axis(Axis::X).is_running());
        assert!(c.state().motors_enabled);
    }

    #[test]
    fn test_button_toggles_motors() {
        let mut c = controller();
        let mut sample = JoystickSample::centered(512);
        sample.button_pressed = true;

        let report = c.tick(0, Some(sample));
        assert_eq!(report.button_toggled, Some(true));
        assert!(c.state().motors_enabled);
    }

    #[test]
    fn test_button_held_through_mode_change_does_not_toggle() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::SetMode, AxisSelector::NONE, 1, 0), &mut now);
        let mut held = JoystickSample::centered(512);
        held.button_pressed = true;
        c.tick(now * MS, Some(held));

        now += 200;
        c.offer(&record(CommandKind::SetMode, AxisSelector::NONE, 0, 0).encode())
            .unwrap();
        let report = c.tick(now * MS, Some(held));
        assert!(report.reply().is_some());
        assert_eq!(c.state().mode, Mode::Joystick);
        assert_eq!(report.button_toggled, None);
        assert!(!c.state().motors_enabled);

        let report = c.tick((now + 20) * MS, Some(JoystickSample::centered(512)));
        assert_eq!(report.button_toggled, None);
        let report = c.tick((now + 40) * MS, Some(held));
        assert_eq!(report.button_toggled, Some(true));
    }

    #[test]
    fn test_command_pacing() {
        let mut c = controller();
        c.offer(&record(CommandKind::Ping, AxisSelector::NONE, 1, 0).encode())
            .unwrap();
        assert!(c.tick(0, None).reply().is_some());

        c.offer(&record(CommandKind::Ping, AxisSelector::NONE, 2, 0).encode())
            .unwrap();
        let mut processed_at = None;
        for t in (50..400).step_by(10) {
            if c.tick(t * MS, None).reply().is_some() {
                processed_at = Some(t);
                break;
            }
        }
        assert_eq!(processed_at, Some(200));
        assert_eq!(c.supervisor().last_command_ms(), Some(200));
    }

    #[test]
    fn test_mailbox_drops_while_pending() {
        let mut c = controller();
        c.offer(&record(CommandKind::Ping, AxisSelector::NONE, 1, 0).encode())
            .unwrap();
        c.tick(0, None);

        c.offer(&record(CommandKind::Ping, AxisSelector::NONE, 2, 0).encode())
            .unwrap();
        let second = record(CommandKind::Ping, AxisSelector::NONE, 3, 0).encode();
        assert_eq!(c.offer(&second), Err(OfferError::Busy));

        let report = c.tick(200 * MS, None);
        assert_eq!(decode(report.reply().unwrap()).payload, 2);
        assert!(!c.has_pending());
    }

    #[test]
    fn test_offer_rejects_short_record() {
        let mut c = controller();
        assert_eq!(
            c.offer(&[CommandKind::Ping as u8, 0, 1]),
            Err(OfferError::Record(RecordError::Truncated))
        );
        assert!(!c.has_pending());
    }

    #[test]
    fn test_status_broadcast_in_serial_mode() {
        let mut c = controller();
        let mut now = 0;
        send(&mut c, record(CommandKind::SetMode, AxisSelector::NONE, 1, 0), &mut now);

        let mut broadcasts = StdVec::new();
        for t in (100..=3000).step_by(100) {
            let report = c.tick(t * MS, None);
            for bytes in report.outbound.iter() {
                let r = decode(bytes);
                assert_eq!(r.kind, ResponseKind::Status);
                assert_eq!(r.echoed_command, ECHO_UNSOLICITED);
                broadcasts.push(t);
            }
        }
        assert_eq!(broadcasts, [1000, 2000, 3000]);
    }

    #[test]
    fn test_no_broadcast_in_joystick_mode() {
        let mut c = controller();
        for t in (0..=5000).step_by(100) {
            assert!(c.tick(t * MS, None).outbound.is_empty());
        }
    }

    #[test]
    fn test_direct_dispatch() {
        let mut c = controller();
        let response = c.dispatch(record(CommandKind::Home, AxisSelector::BOTH, 0, 0), 42);
        assert_eq!(response.kind, ResponseKind::Ok);
        assert_eq!(response.snapshot.mode, Mode::Serial);
        assert_eq!(c.supervisor().last_command_ms(), Some(42));
        assert_eq!(c.supervisor().last_activity_ms(), 42);
    }

    proptest! {
        #[test]
        fn ping_echoes_any_value(value in any::<i32>()) {
            let mut c = controller();
            let response = c.dispatch(record(CommandKind::Ping, AxisSelector::NONE, value, 0), 0);
            prop_assert_eq!(response.kind, ResponseKind::Ping);
            prop_assert_eq!(response.payload, value);
        }

        #[test]
        fn every_record_gets_one_echoing_reply(
            commands in proptest::collection::vec(
                (any::<u8>(), 0u8..4, -2000i32..2000, -2000i32..2000),
                1..40,
            )
        ) {
            let mut c = controller();
            let mut expected_seq: u16 = 0;
            let mut now_ms = 0u64;

            for (cmd, axes, p1, p2) in commands {
                let rec = CommandRecord { cmd, axes: AxisSelector(axes), param1: p1, param2: p2 };
                prop_assert!(c.offer(&rec.encode()).is_ok());

                let report = c.tick(now_ms * MS, None);
                prop_assert_eq!(report.handled, Some(rec));
                let reply = decode(report.reply().unwrap());
                prop_assert_eq!(reply.echoed_command, cmd);

                for bytes in report.outbound.iter() {
                    prop_assert_eq!(decode(bytes).sequence, expected_seq);
                    expected_seq = expected_seq.wrapping_add(1);
                }
                now_ms += 200;
            }
        }
    }
}
