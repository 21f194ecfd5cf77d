//! Control loop task
//!
//! Runs the stage controller on a fixed 1 ms cadence: hands waiting
//! command records to the mailbox, samples the joystick, calls `tick`
//! and queues whatever the cycle produced for the UART.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Duration, Instant, Ticker};

use stage_core::manual::JoystickSample;
use stage_core::{OfferError, StageController, TickReport};
use stage_drivers::input::DebouncedButton;
use stage_drivers::joystick::sample_from_adc;
use stage_drivers::stepper::StepDirAxis;
use stage_protocol::Axis;

use crate::channels::{COMMAND_CHANNEL, RESPONSE_CHANNEL};

/// Control cycle period
pub const CONTROL_PERIOD_MS: u64 = 1;

/// Joystick sampling period
pub const JOYSTICK_PERIOD_MS: u64 = 20;

/// Stepper axis on board GPIO
pub type StageAxis = StepDirAxis<Output<'static>, Output<'static>, Output<'static>>;

/// Joystick hardware: two ADC channels and the push-button
pub struct Joystick {
    pub adc: Adc<'static, Async>,
    pub x: Channel<'static>,
    pub y: Channel<'static>,
    pub button: DebouncedButton<Input<'static>>,
}

impl Joystick {
    /// Read both axes and the button
    ///
    /// Returns `None` if either conversion fails.
    async fn sample(&mut self) -> Option<JoystickSample> {
        let x = match self.adc.read(&mut self.x).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Joystick X read failed: {:?}", e);
                return None;
            }
        };
        let y = match self.adc.read(&mut self.y).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Joystick Y read failed: {:?}", e);
                return None;
            }
        };
        let pressed = self.button.update();
        Some(sample_from_adc(x, y, pressed))
    }
}

/// Control task - owns the controller and both axes
#[embassy_executor::task]
pub async fn control_task(mut controller: StageController<StageAxis>, mut joystick: Joystick) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));
    let start = Instant::now();
    let mut next_sample_ms = 0u64;

    loop {
        if let Ok(bytes) = COMMAND_CHANNEL.try_receive() {
            match controller.offer(&bytes) {
                Ok(()) => trace!("Command queued: cmd={}", bytes.first().copied().unwrap_or(0)),
                Err(OfferError::Busy) => warn!("Command pending, dropping new command"),
                Err(OfferError::Record(e)) => warn!("Bad command record: {:?}", e),
            }
        }

        let elapsed = start.elapsed();
        let now_ms = elapsed.as_millis();
        let sample = if now_ms >= next_sample_ms {
            next_sample_ms = now_ms + JOYSTICK_PERIOD_MS;
            joystick.sample().await
        } else {
            None
        };

        let report = controller.tick(elapsed.as_micros(), sample);
        log_report(&report, &controller);

        for record in report.outbound {
            if RESPONSE_CHANNEL.try_send(record).is_err() {
                warn!("TX queue full, dropping response");
            }
        }

        ticker.next().await;
    }
}

fn log_report(report: &TickReport, controller: &StageController<StageAxis>) {
    if let Some(record) = &report.handled {
        debug!(
            "Processed cmd={} axes={} p1={} p2={}",
            record.cmd, record.axes.0, record.param1, record.param2
        );
    }
    if let Some(mode) = report.mode_changed {
        info!("Mode changed to {:?}", mode);
    }
    if let Some(enabled) = report.button_toggled {
        info!("Button toggled motors: enabled={}", enabled);
    }
    if report.motion.large_move_finished {
        let snapshot = controller.snapshot();
        info!(
            "Large move finished at x={} y={}",
            snapshot.x.position, snapshot.y.position
        );
    }
    if report.outputs_disabled {
        let snapshot = controller.snapshot();
        info!(
            "Inactivity timeout, outputs disabled at x={} y={}",
            snapshot.x.position, snapshot.y.position
        );
    }

    let errors = controller.axis(Axis::X).pin_errors() + controller.axis(Axis::Y).pin_errors();
    if errors > 0 && report.handled.is_some() {
        warn!("Stepper pin errors: {}", errors);
    }
}
