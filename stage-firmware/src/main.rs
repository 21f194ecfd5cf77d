//! Two-axis stage controller firmware
//!
//! Main firmware binary for RP2040-based boards. Drives an X/Y stepper
//! stage from an analog joystick or from framed binary commands sent by
//! a host over UART0.
//!
//! Pin assignment:
//! - UART0: TX=GPIO0, RX=GPIO1
//! - X axis: STEP=GPIO2, DIR=GPIO3, ENABLE=GPIO4
//! - Y axis: STEP=GPIO5, DIR=GPIO6, ENABLE=GPIO7
//! - Joystick: X=GPIO26 (ADC0), Y=GPIO27 (ADC1), button=GPIO22

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stage_core::StageController;
use stage_drivers::input::DebouncedButton;
use stage_drivers::stepper::StepDirAxis;
use stage_protocol::BAUD_RATE;

use crate::config::STAGE_CONFIG;
use crate::tasks::Joystick;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stage controller starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", BAUD_RATE);

    // Stepper axes, enable lines start high (drivers off)
    let x_axis = StepDirAxis::new(
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_4, Level::High),
    );
    let y_axis = StepDirAxis::new(
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::High),
    );

    let controller = StageController::new(x_axis, y_axis, &STAGE_CONFIG);
    info!(
        "Controller ready: max speed x={} y={}, large move > {} steps",
        STAGE_CONFIG.x.max_speed, STAGE_CONFIG.y.max_speed, STAGE_CONFIG.scheduler.large_move_threshold
    );

    // Joystick
    let joystick = Joystick {
        adc: Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default()),
        x: Channel::new_pin(p.PIN_26, Pull::None),
        y: Channel::new_pin(p.PIN_27, Pull::None),
        button: DebouncedButton::new(Input::new(p.PIN_22, Pull::Up)),
    };

    unwrap!(spawner.spawn(tasks::serial_rx_task(rx)));
    unwrap!(spawner.spawn(tasks::serial_tx_task(tx)));
    unwrap!(spawner.spawn(tasks::control_task(controller, joystick)));

    info!("All tasks spawned");
}
