//! Host UART receive task
//!
//! Receives frames from the host and hands command records to the
//! control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use stage_protocol::FrameParser;

use crate::channels::COMMAND_CHANNEL;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - receives and parses frames from the host
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx) {
    info!("Serial RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match frame.command_payload() {
                            Ok(_) => {
                                // A full slot means a command is still waiting
                                if COMMAND_CHANNEL.try_send(frame.payload).is_err() {
                                    warn!("Command pending, dropping frame");
                                }
                            }
                            Err(e) => {
                                warn!("Unexpected frame: {:?}", e);
                            }
                        },
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
