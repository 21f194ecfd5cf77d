//! Host UART transmit task
//!
//! Frames encoded responses and writes them to the host.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use stage_protocol::frame::RESPONSE_FRAME_SIZE;
use stage_protocol::Frame;

use crate::channels::RESPONSE_CHANNEL;

/// Serial TX task - sends response frames to the host
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx) {
    info!("Serial TX task started");

    let mut buf = [0u8; RESPONSE_FRAME_SIZE];

    loop {
        let record = RESPONSE_CHANNEL.receive().await;
        let frame = Frame::response(&record);

        match frame.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("Failed to send response: {:?}", e);
                } else {
                    trace!("TX: id={} echo={}", record[0], record[1]);
                }
            }
            Err(e) => {
                warn!("Failed to encode response frame: {:?}", e);
            }
        }
    }
}
