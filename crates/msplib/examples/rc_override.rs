//! RC override streaming example.
//!
//! Streams neutral stick positions to the flight controller at a fixed rate
//! using fire-and-forget sets, then reads back what the responder sees.
//!
//! WARNING: MSP_SET_RAW_RC takes over the radio link. Only run this with
//! props off.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p msplib --example rc_override
//! ```

use std::time::Duration;

use msplib::{commands, MspDevice};

/// Mid-stick on all channels (1500 µs).
const NEUTRAL: u16 = 1500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let device = MspDevice::open("/dev/ttyACM0").await?;

    // Eight channels, little-endian u16 each: AERT plus four aux.
    let mut payload = Vec::with_capacity(16);
    for _ in 0..8 {
        payload.extend_from_slice(&NEUTRAL.to_le_bytes());
    }

    println!("Streaming neutral sticks for 2 seconds...");
    for _ in 0..40 {
        // No ack wait: the next flush discards the responder's reply, and
        // a 50 Hz stream has no time for round trips.
        device.set_no_ack(commands::MSP_SET_RAW_RC, &payload).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // Confirm with an acknowledged read of the channel values.
    let packet = device.get(commands::MSP_RC).await?;
    let channels: Vec<u16> = packet
        .payload
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    println!("Responder sees channels: {:?}", channels);

    device.close().await?;
    Ok(())
}
