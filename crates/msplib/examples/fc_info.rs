//! Basic flight-controller query example.
//!
//! Connects to an MSP responder, identifies the firmware, and reads the
//! current attitude.
//!
//! # Requirements
//!
//! - A flight controller running MultiWii, Cleanflight, Betaflight, or INAV
//!   connected via USB
//! - The serial port path adjusted for your system (e.g., `/dev/ttyACM0`
//!   on Linux, `COM3` on Windows)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p msplib --example fc_info
//! ```

use msplib::{commands, MspDevice};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Adjust this to match your system's serial port.
    let serial_port = "/dev/ttyACM0";

    println!("Connecting to flight controller on {}...", serial_port);
    let device = MspDevice::open(serial_port).await?;

    // API version: protocol version, API major, API minor.
    let packet = device.get(commands::MSP_API_VERSION).await?;
    if let [proto, major, minor] = packet.payload[..] {
        println!("MSP API: protocol {}, version {}.{}", proto, major, minor);
    }

    // Firmware variant: four ASCII characters, e.g. "BTFL" or "INAV".
    let packet = device.get(commands::MSP_FC_VARIANT).await?;
    println!("Firmware: {}", String::from_utf8_lossy(&packet.payload));

    // Attitude: roll/pitch in tenths of a degree, heading in degrees, all
    // little-endian i16.
    let packet = device.get(commands::MSP_ATTITUDE).await?;
    if packet.payload.len() >= 6 {
        let word = |i: usize| i16::from_le_bytes([packet.payload[i], packet.payload[i + 1]]);
        println!(
            "Attitude: roll {:.1}°, pitch {:.1}°, heading {}°",
            word(0) as f32 / 10.0,
            word(2) as f32 / 10.0,
            word(4)
        );
    }

    device.close().await?;
    println!("Done.");
    Ok(())
}
