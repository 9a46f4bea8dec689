//! Well-known MSP command numbers.
//!
//! MSP itself is just a framing scheme; the command number selects what the
//! responder does and dictates the payload layout in both directions. These
//! constants cover the classic MultiWii command set that every major
//! firmware (MultiWii, Cleanflight, Betaflight, INAV) still answers.
//! Firmware-specific commands beyond this set can be passed to
//! [`MspDevice::get`](crate::MspDevice::get) and
//! [`MspDevice::set`](crate::MspDevice::set) as plain numbers.
//!
//! Commands 100..200 are reads (use `get`), 200 and up are writes
//! (use `set`).

/// MSP API version: payload is protocol version, API major, API minor.
pub const MSP_API_VERSION: u16 = 1;
/// Firmware variant identifier, four ASCII characters (e.g. `BTFL`).
pub const MSP_FC_VARIANT: u16 = 2;
/// Firmware version: major, minor, patch.
pub const MSP_FC_VERSION: u16 = 3;
/// Board identifier and hardware revision.
pub const MSP_BOARD_INFO: u16 = 4;
/// Firmware build date and time.
pub const MSP_BUILD_INFO: u16 = 5;

/// Legacy identification: MultiWii version, mixer type, capabilities.
pub const MSP_IDENT: u16 = 100;
/// Cycle time, i2c error count, sensor flags, active mode flags.
pub const MSP_STATUS: u16 = 101;
/// Raw accelerometer, gyroscope, and magnetometer readings.
pub const MSP_RAW_IMU: u16 = 102;
/// Current RC channel values, one little-endian u16 per channel.
pub const MSP_RC: u16 = 105;
/// GPS fix, satellite count, coordinates, altitude, speed.
pub const MSP_RAW_GPS: u16 = 106;
/// Attitude: roll and pitch in tenths of a degree, heading in degrees.
pub const MSP_ATTITUDE: u16 = 108;
/// Barometric altitude and vertical speed.
pub const MSP_ALTITUDE: u16 = 109;
/// Battery voltage, current draw, RSSI.
pub const MSP_ANALOG: u16 = 110;

/// Override RC channels with the supplied values.
pub const MSP_SET_RAW_RC: u16 = 200;
/// Set individual motor outputs (bench testing).
pub const MSP_SET_MOTOR: u16 = 214;
