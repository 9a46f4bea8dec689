//! msplib-test-harness: Mock transports for deterministic msplib testing.
//!
//! This crate provides [`MockTransport`] for unit testing the MSP frame
//! parser and the device transaction layer without real flight-controller
//! hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
