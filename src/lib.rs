//! DHT11/DHT22 Driver over Memory-Mapped GPIO
//!
//! This crate reads a single-wire DHT temperature and humidity sensor by
//! bit-banging a BCM283x GPIO through its register block (as exposed by
//! `/dev/gpiomem` on a Raspberry Pi) and timing the reply at microsecond
//! resolution.
//!
//! # Layers
//! - [`registers`]: volatile 32-bit access to the mapped block
//! - [`pin`]: function select and set/clear/level for one pin
//! - [`capture`]: request handshake and busy-polled pulse timing
//! - [`decoder`]: pulse widths to a checksummed [`SensorFrame`]
//! - [`Dht`]: the two steps above as one sampling cycle
//!
//! # Features
//! - Designed for `no_std` environments, built on [`embedded-hal`] traits
//! - A cycle never aborts on a bad signal: timeouts, ack deviations and
//!   checksum mismatches are all reported together in a [`Report`]
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs capture/decode details
//! - `linux`: `/dev/gpiomem` mapping, host clocks and the `dht` binary
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

#![cfg_attr(not(any(test, feature = "linux")), no_std)]

pub mod capture;
pub mod config;
pub mod decoder;
pub mod error;
pub mod pin;
pub mod registers;
pub mod sensor;

#[cfg(feature = "linux")]
pub mod linux;

#[cfg(test)]
mod testing;

pub use capture::{FlexPin, MicrosClock, PulseCapture, PulseSample};
pub use config::{Config, FrameEncoding, Invocation};
pub use decoder::{FrameDecoder, Measurement, Report, SampleOutcome, SensorFrame};
pub use error::{ConfigError, DhtError, InvalidPin};
pub use pin::{Direction, GpioPin, PinHandle};
pub use registers::{MappedRegisters, RegisterBlock};
pub use sensor::Dht;
