//! Protocol constants and caller invocation.

use crate::error::ConfigError;
use crate::pin::PinHandle;

/// How a pair of payload bytes turns into a value.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameEncoding {
    /// High and low byte form one 16-bit integer in tenths (DHT22 layout).
    #[default]
    Wide,
    /// High byte is the integral part, low byte the tenths (DHT11 layout).
    Split,
}

impl FrameEncoding {
    /// Combines a high/low byte pair into a value.
    pub fn value(self, high: u8, low: u8) -> f32 {
        let tenths = match self {
            FrameEncoding::Wide => u16::from_be_bytes([high, low]),
            FrameEncoding::Split => u16::from(high) * 10 + u16::from(low),
        };
        f32::from(tenths) / 10.0
    }
}

/// Timing and decoding constants for one sensor family.
///
/// Defaults match a DHT22 sampled over `/dev/gpiomem`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Minimum time the request high and low phases are held.
    pub request_us: u32,
    /// Minimum final high phase before the pin is released.
    pub release_us: u32,
    /// Sleep between two samples of the pin.
    pub poll_interval_us: u32,
    /// Number of polls before an edge is given up on.
    ///
    /// This is an iteration count, not a duration. Its physical length is
    /// roughly `timeout_polls * poll_interval_us` plus scheduling overhead.
    pub timeout_polls: u32,
    /// Nominal acknowledgment pulse width.
    pub ack_expected_us: i32,
    /// The acknowledgment is accepted while strictly closer than this to nominal.
    pub ack_deviation_us: i32,
    /// High pulses strictly longer than this decode as 1.
    pub bit_threshold_us: i32,
    pub encoding: FrameEncoding,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            request_us: 18_000,
            release_us: 30,
            poll_interval_us: 1,
            timeout_polls: 150,
            ack_expected_us: 80,
            ack_deviation_us: 30,
            bit_threshold_us: 50,
            encoding: FrameEncoding::Wide,
        }
    }
}

impl Config {
    pub fn with_request_us(mut self, request_us: u32) -> Self {
        self.request_us = request_us;
        self
    }

    pub fn with_timeout_polls(mut self, timeout_polls: u32) -> Self {
        self.timeout_polls = timeout_polls;
        self
    }

    pub fn with_poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    pub fn with_ack_window(mut self, expected_us: i32, deviation_us: i32) -> Self {
        self.ack_expected_us = expected_us;
        self.ack_deviation_us = deviation_us;
        self
    }

    pub fn with_bit_threshold_us(mut self, bit_threshold_us: i32) -> Self {
        self.bit_threshold_us = bit_threshold_us;
        self
    }

    pub fn with_encoding(mut self, encoding: FrameEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Seconds between sampling cycles when none is given.
pub const DEFAULT_INTERVAL_SECS: u32 = 1;

/// Validated `<gpio_pin> [sampling_interval_sec]` arguments.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub pin: u32,
    pub interval_secs: u32,
}

impl Invocation {
    /// Parses the arguments following the program name.
    ///
    /// Nothing here touches hardware, so a bad invocation is rejected before
    /// the register block is ever mapped.
    pub fn parse<'a, I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut args = args.into_iter();
        let pin = args.next().ok_or(ConfigError::Usage)?;
        let interval = args.next();
        if args.next().is_some() {
            return Err(ConfigError::Usage);
        }

        let pin = parse_decimal(pin).ok_or(ConfigError::PinNotNumeric)?;
        PinHandle::new(pin)?;

        let interval_secs = match interval {
            None => DEFAULT_INTERVAL_SECS,
            Some(s) => parse_decimal(s).ok_or(ConfigError::IntervalNotNumeric)?,
        };
        if interval_secs == 0 {
            return Err(ConfigError::IntervalZero);
        }

        Ok(Invocation { pin, interval_secs })
    }
}

/// Plain ASCII digits only; `str::parse` alone would accept a leading `+`.
fn parse_decimal(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
