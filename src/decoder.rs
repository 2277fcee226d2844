use core::fmt;

use crate::capture::{MISSING, PULSE_COUNT, PulseSample};
use crate::config::{Config, FrameEncoding};

/// The five payload bytes as sent by the sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorFrame {
    pub humidity_high: u8,
    pub humidity_low: u8,
    pub temperature_high: u8,
    pub temperature_low: u8,
    pub checksum: u8,
}

impl SensorFrame {
    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        let [humidity_high, humidity_low, temperature_high, temperature_low, checksum] = bytes;
        SensorFrame {
            humidity_high,
            humidity_low,
            temperature_high,
            temperature_low,
            checksum,
        }
    }

    /// Sum of the four data bytes modulo 256.
    pub fn computed_checksum(&self) -> u8 {
        [
            self.humidity_high,
            self.humidity_low,
            self.temperature_high,
            self.temperature_low,
        ]
        .iter()
        .fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    pub fn is_valid(&self) -> bool {
        self.computed_checksum() == self.checksum
    }

    /// Interprets the data bytes. Does not look at the checksum.
    pub fn measurement(&self, encoding: FrameEncoding) -> Measurement {
        Measurement {
            temperature_c: encoding.value(self.temperature_high, self.temperature_low),
            humidity_pct: encoding.value(self.humidity_high, self.humidity_low),
        }
    }
}

/// A checksum-verified reading.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Temperature in degrees Celsius.
    pub temperature_c: f32,
    /// Relative humidity in percent.
    pub humidity_pct: f32,
}

/// One observation from a decoded cycle.
///
/// A cycle may produce several of these at once; see [`Report::outcomes`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    Measurement(Measurement),
    /// The acknowledgment pulse fell outside the expected window.
    AckTimingWarning { observed_us: i32 },
    /// The data pulse at this sample index timed out and was read as 0.
    MissingBit { index: usize },
    /// The transmitted checksum disagrees with the data bytes.
    ChecksumMismatch { computed: u8, expected: u8 },
}

impl fmt::Display for SampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleOutcome::Measurement(m) => write!(
                f,
                "T = {:.1}\u{b0}C, H = {:.1}%",
                m.temperature_c, m.humidity_pct
            ),
            SampleOutcome::AckTimingWarning { observed_us } => {
                write!(f, "Wrong ack response time {observed_us}us")
            }
            SampleOutcome::MissingBit { index } => write!(f, "error: missing data bit {index}"),
            SampleOutcome::ChecksumMismatch { computed, expected } => write!(
                f,
                "Checksum error: computed = {computed}, cs = {expected}"
            ),
        }
    }
}

/// Everything learned from one [`PulseSample`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    frame: SensorFrame,
    ack_warning: Option<i32>,
    /// Bit `i` set when sample index `i` timed out.
    missing: u64,
    measurement: Option<Measurement>,
}

impl Report {
    /// The reconstructed bytes, whether or not they check out.
    pub fn frame(&self) -> SensorFrame {
        self.frame
    }

    /// The reading, present only when the checksum matched.
    pub fn measurement(&self) -> Option<Measurement> {
        self.measurement
    }

    /// Observed acknowledgment width when it was out of window.
    pub fn ack_warning(&self) -> Option<i32> {
        self.ack_warning
    }

    /// Sample indices (1..=40) of data bits that timed out.
    pub fn missing_bits(&self) -> impl Iterator<Item = usize> + '_ {
        (1..PULSE_COUNT).filter(|i| self.missing & (1 << i) != 0)
    }

    /// `(computed, expected)` checksum when the frame was rejected.
    pub fn checksum_mismatch(&self) -> Option<(u8, u8)> {
        match self.measurement {
            Some(_) => None,
            None => Some((self.frame.computed_checksum(), self.frame.checksum)),
        }
    }

    /// True when the cycle produced a measurement and nothing else.
    pub fn is_clean(&self) -> bool {
        self.measurement.is_some() && self.ack_warning.is_none() && self.missing == 0
    }

    /// All outcomes of the cycle: ack warning, missing bits in order, then
    /// the measurement or the checksum mismatch.
    pub fn outcomes(&self) -> impl Iterator<Item = SampleOutcome> + '_ {
        let verdict = match self.measurement {
            Some(m) => SampleOutcome::Measurement(m),
            None => SampleOutcome::ChecksumMismatch {
                computed: self.frame.computed_checksum(),
                expected: self.frame.checksum,
            },
        };

        self.ack_warning
            .map(|observed_us| SampleOutcome::AckTimingWarning { observed_us })
            .into_iter()
            .chain(self.missing_bits().map(|index| SampleOutcome::MissingBit { index }))
            .chain(core::iter::once(verdict))
    }
}

/// Turns pulse widths into a [`Report`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDecoder {
    bit_threshold_us: i32,
    ack_expected_us: i32,
    ack_deviation_us: i32,
    encoding: FrameEncoding,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl FrameDecoder {
    pub fn new(config: &Config) -> Self {
        FrameDecoder {
            bit_threshold_us: config.bit_threshold_us,
            ack_expected_us: config.ack_expected_us,
            ack_deviation_us: config.ack_deviation_us,
            encoding: config.encoding,
        }
    }

    /// Decodes a full sample.
    ///
    /// Never stops early: every diagnostic of the cycle ends up in the
    /// report, and a measurement is only produced when the checksum holds.
    pub fn decode(&self, sample: &PulseSample) -> Report {
        let ack = sample.ack();
        let ack_warning = (!self.ack_in_window(ack)).then_some(ack);

        let mut bytes = [0u8; 5];
        let mut missing = 0u64;
        for (i, width) in sample.data().iter().enumerate() {
            let byte = &mut bytes[i / 8];
            *byte <<= 1;
            if *width > self.bit_threshold_us {
                *byte |= 1;
            } else if *width == MISSING {
                missing |= 1 << (i + 1);
            }
        }

        let frame = SensorFrame::from_bytes(bytes);
        let measurement = frame.is_valid().then(|| frame.measurement(self.encoding));

        #[cfg(feature = "defmt")]
        if measurement.is_none() {
            defmt::warn!(
                "checksum mismatch: computed {=u8}, transmitted {=u8}",
                frame.computed_checksum(),
                frame.checksum
            );
        }

        Report {
            frame,
            ack_warning,
            missing,
            measurement,
        }
    }

    fn ack_in_window(&self, observed_us: i32) -> bool {
        (observed_us - self.ack_expected_us).abs() < self.ack_deviation_us
    }
}
