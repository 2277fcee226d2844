use core::fmt;

/// Possible errors from a sampling cycle.
///
/// Signal problems (timeouts, checksum mismatches) are not errors here: they
/// are reported as [`SampleOutcome`](crate::SampleOutcome)s so a cycle always
/// completes.
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Error from the GPIO pin (input/output/direction).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinError(e) => write!(f, "gpio pin error: {e:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}

/// A pin number that does not map onto a function-select bank.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidPin(pub u32);

impl fmt::Display for InvalidPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO pin number range is from 0 to 53, got {}", self.0)
    }
}

impl core::error::Error for InvalidPin {}

/// Rejected command line invocation.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Wrong number of arguments.
    Usage,
    /// The pin argument is not a decimal number.
    PinNotNumeric,
    /// The pin argument is a number outside 0..=53.
    PinOutOfRange(InvalidPin),
    /// The sampling interval is not a decimal number.
    IntervalNotNumeric,
    /// A zero second interval would hammer the sensor.
    IntervalZero,
}

impl From<InvalidPin> for ConfigError {
    fn from(value: InvalidPin) -> Self {
        Self::PinOutOfRange(value)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage => f.write_str("Usage: dht <gpio_pin> [sampling_rate_sec]"),
            Self::PinNotNumeric => f.write_str("GPIO pin is not a number"),
            Self::PinOutOfRange(e) => e.fmt(f),
            Self::IntervalNotNumeric => f.write_str("sampling rate is not a number"),
            Self::IntervalZero => f.write_str("sampling rate must be at least 1s"),
        }
    }
}

impl core::error::Error for ConfigError {}
