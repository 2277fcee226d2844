use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::config::Config;
use crate::error::DhtError;
use crate::pin::Direction;

/// Pulses captured per cycle: one acknowledgment plus 40 data bits.
pub const PULSE_COUNT: usize = 41;

/// Width recorded for a pulse whose edge never arrived.
pub const MISSING: i32 = 0;

const MICROS_PER_SECOND: i32 = 1_000_000;

/// A pin that can switch between driving and sampling the data line.
pub trait FlexPin: InputPin + OutputPin {
    /// Reconfigures the pin function.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

/// Microsecond clock used to time pulses.
///
/// Readings count microseconds within the current second and wrap from
/// 999_999 back to 0, like `gettimeofday`'s `tv_usec`.
pub trait MicrosClock {
    fn now_us(&mut self) -> u32;
}

impl<T: MicrosClock + ?Sized> MicrosClock for &mut T {
    fn now_us(&mut self) -> u32 {
        (**self).now_us()
    }
}

/// Microseconds from `start` to `end`, unwrapping one second rollover.
pub fn elapsed_us(start: u32, end: u32) -> i32 {
    let elapsed = end as i32 - start as i32;
    if elapsed < 0 {
        elapsed + MICROS_PER_SECOND
    } else {
        elapsed
    }
}

/// High pulse widths of one sampling cycle.
///
/// Slot 0 is the acknowledgment, slots 1..=40 are data bits, most
/// significant bit of the humidity high byte first.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseSample {
    widths: [i32; PULSE_COUNT],
}

impl PulseSample {
    pub const fn new(widths: [i32; PULSE_COUNT]) -> Self {
        PulseSample { widths }
    }

    /// Acknowledgment pulse width.
    pub fn ack(&self) -> i32 {
        self.widths[0]
    }

    /// The 40 data pulse widths.
    pub fn data(&self) -> &[i32] {
        &self.widths[1..]
    }

    pub fn widths(&self) -> &[i32; PULSE_COUNT] {
        &self.widths
    }

    /// Slot indices whose edge timed out.
    pub fn missing(&self) -> impl Iterator<Item = usize> + '_ {
        self.widths
            .iter()
            .enumerate()
            .filter(|(_, w)| **w == MISSING)
            .map(|(i, _)| i)
    }
}

/// Drives the request handshake and times the sensor's reply.
///
/// Polling is a busy loop of `timeout_polls` samples spaced by
/// `poll_interval_us`; no step blocks past that bound.
pub struct PulseCapture<PIN, DELAY, CLOCK> {
    pin: PIN,
    delay: DELAY,
    clock: CLOCK,
    config: Config,
}

impl<PIN, DELAY, CLOCK, E> PulseCapture<PIN, DELAY, CLOCK>
where
    PIN: FlexPin<Error = E>,
    DELAY: DelayNs,
    CLOCK: MicrosClock,
{
    /// Creates a capture engine.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO connected to the sensor data line.
    /// * `delay` - Provides the handshake holds and the pause between polls.
    /// * `clock` - Timestamps pulse edges.
    /// * `config` - Protocol timings.
    pub fn new(pin: PIN, delay: DELAY, clock: CLOCK, config: Config) -> Self {
        PulseCapture {
            pin,
            delay,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one full cycle: request, then 41 pulse measurements.
    ///
    /// Timed-out pulses are recorded as [`MISSING`] and capture carries on
    /// with the next slot.
    pub fn capture(&mut self) -> Result<PulseSample, DhtError<E>> {
        self.request()?;

        let mut widths = [MISSING; PULSE_COUNT];
        for width in widths.iter_mut() {
            *width = self.measure_pulse()?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("captured pulses {=[?]}", &widths[..]);

        Ok(PulseSample::new(widths))
    }

    /// Wake/request handshake: high, low, brief high, then release.
    ///
    /// All holds are lower bounds; the sensor ignores a short request.
    fn request(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_direction(Direction::Output)?;
        self.pin.set_high()?;
        self.delay.delay_us(self.config.request_us);
        self.pin.set_low()?;
        self.delay.delay_us(self.config.request_us);
        self.pin.set_high()?;
        self.delay.delay_us(self.config.release_us);
        self.pin.set_direction(Direction::Input)?;
        Ok(())
    }

    /// Times one high pulse: waits out the low phase, then measures how long
    /// the line stays high.
    fn measure_pulse(&mut self) -> Result<i32, DhtError<E>> {
        if !self.wait_while(false)? {
            return Ok(MISSING);
        }
        let start = self.clock.now_us();
        if !self.wait_while(true)? {
            return Ok(MISSING);
        }
        let end = self.clock.now_us();
        Ok(elapsed_us(start, end))
    }

    /// Polls while the line reads `high`.
    ///
    /// Returns `false` once `timeout_polls` samples all matched, i.e. the
    /// line never changed.
    fn wait_while(&mut self, high: bool) -> Result<bool, DhtError<E>> {
        for _ in 0..self.config.timeout_polls {
            if self.pin.is_high()? != high {
                return Ok(true);
            }
            self.delay.delay_us(self.config.poll_interval_us);
        }
        Ok(false)
    }

    /// Gives back the pin, delay and clock.
    pub fn release(self) -> (PIN, DELAY, CLOCK) {
        (self.pin, self.delay, self.clock)
    }
}
