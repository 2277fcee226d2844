use embedded_hal::delay::DelayNs;

use crate::capture::{FlexPin, MicrosClock, PulseCapture, PulseSample};
use crate::config::Config;
use crate::decoder::{FrameDecoder, Report};
use crate::error::DhtError;

/// Driver for a DHT11/DHT22 sensor on a bit-banged GPIO.
pub struct Dht<PIN, DELAY, CLOCK> {
    capture: PulseCapture<PIN, DELAY, CLOCK>,
    decoder: FrameDecoder,
}

impl<PIN, DELAY, CLOCK, E> Dht<PIN, DELAY, CLOCK>
where
    PIN: FlexPin<Error = E>,
    DELAY: DelayNs,
    CLOCK: MicrosClock,
{
    /// Creates a driver with the default DHT22 timings.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the data line. Must support both input and output.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `clock` - A microsecond clock used to time pulses.
    pub fn new(pin: PIN, delay: DELAY, clock: CLOCK) -> Self {
        Self::with_config(pin, delay, clock, Config::default())
    }

    /// Creates a driver with custom protocol constants.
    pub fn with_config(pin: PIN, delay: DELAY, clock: CLOCK, config: Config) -> Self {
        Dht {
            capture: PulseCapture::new(pin, delay, clock, config),
            decoder: FrameDecoder::new(&config),
        }
    }

    pub fn config(&self) -> &Config {
        self.capture.config()
    }

    /// Runs one sampling cycle.
    ///
    /// This method performs the complete communication sequence: sending
    /// the request, timing the 41 response pulses and decoding them.
    ///
    /// # Returns
    ///
    /// * `Ok(Report)` once the cycle has run, whatever the signal quality.
    ///   Check [`Report::measurement`] for a valid reading.
    /// * `Err(DhtError)` if the pin itself failed.
    pub fn read(&mut self) -> Result<Report, DhtError<E>> {
        let sample = self.capture.capture()?;
        Ok(self.decode(&sample))
    }

    /// Captures raw pulse widths without decoding them.
    pub fn capture(&mut self) -> Result<PulseSample, DhtError<E>> {
        self.capture.capture()
    }

    pub fn decode(&self, sample: &PulseSample) -> Report {
        self.decoder.decode(sample)
    }

    /// Gives back the pin, delay and clock.
    pub fn release(self) -> (PIN, DELAY, CLOCK) {
        self.capture.release()
    }
}
