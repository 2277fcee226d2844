//! Test doubles shared by the unit tests.

use core::cell::{Cell, RefCell};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal_mock::eh1::delay::Transaction as DelayTx;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTx};

use crate::capture::{FlexPin, MicrosClock};
use crate::config::Config;
use crate::pin::Direction;
use crate::registers::{GPCLR0, GPCLR1, GPIOMEM_SIZE, GPLEV0, GPLEV1, GPSET0, GPSET1, RegisterBlock};

/// In-memory register block.
///
/// Writes to the set/clear registers update the matching level register the
/// way an output pin would; every write is logged.
pub struct FakeRegisters {
    words: [Cell<u32>; GPIOMEM_SIZE / 4],
    writes: RefCell<Vec<(usize, u32)>>,
}

impl FakeRegisters {
    pub fn new() -> Self {
        FakeRegisters {
            words: core::array::from_fn(|_| Cell::new(0)),
            writes: RefCell::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.borrow().clone()
    }

    fn word(&self, offset: usize) -> &Cell<u32> {
        assert!(offset % 4 == 0, "unaligned offset {offset:#x}");
        &self.words[offset / 4]
    }
}

impl RegisterBlock for FakeRegisters {
    fn read32(&self, offset: usize) -> u32 {
        self.word(offset).get()
    }

    fn write32(&self, offset: usize, value: u32) {
        self.writes.borrow_mut().push((offset, value));
        match offset {
            GPSET0 => self.word(GPLEV0).set(self.word(GPLEV0).get() | value),
            GPSET1 => self.word(GPLEV1).set(self.word(GPLEV1).get() | value),
            GPCLR0 => self.word(GPLEV0).set(self.word(GPLEV0).get() & !value),
            GPCLR1 => self.word(GPLEV1).set(self.word(GPLEV1).get() & !value),
            _ => self.word(offset).set(value),
        }
    }
}

/// `embedded-hal-mock` pin that also records direction changes.
pub struct MockLine {
    pub pin: PinMock,
    pub directions: Vec<Direction>,
}

impl MockLine {
    pub fn new(pin: PinMock) -> Self {
        MockLine {
            pin,
            directions: Vec::new(),
        }
    }
}

impl ErrorType for MockLine {
    type Error = <PinMock as ErrorType>::Error;
}

impl InputPin for MockLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_low()
    }
}

impl OutputPin for MockLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }
}

impl FlexPin for MockLine {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.directions.push(direction);
        Ok(())
    }
}

/// Clock replaying a fixed list of timestamps.
pub struct ScriptedClock {
    ticks: Vec<u32>,
    next: usize,
}

impl ScriptedClock {
    pub fn new(ticks: &[u32]) -> Self {
        ScriptedClock {
            ticks: ticks.to_vec(),
            next: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next == self.ticks.len()
    }
}

impl MicrosClock for ScriptedClock {
    fn now_us(&mut self) -> u32 {
        let tick = *self
            .ticks
            .get(self.next)
            .expect("clock read more often than scripted");
        self.next += 1;
        tick
    }
}

/// Pin reads for one pulse with a single poll in each phase.
pub fn pulse_transactions() -> Vec<PinTx> {
    vec![
        PinTx::get(PinState::Low),
        PinTx::get(PinState::High),
        PinTx::get(PinState::High),
        PinTx::get(PinState::Low),
    ]
}

/// Delays of the request handshake.
pub fn request_delays(config: &Config) -> Vec<DelayTx> {
    vec![
        DelayTx::delay_us(config.request_us),
        DelayTx::delay_us(config.request_us),
        DelayTx::delay_us(config.release_us),
    ]
}
