//! Single pin control on top of a [`RegisterBlock`].

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::error::InvalidPin;
use crate::registers::{GPCLR0, GPCLR1, GPFSEL, GPLEV0, GPLEV1, GPSET0, GPSET1, RegisterBlock};

/// Highest GPIO number on the BCM283x register block.
pub const MAX_PIN: u32 = 53;

/// Pins per function-select register.
const PINS_PER_FSEL: u32 = 10;
/// Width of one pin's function field.
const FSEL_BITS: u32 = 3;
const FSEL_FIELD: u32 = 0b111;

/// Pin function.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Encoding of this direction in a function-select field.
    pub const fn function_bits(self) -> u32 {
        match self {
            Direction::Input => 0b000,
            Direction::Output => 0b001,
        }
    }
}

/// Register addressing for one GPIO, derived once from the pin number.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinHandle {
    pin: u8,
    fsel: usize,
    shift: u32,
    set: usize,
    clear: usize,
    level: usize,
    mask: u32,
}

impl PinHandle {
    /// Resolves the registers driving `pin`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPin`] for pins above [`MAX_PIN`].
    pub const fn new(pin: u32) -> Result<Self, InvalidPin> {
        if pin > MAX_PIN {
            return Err(InvalidPin(pin));
        }
        let bank = (pin / PINS_PER_FSEL) as usize;
        let shift = FSEL_BITS * (pin % PINS_PER_FSEL);
        let (set, clear, level, bit) = if pin < 32 {
            (GPSET0, GPCLR0, GPLEV0, pin)
        } else {
            (GPSET1, GPCLR1, GPLEV1, pin - 32)
        };

        Ok(PinHandle {
            pin: pin as u8,
            fsel: GPFSEL[bank],
            shift,
            set,
            clear,
            level,
            mask: 1 << bit,
        })
    }

    /// GPIO number.
    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Offset of the function-select register holding this pin's field.
    pub const fn fsel_offset(&self) -> usize {
        self.fsel
    }

    /// Bit position of this pin's function field.
    pub const fn fsel_shift(&self) -> u32 {
        self.shift
    }

    /// Single bit mask for the set/clear/level registers.
    pub const fn mask(&self) -> u32 {
        self.mask
    }
}

/// A GPIO pin driven through raw registers.
///
/// Every call is one register transaction; nothing is cached.
pub struct GpioPin<R> {
    regs: R,
    handle: PinHandle,
}

impl<R: RegisterBlock> GpioPin<R> {
    /// Takes control of `pin` within `regs`.
    ///
    /// The pin function is left untouched until [`configure`](Self::configure).
    pub fn new(regs: R, pin: u32) -> Result<Self, InvalidPin> {
        Ok(GpioPin {
            regs,
            handle: PinHandle::new(pin)?,
        })
    }

    pub fn handle(&self) -> PinHandle {
        self.handle
    }

    /// Sets the pin function with a read-modify-write of its function-select
    /// register. The other nine fields in the register are preserved.
    pub fn configure(&mut self, direction: Direction) {
        let shift = self.handle.shift;
        let mut value = self.regs.read32(self.handle.fsel);
        value &= !(FSEL_FIELD << shift);
        value |= direction.function_bits() << shift;
        self.regs.write32(self.handle.fsel, value);
    }

    /// Current 3-bit function field of the pin.
    pub fn function(&self) -> u32 {
        (self.regs.read32(self.handle.fsel) >> self.handle.shift) & FSEL_FIELD
    }

    pub fn set_high(&mut self) {
        self.regs.write32(self.handle.set, self.handle.mask);
    }

    pub fn set_low(&mut self) {
        self.regs.write32(self.handle.clear, self.handle.mask);
    }

    /// Samples the pin level.
    pub fn read_level(&self) -> bool {
        let bit = self.handle.mask.trailing_zeros();
        (self.regs.read32(self.handle.level) & self.handle.mask) >> bit == 1
    }

    /// Gives back the register block.
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R> ErrorType for GpioPin<R> {
    type Error = Infallible;
}

impl<R: RegisterBlock> InputPin for GpioPin<R> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read_level())
    }
}

impl<R: RegisterBlock> OutputPin for GpioPin<R> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        GpioPin::set_low(self);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        GpioPin::set_high(self);
        Ok(())
    }
}

impl<R: RegisterBlock> crate::capture::FlexPin for GpioPin<R> {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.configure(direction);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::GPFSEL;
    use crate::testing::FakeRegisters;

    #[test]
    fn test_handle_addressing() {
        let h = PinHandle::new(0).unwrap();
        assert_eq!((h.fsel_offset(), h.fsel_shift(), h.mask()), (GPFSEL[0], 0, 1));

        let h = PinHandle::new(17).unwrap();
        assert_eq!((h.fsel_offset(), h.fsel_shift(), h.mask()), (GPFSEL[1], 21, 1 << 17));

        let h = PinHandle::new(31).unwrap();
        assert_eq!((h.fsel_offset(), h.mask()), (GPFSEL[3], 1 << 31));

        let h = PinHandle::new(32).unwrap();
        assert_eq!((h.fsel_offset(), h.fsel_shift(), h.mask()), (GPFSEL[3], 6, 1));

        let h = PinHandle::new(53).unwrap();
        assert_eq!((h.fsel_offset(), h.fsel_shift(), h.mask()), (GPFSEL[5], 9, 1 << 21));
    }

    #[test]
    fn test_handle_rejects_out_of_range() {
        assert_eq!(PinHandle::new(54), Err(InvalidPin(54)));
        assert_eq!(PinHandle::new(60), Err(InvalidPin(60)));
        assert!(GpioPin::new(&FakeRegisters::new(), 1000).is_err());
    }

    #[test]
    fn test_configure_sets_only_own_field() {
        let regs = FakeRegisters::new();
        regs.write32(GPFSEL[0], 0x3FFF_FFFF);
        let mut pin = GpioPin::new(&regs, 4).unwrap();

        pin.configure(Direction::Input);
        assert_eq!(regs.read32(GPFSEL[0]), 0x3FFF_FFFF & !(0b111 << 12));
        assert_eq!(pin.function(), 0b000);

        pin.configure(Direction::Output);
        assert_eq!(regs.read32(GPFSEL[0]), (0x3FFF_FFFF & !(0b111 << 12)) | (0b001 << 12));
        assert_eq!(pin.function(), 0b001);
    }

    #[test]
    fn test_direction_round_trip_preserves_siblings() {
        // Sibling fields carry alternate functions that must survive.
        let pattern = 0b00_100_101_110_111_011_010_100_101_110_111;

        for pin in 0..=MAX_PIN {
            let regs = FakeRegisters::new();
            let handle = PinHandle::new(pin).unwrap();
            regs.write32(handle.fsel_offset(), pattern);
            let sibling_mask = !(0b111 << handle.fsel_shift());

            let mut gpio = GpioPin::new(&regs, pin).unwrap();
            gpio.configure(Direction::Output);
            gpio.configure(Direction::Input);

            let after = regs.read32(handle.fsel_offset());
            assert_eq!(after & sibling_mask, pattern & sibling_mask, "pin {pin}");
            assert_eq!(gpio.function(), 0, "pin {pin}");
        }
    }

    #[test]
    fn test_set_and_clear_write_single_bit() {
        let regs = FakeRegisters::new();
        let mut low = GpioPin::new(&regs, 5).unwrap();
        let mut high = GpioPin::new(&regs, 40).unwrap();

        low.set_high();
        high.set_high();
        high.set_low();

        assert_eq!(
            regs.writes(),
            vec![(GPSET0, 1 << 5), (GPSET1, 1 << 8), (GPCLR1, 1 << 8)]
        );
    }

    #[test]
    fn test_read_level() {
        let regs = FakeRegisters::new();
        let mut pin = GpioPin::new(&regs, 33).unwrap();
        assert!(!pin.read_level());

        pin.set_high();
        assert!(pin.read_level());
        assert_eq!(regs.read32(GPLEV1), 0b10);

        pin.set_low();
        assert!(!pin.read_level());
    }

    #[test]
    fn test_read_level_ignores_other_pins() {
        let regs = FakeRegisters::new();
        regs.write32(GPLEV0, !(1 << 31));
        let pin = GpioPin::new(&regs, 31).unwrap();
        assert!(!pin.read_level());

        regs.write32(GPLEV0, 1 << 31);
        assert!(pin.read_level());
    }

    #[test]
    fn test_embedded_hal_traits() {
        let regs = FakeRegisters::new();
        let mut pin = GpioPin::new(&regs, 22).unwrap();

        OutputPin::set_high(&mut pin).unwrap();
        assert!(pin.is_high().unwrap());
        OutputPin::set_low(&mut pin).unwrap();
        assert!(pin.is_low().unwrap());
    }
}
