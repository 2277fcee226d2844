//! Raw access to the BCM283x GPIO register block.
//!
//! Everything that touches hardware memory goes through [`RegisterBlock`].
//! The rest of the crate only ever passes fixed offsets from this module.

use core::ptr::{NonNull, read_volatile, write_volatile};

/// Size of the GPIO register block exposed by `/dev/gpiomem`.
pub const GPIOMEM_SIZE: usize = 0xB4;

/// Function select registers, ten pins per register, three bits per pin.
pub const GPFSEL: [usize; 6] = [0x00, 0x04, 0x08, 0x0C, 0x10, 0x14];
/// Output set, pins 0..=31.
pub const GPSET0: usize = 0x1C;
/// Output set, pins 32..=53.
pub const GPSET1: usize = 0x20;
/// Output clear, pins 0..=31.
pub const GPCLR0: usize = 0x28;
/// Output clear, pins 32..=53.
pub const GPCLR1: usize = 0x2C;
/// Pin level, pins 0..=31.
pub const GPLEV0: usize = 0x34;
/// Pin level, pins 32..=53.
pub const GPLEV1: usize = 0x38;

/// 32-bit register access at byte offsets into the peripheral block.
///
/// Implementations must perform exactly one aligned 4-byte transfer per call
/// and must not cache, merge or reorder accesses. An offset outside the block
/// is a programming error and may panic.
pub trait RegisterBlock {
    /// Reads the register at `offset`.
    fn read32(&self, offset: usize) -> u32;

    /// Writes `value` to the register at `offset`.
    ///
    /// The write takes effect on the hardware immediately and is never
    /// acknowledged.
    fn write32(&self, offset: usize, value: u32);
}

impl<T: RegisterBlock + ?Sized> RegisterBlock for &T {
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

/// Volatile view over a mapped register block.
#[derive(Debug)]
pub struct MappedRegisters {
    base: NonNull<u32>,
    len: usize,
}

impl MappedRegisters {
    /// Wraps `len` bytes of mapped memory starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be 4-byte aligned and valid for volatile reads and writes
    /// of `len` bytes for as long as the returned value (and anything
    /// borrowing it) is alive. Nothing else may hold Rust references into
    /// that memory.
    ///
    /// # Panics
    ///
    /// Panics if `base` is null, misaligned, or `len` does not cover
    /// [`GPIOMEM_SIZE`].
    pub unsafe fn new(base: *mut u8, len: usize) -> Self {
        assert!(len >= GPIOMEM_SIZE, "register block too small: {len:#x} bytes");
        assert!(base as usize % 4 == 0, "register block is not word aligned");
        let base = NonNull::new(base.cast::<u32>()).expect("null register block");
        MappedRegisters { base, len }
    }

    /// Length of the mapped span in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; a block shorter than [`GPIOMEM_SIZE`] is rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn register(&self, offset: usize) -> *mut u32 {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.len,
            "register offset {offset:#x} outside {:#x} byte block",
            self.len
        );
        // SAFETY: the offset was bounds and alignment checked above.
        unsafe { self.base.as_ptr().add(offset / 4) }
    }
}

impl RegisterBlock for MappedRegisters {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: `new` guarantees the span is valid for volatile access.
        unsafe { read_volatile(self.register(offset)) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        // SAFETY: `new` guarantees the span is valid for volatile access.
        unsafe { write_volatile(self.register(offset), value) }
    }
}
