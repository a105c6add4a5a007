//! # Register access
//!
//! Every peripheral is driven through a [`RegisterBus`]: raw 32-bit reads and writes at absolute
//! addresses, plus a read-modify-write primitive.
//!
//! Several drivers configure different bits of the same register (the clock enables, the pin
//! mode register and the output data register are all shared). These registers must only ever
//! be updated with [`modify()`](RegisterBus::modify) so that bits belonging to another driver
//! are written back untouched. A plain [`write()`](RegisterBus::write) is reserved for registers
//! that are owned outright by a single driver, or for trigger bits which the hardware clears by
//! itself.

use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr;

/// A named bit-field inside a 32-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    /// Position of the least significant bit
    pub shift: u8,
    /// Number of bits
    pub width: u8,
}

impl Field {
    pub const fn new(shift: u8, width: u8) -> Self {
        assert!(
            width > 0 && shift as u32 + width as u32 <= 32,
            "Field does not fit in a 32-bit register"
        );

        Self { shift, width }
    }

    /// A single bit field
    pub const fn bit(shift: u8) -> Self {
        Self::new(shift, 1)
    }

    /// The bits covered by the field, in place
    pub const fn mask(&self) -> u32 {
        let ones = if self.width == 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        };

        ones << self.shift
    }

    /// Shift `value` into position. Bits that don't fit in the field are dropped.
    pub const fn encode(&self, value: u32) -> u32 {
        (value << self.shift) & self.mask()
    }

    /// Pull the field out of a register value
    pub const fn extract(&self, word: u32) -> u32 {
        (word & self.mask()) >> self.shift
    }
}

/// Access to a file of 32-bit memory mapped registers
pub trait RegisterBus {
    /// Read the register at `addr`
    fn read(&self, addr: usize) -> u32;

    /// Overwrite the register at `addr`
    fn write(&self, addr: usize, value: u32);

    /// Read the register, clear the bits in `clear`, set the bits in `set` and write it back.
    ///
    /// Bits in neither mask keep their value. Set wins when a bit is in both masks.
    fn modify(&self, addr: usize, set: u32, clear: u32) {
        let value = self.read(addr);
        self.write(addr, (value & !clear) | set);
    }
}

/// Volatile access to the real register file.
///
/// The bus can be moved but not shared (`Send`, `!Sync`), so all register traffic comes from one
/// execution context at a time. [`modify()`](RegisterBus::modify) additionally runs inside a
/// critical section so that an interrupt handler can't land between the read and the write.
pub struct Mmio {
    _not_sync: PhantomData<Cell<()>>,
}

impl Mmio {
    /// # Safety
    ///
    /// Every address later given to the bus must be a valid, aligned and mapped 32-bit register,
    /// and nothing else may access those registers while the bus is alive.
    pub const unsafe fn new() -> Self {
        Self {
            _not_sync: PhantomData,
        }
    }
}

impl RegisterBus for Mmio {
    fn read(&self, addr: usize) -> u32 {
        // Valid per the contract of Mmio::new
        unsafe { ptr::read_volatile(addr as *const u32) }
    }

    fn write(&self, addr: usize, value: u32) {
        // Valid per the contract of Mmio::new
        unsafe { ptr::write_volatile(addr as *mut u32, value) }
    }

    fn modify(&self, addr: usize, set: u32, clear: u32) {
        critical_section::with(|_| {
            let value = self.read(addr);
            self.write(addr, (value & !clear) | set);
        });
    }
}
