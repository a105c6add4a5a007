//! # General purpose IO
//!
//! All of the board's peripherals hang off a single port. Each pin has a 2-bit field in the mode
//! register and a bit in each of the data registers.
//!
//! A pin only drives its output data bit once it is in [`PinMode::Output`], and the ADC can only
//! sample it once it is in [`PinMode::Analog`].

use crate::error::{Error, Result};
use crate::layout::GpioLayout;
use crate::register::{Field, RegisterBus};

/// A pin number within the port (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    pub const MAX: u8 = 15;

    /// Checked constructor for compile time pin maps
    pub const fn at(pin: u8) -> Self {
        if pin > Self::MAX {
            panic!("Invalid pin number");
        }

        Self(pin)
    }

    pub fn new(pin: u8) -> Result<Self> {
        if pin > Self::MAX {
            return Err(Error::InvalidPin(pin));
        }

        Ok(Self(pin))
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// The pin's field in the mode register
    pub(crate) const fn mode_field(self) -> Field {
        Field::new(self.0 * 2, 2)
    }

    /// The pin's bit in the data registers
    pub(crate) const fn data_bit(self) -> Field {
        Field::bit(self.0)
    }
}

/// Pin mode (MODER encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum PinMode {
    Input = 0b00,
    Output = 0b01,
    Alternate = 0b10,
    Analog = 0b11,
}

impl PinMode {
    pub const fn bits(self) -> u32 {
        self as u32
    }

    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::Input,
            0b01 => Self::Output,
            0b10 => Self::Alternate,
            _ => Self::Analog,
        }
    }
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// GPIO port
pub struct Port<'a, B> {
    bus: &'a B,
    regs: &'a GpioLayout,
}

impl<'a, B: RegisterBus> Port<'a, B> {
    pub(crate) fn new(bus: &'a B, regs: &'a GpioLayout) -> Self {
        Self { bus, regs }
    }

    /// Configure several pins at once.
    ///
    /// The mode register is read once, every listed pin's field is cleared and set in memory, and
    /// the result is written back once. Pins that aren't listed keep their mode. If a pin is
    /// listed twice the last entry wins.
    pub fn set_modes(&self, pins: &[(Pin, PinMode)]) {
        let (set, clear) = pins.iter().fold((0, 0), |(set, clear), &(pin, mode)| {
            let field = pin.mode_field();

            ((set & !field.mask()) | field.encode(mode.bits()), clear | field.mask())
        });

        self.bus.modify(self.regs.moder, set, clear);
    }

    /// Configure a single pin
    ///
    /// The field is always cleared before it is set. For [`PinMode::Analog`] the clear is
    /// redundant (the encoding is all ones) but harmless.
    pub fn set_mode(&self, pin: Pin, mode: PinMode) {
        self.set_modes(&[(pin, mode)]);
    }

    /// Current mode of a pin
    pub fn mode(&self, pin: Pin) -> PinMode {
        PinMode::from_bits(pin.mode_field().extract(self.bus.read(self.regs.moder)))
    }

    /// Drive an output pin. Only the pin's own bit in the output data register changes.
    pub fn set_level(&self, pin: Pin, level: Level) {
        let bit = pin.data_bit().mask();

        match level {
            Level::High => self.bus.modify(self.regs.odr, bit, 0),
            Level::Low => self.bus.modify(self.regs.odr, 0, bit),
        }
    }

    /// The level the pin is being driven to (output data register)
    pub fn output_level(&self, pin: Pin) -> Level {
        Level::from(self.bus.read(self.regs.odr) & pin.data_bit().mask() != 0)
    }

    /// The level sampled on the pin (input data register)
    pub fn input_level(&self, pin: Pin) -> Level {
        Level::from(self.bus.read(self.regs.idr) & pin.data_bit().mask() != 0)
    }
}
