//! # Board
//!
//! [`Board`] is the single handle to the hardware. It owns the register bus together with the
//! register map and pin map, and every driver borrows it: drivers never hold a bus of their own.

use crate::adc::Channel;
use crate::gpio::{Pin, Port};
use crate::layout::Layout;
use crate::pac;
use crate::register::{Mmio, RegisterBus};
use crate::system::System;

/// Which pins the board's peripherals are wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Wiring {
    /// Green LED
    pub safe: Pin,
    /// Yellow LED
    pub warning: Pin,
    /// Red LED
    pub critical: Pin,
    /// Piezo buzzer
    pub piezo: Pin,
    /// Water level sensor output
    pub sensor: Pin,
    /// ADC channel connected to the sensor pin
    pub channel: Channel,
}

impl Wiring {
    /// Nucleo-F401RE with the sensor shield on the arduino header
    ///
    /// | Pin | Header | Use                  |
    /// |-----|--------|----------------------|
    /// | PA5 | D13    | Piezo                |
    /// | PA6 | D12    | Safe LED             |
    /// | PA7 | D11    | Sensor (ADC1 IN7)    |
    /// | PA8 | D7     | Critical LED         |
    /// | PA9 | D8     | Warning LED          |
    pub const NUCLEO: Wiring = Wiring {
        safe: Pin::at(6),
        warning: Pin::at(9),
        critical: Pin::at(8),
        piezo: Pin::at(5),
        sensor: Pin::at(7),
        channel: Channel::at(7),
    };
}

pub struct Board<B> {
    bus: B,
    layout: Layout,
    wiring: Wiring,
}

impl Board<Mmio> {
    /// Take over the real hardware.
    ///
    /// Consuming the PAC singletons guarantees that no other code can be driving these
    /// peripherals; the PAC never hands them out twice.
    pub fn take(_rcc: pac::RCC, _gpioa: pac::GPIOA, _adc1: pac::ADC1) -> Self {
        // Sound: the layout only addresses RCC, GPIOA and ADC1, which are now ours
        let bus = unsafe { Mmio::new() };

        Self::new(bus, Layout::STM32F401, Wiring::NUCLEO)
    }
}

impl<B: RegisterBus> Board<B> {
    pub const fn new(bus: B, layout: Layout, wiring: Wiring) -> Self {
        Self {
            bus,
            layout,
            wiring,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// Clock control
    pub fn system(&self) -> System<'_, B> {
        System::new(&self.bus, &self.layout.rcc)
    }

    /// The GPIO port the peripherals are on
    pub fn gpio(&self) -> Port<'_, B> {
        Port::new(&self.bus, &self.layout.gpio)
    }
}
