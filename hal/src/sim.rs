//! # Simulated hardware
//!
//! A register file that stands in for the real one in host side tests. Plain registers simply
//! remember what was written. The ADC registers behave like the converter they model:
//!
//! - Setting SWSTART in CR2 starts a conversion and SWSTART reads back as zero
//! - A conversion only completes if the ADC clock is gated on, ADON is set, the sensor pin is in
//!   analog mode and the converter hasn't been [stuck](SimBus::set_stuck)
//! - A completed conversion puts the sensor input, scaled to 12 bits, into DR and raises EOC
//! - Reading DR clears EOC
//!
//! [`peek()`](SimBus::peek) and [`poke()`](SimBus::poke) inspect and preset registers without any
//! of these side effects and without counting as bus traffic.

use core::cell::{Cell, RefCell};

use embedded_hal::delay::DelayNs;
use heapless::LinearMap;

use crate::board::{Board, Wiring};
use crate::gpio::PinMode;
use crate::layout::Layout;
use crate::register::RegisterBus;

/// Reference voltage of the simulated converter (mV)
pub const VREF_MV: u32 = 3300;

const REGISTERS: usize = 32;

pub struct SimBus {
    layout: Layout,
    wiring: Wiring,
    registers: RefCell<LinearMap<usize, u32, REGISTERS>>,
    writes: RefCell<LinearMap<usize, u32, REGISTERS>>,
    input_mv: Cell<u32>,
    stuck: Cell<bool>,
    conversions: Cell<u32>,
}

impl SimBus {
    pub fn new(layout: Layout, wiring: Wiring) -> Self {
        Self {
            layout,
            wiring,
            registers: RefCell::new(LinearMap::new()),
            writes: RefCell::new(LinearMap::new()),
            input_mv: Cell::new(0),
            stuck: Cell::new(false),
            conversions: Cell::new(0),
        }
    }

    /// The stm32f401 on a nucleo board, all registers zero
    pub fn nucleo() -> Self {
        Self::new(Layout::STM32F401, Wiring::NUCLEO)
    }

    pub fn into_board(self) -> Board<SimBus> {
        let (layout, wiring) = (self.layout, self.wiring);

        Board::new(self, layout, wiring)
    }

    /// Voltage on the sensor pin (mV). Anything above [`VREF_MV`] reads full scale.
    pub fn set_input_mv(&self, mv: u32) {
        self.input_mv.set(mv);
    }

    /// A stuck converter accepts start requests but never finishes a conversion
    pub fn set_stuck(&self, stuck: bool) {
        self.stuck.set(stuck);
    }

    /// Read a register without side effects
    pub fn peek(&self, addr: usize) -> u32 {
        self.registers.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Set a register without side effects
    pub fn poke(&self, addr: usize, value: u32) {
        if self.registers.borrow_mut().insert(addr, value).is_err() {
            panic!("simulated register file is full");
        }
    }

    /// Number of bus writes to `addr`
    pub fn write_count(&self, addr: usize) -> u32 {
        self.writes.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Number of conversions completed
    pub fn conversions(&self) -> u32 {
        self.conversions.get()
    }

    fn code(&self) -> u32 {
        self.input_mv.get().min(VREF_MV) * 0x0FFF / VREF_MV
    }

    fn converter_ready(&self) -> bool {
        let rcc = &self.layout.rcc;
        let adc = &self.layout.adc;
        let sensor = self.wiring.sensor.mode_field();

        let clocked = self.peek(rcc.adc.register) & rcc.adc.enable.mask() != 0;
        let powered = self.peek(adc.cr2) & adc.adon.mask() != 0;
        let analog =
            PinMode::from_bits(sensor.extract(self.peek(self.layout.gpio.moder))) == PinMode::Analog;

        clocked && powered && analog && !self.stuck.get()
    }

    fn count_write(&self, addr: usize) {
        let mut writes = self.writes.borrow_mut();
        let count = writes.get(&addr).copied().unwrap_or(0) + 1;

        if writes.insert(addr, count).is_err() {
            panic!("simulated register file is full");
        }
    }
}

impl RegisterBus for SimBus {
    fn read(&self, addr: usize) -> u32 {
        let value = self.peek(addr);
        let adc = &self.layout.adc;

        if addr == adc.dr {
            self.poke(adc.sr, self.peek(adc.sr) & !adc.eoc.mask());
        }

        value
    }

    fn write(&self, addr: usize, value: u32) {
        self.count_write(addr);

        let adc = &self.layout.adc;
        let start = adc.swstart.mask();

        if addr != adc.cr2 || value & start == 0 {
            self.poke(addr, value);
            return;
        }

        self.poke(addr, value & !start);

        if self.converter_ready() {
            self.poke(adc.dr, adc.data.encode(self.code()));
            self.poke(adc.sr, self.peek(adc.sr) | adc.eoc.mask());
            self.conversions.set(self.conversions.get() + 1);
        }
    }
}

/// A delay that returns immediately and keeps count of the time asked for
///
/// Shared references implement [`DelayNs`], so a test can hand `&delay` to a driver and still
/// check the total afterwards.
#[derive(Debug, Default)]
pub struct SimDelay {
    elapsed_ns: Cell<u64>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed_ns.get()
    }
}

impl DelayNs for &SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.set(self.elapsed_ns.get() + u64::from(ns));
    }
}
