use crate::layout::{ClockGate, RccLayout};
use crate::register::RegisterBus;

/// # Clock gating
///
/// Peripherals are powered but inert until their clock is gated on. Enabling only ever sets the
/// enable bit, never toggles or overwrites, so every driver can enable the clocks it needs
/// without caring whether another driver already did.
pub struct System<'a, B> {
    bus: &'a B,
    rcc: &'a RccLayout,
}

impl<'a, B: RegisterBus> System<'a, B> {
    pub(crate) fn new(bus: &'a B, rcc: &'a RccLayout) -> Self {
        Self { bus, rcc }
    }

    /// Gate a peripheral clock on. Idempotent.
    pub fn enable(&self, gate: ClockGate) {
        self.bus.modify(gate.register, gate.enable.mask(), 0);
    }

    pub fn is_enabled(&self, gate: ClockGate) -> bool {
        self.bus.read(gate.register) & gate.enable.mask() != 0
    }

    /// Enable the GPIO port clock
    pub fn enable_gpio_clk(&self) {
        self.enable(self.rcc.gpio);
    }

    /// Enable the ADC peripheral clock
    pub fn enable_adc_clk(&self) {
        self.enable(self.rcc.adc);
    }
}
