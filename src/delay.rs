use cortex_m::asm;
use embedded_hal::delay::DelayNs;
use embedded_time::rate::Hertz;

/// Busy-wait delay counted in core clock cycles
///
/// Waits at least the requested time; interrupts taken during the wait only make it longer.
pub struct CycleDelay {
    sysclk: Hertz,
}

impl CycleDelay {
    pub const fn new(sysclk: Hertz) -> Self {
        Self { sysclk }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * u64::from(self.sysclk.0)).div_ceil(1_000_000_000);

        asm::delay(u32::try_from(cycles).unwrap_or(u32::MAX));
    }
}
