//! # Status LEDs
//!
//! Three LEDs show the water level: green (safe), yellow (warning) and red (critical). They
//! share the output data register with the buzzer, so each update only ever touches its own bit.

use crate::board::{Board, Wiring};
use crate::gpio::{Level, Pin, PinMode, Port};
use crate::register::RegisterBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    Safe,
    Warning,
    Critical,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Self::Safe, Self::Warning, Self::Critical];
}

pub struct Leds<'a, B> {
    port: Port<'a, B>,
    wiring: &'a Wiring,
}

impl<'a, B: RegisterBus> Leds<'a, B> {
    /// Enable the port clock and switch the three LED pins to outputs
    pub fn init(board: &'a Board<B>) -> Self {
        board.system().enable_gpio_clk();

        let wiring = board.wiring();
        let port = board.gpio();

        // All three pins in one write to the mode register
        port.set_modes(&[
            (wiring.safe, PinMode::Output),
            (wiring.warning, PinMode::Output),
            (wiring.critical, PinMode::Output),
        ]);

        Self { port, wiring }
    }

    fn pin(&self, led: Indicator) -> Pin {
        match led {
            Indicator::Safe => self.wiring.safe,
            Indicator::Warning => self.wiring.warning,
            Indicator::Critical => self.wiring.critical,
        }
    }

    /// Turn an LED on or off
    pub fn set(&mut self, led: Indicator, on: bool) {
        self.port.set_level(self.pin(led), Level::from(on));
    }

    pub fn is_on(&self, led: Indicator) -> bool {
        self.port.output_level(self.pin(led)) == Level::High
    }

    /// Light exactly one LED, or none
    pub fn show(&mut self, lit: Option<Indicator>) {
        for led in Indicator::ALL {
            self.set(led, lit == Some(led));
        }
    }

    pub fn all_on(&mut self) {
        for led in Indicator::ALL {
            self.set(led, true);
        }
    }
}
