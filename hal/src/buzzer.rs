use crate::board::Board;
use crate::gpio::{Level, Pin, PinMode, Port};
use crate::register::RegisterBus;

/// Piezo buzzer
///
/// The buzzer has its own oscillator, so it sounds whenever its pin is driven high.
pub struct Buzzer<'a, B> {
    port: Port<'a, B>,
    pin: Pin,
}

impl<'a, B: RegisterBus> Buzzer<'a, B> {
    pub fn init(board: &'a Board<B>) -> Self {
        // Harmless if the LEDs already enabled the port
        board.system().enable_gpio_clk();

        let pin = board.wiring().piezo;
        let port = board.gpio();
        port.set_mode(pin, PinMode::Output);

        Self { port, pin }
    }

    /// Sound or silence the buzzer
    pub fn set(&mut self, on: bool) {
        self.port.set_level(self.pin, Level::from(on));
    }

    pub fn is_on(&self) -> bool {
        self.port.output_level(self.pin) == Level::High
    }
}
