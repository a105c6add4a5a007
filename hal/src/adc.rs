//! # Analogue to digital converter (ADC)
//!
//! The water level sensor is a resistive ladder: the more of its traces are under water, the
//! higher its output voltage. The ADC turns that voltage into a 12-bit code, proportional to the
//! reference voltage. Converting the code to physical units is left to the caller.
//!
//! ## Conversions
//!
//! Only single conversions of a single channel are used. The regular sequence has one slot, set
//! to the sensor's channel, and each [`read()`](Sensor::read) goes through
//!
//! ```txt
//! Idle -> StartRequested -> Converting -> Done(reading)
//! ```
//!
//! 1. EOC is cleared in SR, so a result that arrived after an earlier timeout is never mistaken
//!    for this one
//! 2. SWSTART is set in CR2. The hardware clears it once the conversion has started
//! 3. The EOC flag in SR is polled until it comes up
//! 4. DR is read, which yields the result and clears EOC
//!
//! ## Stabilisation
//!
//! The analogue front end needs time to power up after ADON is set (tSTAB, 3μs max on the
//! stm32f401). [`Sensor::init()`] waits the configured stabilisation time before returning, and
//! the only way to obtain a [`Sensor`] is through it, so no conversion can start early.
//!
//! ## Stuck conversions
//!
//! If the converter never finishes (clock gated off, ADON cleared, faulty hardware), the wait
//! for EOC runs out after [`AdcConfig::timeout`] and the read fails with
//! [`Error::ConversionTimeout`] instead of hanging.

use core::ops::Deref;

use embedded_hal::delay::DelayNs;

use crate::board::Board;
use crate::error::{Error, Result};
use crate::gpio::PinMode;
use crate::layout::AdcLayout;
use crate::register::RegisterBus;
use crate::timeout::{poll_until, PollLimit, TimedOut};

/// An ADC input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// Highest regular channel (internal VBAT on the stm32f401)
    pub const MAX: u8 = 18;

    /// Checked constructor for compile time pin maps
    pub const fn at(channel: u8) -> Self {
        if channel > Self::MAX {
            panic!("Invalid ADC channel");
        }

        Self(channel)
    }

    pub fn new(channel: u8) -> Result<Self> {
        if channel > Self::MAX {
            return Err(Error::InvalidChannel(channel));
        }

        Ok(Self(channel))
    }

    pub const fn number(self) -> u8 {
        self.0
    }
}

/// A 12-bit conversion result (0-4095)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading(u16);

impl Reading {
    pub const MAX: u16 = 0x0FFF;

    pub const fn new(raw: u16) -> Option<Self> {
        if raw > Self::MAX {
            return None;
        }

        Some(Self(raw))
    }

    /// Scale the reading against the reference voltage (mV)
    pub const fn millivolts(&self, vref_mv: u16) -> u16 {
        (self.0 as u32 * vref_mv as u32 / Self::MAX as u32) as u16
    }
}

impl Deref for Reading {
    type Target = u16;

    fn deref(&self) -> &u16 {
        &self.0
    }
}

/// Where the last conversion got to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionState {
    Idle,
    StartRequested,
    Converting,
    Done(Reading),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// Time to wait after turning the converter on (μs)
    pub stabilization_us: u32,
    /// Wait for end of conversion
    pub timeout: PollLimit,
}

impl AdcConfig {
    /// 10μs to stabilise, up to 10ms for a conversion
    ///
    /// A 12-bit conversion takes 15 ADC clock cycles plus the sample time, which is well under
    /// 10μs at any ADC clock the part supports, so the timeout only trips on a broken converter.
    pub const DEFAULT: AdcConfig = AdcConfig {
        stabilization_us: 10,
        timeout: PollLimit::new(10_000, 1_000),
    };
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// # Water level sensor
///
/// See [`crate::adc`] for more information.
pub struct Sensor<'a, B, D> {
    bus: &'a B,
    regs: &'a AdcLayout,
    delay: D,
    config: AdcConfig,
    state: ConversionState,
}

impl<'a, B: RegisterBus, D: DelayNs> Sensor<'a, B, D> {
    /// Configure the sensor pin and the ADC, and wait for the converter to stabilise
    pub fn init(board: &'a Board<B>, mut delay: D, config: AdcConfig) -> Self {
        let system = board.system();
        system.enable_gpio_clk();
        system.enable_adc_clk();

        let wiring = board.wiring();
        board.gpio().set_mode(wiring.sensor, PinMode::Analog);

        let bus = board.bus();
        let regs = &board.layout().adc;
        assert!(regs.data.width <= 12, "ADC data field wider than a reading");

        // The sequence is a single conversion so SQ1 is the only slot in use. SQR3 belongs to
        // this driver alone and is written outright.
        bus.write(regs.sqr3, regs.sq1.encode(wiring.channel.number() as u32));

        // Turn the converter on
        bus.modify(regs.cr2, regs.adon.mask(), 0);

        delay.delay_us(config.stabilization_us);

        debug!("adc: sampling channel {}", wiring.channel.number());

        Self {
            bus,
            regs,
            delay,
            config,
            state: ConversionState::Idle,
        }
    }

    /// Run a single conversion
    pub fn read(&mut self) -> Result<Reading> {
        let bus = self.bus;
        let regs = self.regs;

        let eoc = regs.eoc.mask();

        // Drop any result left over from a conversion that finished after an earlier timeout
        bus.modify(regs.sr, 0, eoc);

        self.state = ConversionState::StartRequested;
        bus.modify(regs.cr2, regs.swstart.mask(), 0);

        self.state = ConversionState::Converting;

        if let Err(TimedOut { polls }) =
            poll_until(&mut self.delay, self.config.timeout, || bus.read(regs.sr) & eoc != 0)
        {
            warn!("adc: no end of conversion after {} polls", polls);

            self.state = ConversionState::Idle;
            return Err(Error::ConversionTimeout { polls });
        }

        // Reading DR clears EOC
        let raw = regs.data.extract(bus.read(regs.dr)) as u16;
        let Some(reading) = Reading::new(raw) else {
            unreachable!("data field width checked in init");
        };

        self.state = ConversionState::Done(reading);

        Ok(reading)
    }

    /// Where the last conversion got to
    pub fn state(&self) -> ConversionState {
        self.state
    }

    pub fn config(&self) -> &AdcConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Wiring;
    use crate::layout::Layout;
    use crate::register::Field;
    use crate::sim::{SimBus, SimDelay, VREF_MV};

    #[test]
    fn channel_range() {
        assert_eq!(Channel::new(18).map(Channel::number), Ok(18));
        assert_eq!(Channel::new(19), Err(Error::InvalidChannel(19)));
    }

    #[test]
    fn reading_range() {
        assert_eq!(Reading::new(4095).map(|r| *r), Some(4095));
        assert_eq!(Reading::new(4096), None);
    }

    #[test]
    fn reading_millivolts() {
        assert_eq!(Reading(0).millivolts(3300), 0);
        assert_eq!(Reading(Reading::MAX).millivolts(3300), 3300);
        assert_eq!(Reading(2048).millivolts(3300), 1650);
    }

    #[test]
    fn init_configures_the_converter() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let layout = *board.layout();
        let wiring = *board.wiring();

        let sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        assert!(board.system().is_enabled(layout.rcc.gpio));
        assert!(board.system().is_enabled(layout.rcc.adc));
        assert_eq!(board.gpio().mode(wiring.sensor), PinMode::Analog);
        assert_eq!(board.bus().peek(layout.adc.sqr3), 7);
        assert_eq!(board.bus().peek(layout.adc.cr2), 1);
        assert!(delay.elapsed_ns() >= 10_000);
        assert_eq!(sensor.state(), ConversionState::Idle);
    }

    #[test]
    fn init_preserves_shared_registers() {
        let board = SimBus::nucleo().into_board();
        let layout = *board.layout();
        let delay = SimDelay::new();

        board.bus().poke(layout.rcc.gpio.register, 0b100);
        board.bus().poke(layout.rcc.adc.register, 1 << 14);
        board.bus().poke(layout.gpio.moder, 0xA800_0000 | 0b01 << 12);

        Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        assert_eq!(board.bus().peek(layout.rcc.gpio.register), 0b101);
        assert_eq!(board.bus().peek(layout.rcc.adc.register), 1 << 14 | 1 << 8);
        assert_eq!(
            board.bus().peek(layout.gpio.moder),
            0xA800_0000 | 0b01 << 12 | 0b11 << 14
        );
    }

    #[test]
    fn init_twice_leaves_clocks_on() {
        let board = SimBus::nucleo().into_board();
        let layout = *board.layout();
        let delay = SimDelay::new();

        Sensor::init(&board, &delay, AdcConfig::DEFAULT);
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        assert!(board.system().is_enabled(layout.rcc.gpio));
        assert!(board.system().is_enabled(layout.rcc.adc));
        assert_eq!(board.bus().peek(layout.adc.cr2), 1);

        board.bus().set_input_mv(VREF_MV);
        assert_eq!(sensor.read().map(|r| *r), Ok(4095));
    }

    #[test]
    fn read_cycle() {
        let board = SimBus::nucleo().into_board();
        let layout = *board.layout();
        let delay = SimDelay::new();
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        board.bus().set_input_mv(1650);
        let reading = sensor.read().unwrap();

        assert_eq!(*reading, 2047);
        assert_eq!(sensor.state(), ConversionState::Done(reading));

        // SWSTART cleared by hardware, EOC cleared by the DR read
        assert_eq!(board.bus().peek(layout.adc.cr2), 1);
        assert_eq!(board.bus().peek(layout.adc.sr) & layout.adc.eoc.mask(), 0);
        assert_eq!(board.bus().conversions(), 1);
    }

    #[test]
    fn readings_span_the_full_scale() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        board.bus().set_input_mv(0);
        assert_eq!(sensor.read().map(|r| *r), Ok(0));

        board.bus().set_input_mv(VREF_MV);
        assert_eq!(sensor.read().map(|r| *r), Ok(4095));

        // Out of range inputs clip
        board.bus().set_input_mv(5000);
        assert_eq!(sensor.read().map(|r| *r), Ok(4095));
    }

    #[test]
    fn readings_are_monotonic() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        let mut previous = 0;
        for mv in (0..=VREF_MV).step_by(25) {
            board.bus().set_input_mv(mv);
            let reading = *sensor.read().unwrap();

            assert!(reading <= Reading::MAX);
            assert!(reading >= previous, "{} mV read {} after {}", mv, reading, previous);
            previous = reading;
        }
    }

    #[test]
    fn repeated_reads_are_stable() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        board.bus().set_input_mv(1234);
        let first = sensor.read().unwrap();

        for _ in 0..8 {
            assert_eq!(sensor.read(), Ok(first));
        }
        assert_eq!(board.bus().conversions(), 9);
    }

    #[test]
    fn stuck_converter_times_out() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let config = AdcConfig {
            stabilization_us: 10,
            timeout: PollLimit::new(50, 2_000),
        };
        let mut sensor = Sensor::init(&board, &delay, config);
        let after_init = delay.elapsed_ns();

        board.bus().set_stuck(true);

        assert_eq!(sensor.read(), Err(Error::ConversionTimeout { polls: 50 }));
        assert_eq!(sensor.state(), ConversionState::Idle);
        assert_eq!(delay.elapsed_ns() - after_init, config.timeout.budget_ns());

        // The driver is still usable once the converter recovers
        board.bus().set_stuck(false);
        board.bus().set_input_mv(VREF_MV);
        assert_eq!(sensor.read().map(|r| *r), Ok(4095));
    }

    #[test]
    fn late_result_is_not_reused() {
        let board = SimBus::nucleo().into_board();
        let layout = *board.layout();
        let delay = SimDelay::new();
        let config = AdcConfig {
            timeout: PollLimit::spin(20),
            ..AdcConfig::DEFAULT
        };
        let mut sensor = Sensor::init(&board, &delay, config);

        // A conversion that completed after the previous read gave up
        board.bus().poke(layout.adc.dr, 123);
        board.bus().poke(layout.adc.sr, layout.adc.eoc.mask());
        board.bus().set_stuck(true);
        board.bus().set_input_mv(VREF_MV);

        assert_eq!(sensor.read(), Err(Error::ConversionTimeout { polls: 20 }));
        assert_eq!(board.bus().peek(layout.adc.sr) & layout.adc.eoc.mask(), 0);

        board.bus().set_stuck(false);
        assert_eq!(sensor.read().map(|r| *r), Ok(4095));
    }

    #[test]
    #[should_panic]
    fn data_field_wider_than_a_reading() {
        let mut layout = Layout::STM32F401;
        layout.adc.data = Field::new(0, 16);
        let board = SimBus::new(layout, Wiring::NUCLEO).into_board();
        let delay = SimDelay::new();

        Sensor::init(&board, &delay, AdcConfig::DEFAULT);
    }

    #[test]
    fn gated_clock_times_out() {
        let board = SimBus::nucleo().into_board();
        let layout = *board.layout();
        let delay = SimDelay::new();
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        // Something else turned the ADC clock back off
        board.bus().poke(layout.rcc.adc.register, 0);

        assert_eq!(
            sensor.read(),
            Err(Error::ConversionTimeout {
                polls: AdcConfig::DEFAULT.timeout.max_polls
            })
        );
    }

    #[test]
    fn pin_out_of_analog_mode_times_out() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut sensor = Sensor::init(&board, &delay, AdcConfig::DEFAULT);

        board.gpio().set_mode(board.wiring().sensor, PinMode::Input);

        assert!(matches!(
            sensor.read(),
            Err(Error::ConversionTimeout { .. })
        ));
    }
}
