//! # Monitoring loop
//!
//! Each [`step()`](Monitor::step) samples the sensor, hands the reading to a [`LevelPolicy`] to
//! classify, and drives the LEDs and buzzer to match.
//!
//! Which readings count as safe, warning or critical depends on the sensor, its mounting and the
//! tank, so the policy is supplied by the caller. [`Thresholds`] covers the common case of two
//! cut-off points, and any `FnMut(Reading) -> Status` closure works as a policy too.
//!
//! When a conversion times out the monitor shows the fault indication (all three LEDs lit, buzzer
//! silent) and returns the error; the next successful step clears it.

use embedded_hal::delay::DelayNs;

use crate::adc::{Reading, Sensor};
use crate::buzzer::Buzzer;
use crate::error::Result;
use crate::led::{Indicator, Leds};
use crate::register::RegisterBus;

/// Water level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Safe,
    Warning,
    Critical,
}

impl Status {
    /// The LED that shows this status
    pub const fn indicator(self) -> Indicator {
        match self {
            Self::Safe => Indicator::Safe,
            Self::Warning => Indicator::Warning,
            Self::Critical => Indicator::Critical,
        }
    }

    /// Whether the buzzer sounds
    pub const fn alarm(self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// Maps a reading to a status
pub trait LevelPolicy {
    fn classify(&mut self, reading: Reading) -> Status;
}

impl<F: FnMut(Reading) -> Status> LevelPolicy for F {
    fn classify(&mut self, reading: Reading) -> Status {
        self(reading)
    }
}

/// Two cut-off points: readings at or above `warning` are a warning, at or above `critical` are
/// critical
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    warning: u16,
    critical: u16,
}

impl Thresholds {
    pub const fn new(warning: u16, critical: u16) -> Self {
        assert!(warning <= critical, "warning threshold above critical");
        assert!(critical <= Reading::MAX, "threshold out of range");

        Self { warning, critical }
    }

    pub const fn warning(&self) -> u16 {
        self.warning
    }

    pub const fn critical(&self) -> u16 {
        self.critical
    }
}

impl LevelPolicy for Thresholds {
    fn classify(&mut self, reading: Reading) -> Status {
        if *reading >= self.critical {
            Status::Critical
        } else if *reading >= self.warning {
            Status::Warning
        } else {
            Status::Safe
        }
    }
}

/// One monitoring cycle's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub reading: Reading,
    pub status: Status,
}

pub struct Monitor<'a, B, D, P> {
    leds: Leds<'a, B>,
    buzzer: Buzzer<'a, B>,
    sensor: Sensor<'a, B, D>,
    policy: P,
    status: Option<Status>,
}

impl<'a, B: RegisterBus, D: DelayNs, P: LevelPolicy> Monitor<'a, B, D, P> {
    /// Takes initialised drivers. All outputs start off.
    pub fn new(
        mut leds: Leds<'a, B>,
        mut buzzer: Buzzer<'a, B>,
        sensor: Sensor<'a, B, D>,
        policy: P,
    ) -> Self {
        leds.show(None);
        buzzer.set(false);

        Self {
            leds,
            buzzer,
            sensor,
            policy,
            status: None,
        }
    }

    /// Sample, classify and update the outputs
    pub fn step(&mut self) -> Result<Sample> {
        let reading = match self.sensor.read() {
            Ok(reading) => reading,
            Err(err) => {
                self.fault();
                return Err(err);
            }
        };

        let status = self.policy.classify(reading);

        self.leds.show(Some(status.indicator()));
        self.buzzer.set(status.alarm());

        if self.status != Some(status) {
            info!("monitor: level {} is now {}", *reading, status);
        }
        self.status = Some(status);

        Ok(Sample { reading, status })
    }

    /// Status shown after the last step. `None` before the first step and while faulted.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn leds(&self) -> &Leds<'a, B> {
        &self.leds
    }

    pub fn buzzer(&self) -> &Buzzer<'a, B> {
        &self.buzzer
    }

    pub fn sensor(&self) -> &Sensor<'a, B, D> {
        &self.sensor
    }

    fn fault(&mut self) {
        if self.status.is_some() {
            warn!("monitor: sensor fault");
        }

        self.leds.all_on();
        self.buzzer.set(false);
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::AdcConfig;
    use crate::board::Board;
    use crate::error::Error;
    use crate::sim::{SimBus, SimDelay, VREF_MV};
    use crate::timeout::PollLimit;

    const THRESHOLDS: Thresholds = Thresholds::new(1500, 2800);

    fn monitor<'a, P: LevelPolicy>(
        board: &'a Board<SimBus>,
        delay: &'a SimDelay,
        policy: P,
    ) -> Monitor<'a, SimBus, &'a SimDelay, P> {
        let config = AdcConfig {
            timeout: PollLimit::spin(100),
            ..AdcConfig::DEFAULT
        };

        Monitor::new(
            Leds::init(board),
            Buzzer::init(board),
            Sensor::init(board, delay, config),
            policy,
        )
    }

    fn lit(monitor: &Monitor<'_, SimBus, &SimDelay, impl LevelPolicy>) -> [bool; 3] {
        Indicator::ALL.map(|led| monitor.leds().is_on(led))
    }

    #[test]
    fn threshold_boundaries() {
        let mut policy = THRESHOLDS;
        let classify = |policy: &mut Thresholds, raw| policy.classify(Reading::new(raw).unwrap());

        assert_eq!(classify(&mut policy, 0), Status::Safe);
        assert_eq!(classify(&mut policy, 1499), Status::Safe);
        assert_eq!(classify(&mut policy, 1500), Status::Warning);
        assert_eq!(classify(&mut policy, 2799), Status::Warning);
        assert_eq!(classify(&mut policy, 2800), Status::Critical);
        assert_eq!(classify(&mut policy, Reading::MAX), Status::Critical);
    }

    #[test]
    #[should_panic]
    fn thresholds_must_be_ordered() {
        Thresholds::new(3000, 2000);
    }

    #[test]
    fn outputs_follow_the_level() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut monitor = monitor(&board, &delay, THRESHOLDS);

        assert_eq!(lit(&monitor), [false; 3]);
        assert_eq!(monitor.status(), None);

        board.bus().set_input_mv(100);
        assert_eq!(monitor.step().map(|s| s.status), Ok(Status::Safe));
        assert_eq!(lit(&monitor), [true, false, false]);
        assert!(!monitor.buzzer().is_on());

        board.bus().set_input_mv(1800);
        assert_eq!(monitor.step().map(|s| s.status), Ok(Status::Warning));
        assert_eq!(lit(&monitor), [false, true, false]);
        assert!(!monitor.buzzer().is_on());

        board.bus().set_input_mv(VREF_MV);
        let sample = monitor.step().unwrap();
        assert_eq!(*sample.reading, 4095);
        assert_eq!(sample.status, Status::Critical);
        assert_eq!(lit(&monitor), [false, false, true]);
        assert!(monitor.buzzer().is_on());

        board.bus().set_input_mv(100);
        assert_eq!(monitor.step().map(|s| s.status), Ok(Status::Safe));
        assert!(!monitor.buzzer().is_on());
        assert_eq!(monitor.status(), Some(Status::Safe));
    }

    #[test]
    fn timeout_shows_the_fault() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut monitor = monitor(&board, &delay, THRESHOLDS);

        board.bus().set_input_mv(VREF_MV);
        monitor.step().unwrap();
        assert!(monitor.buzzer().is_on());

        board.bus().set_stuck(true);
        assert_eq!(
            monitor.step(),
            Err(Error::ConversionTimeout { polls: 100 })
        );
        assert_eq!(lit(&monitor), [true; 3]);
        assert!(!monitor.buzzer().is_on());
        assert_eq!(monitor.status(), None);

        board.bus().set_stuck(false);
        board.bus().set_input_mv(0);
        assert_eq!(monitor.step().map(|s| s.status), Ok(Status::Safe));
        assert_eq!(lit(&monitor), [true, false, false]);
    }

    #[test]
    fn closures_are_policies() {
        let board = SimBus::nucleo().into_board();
        let delay = SimDelay::new();
        let mut seen = 0;
        let mut monitor = monitor(&board, &delay, |reading: Reading| {
            seen += 1;
            if *reading > 2000 {
                Status::Critical
            } else {
                Status::Safe
            }
        });

        board.bus().set_input_mv(2000);
        assert_eq!(monitor.step().map(|s| s.status), Ok(Status::Critical));
        board.bus().set_input_mv(1000);
        assert_eq!(monitor.step().map(|s| s.status), Ok(Status::Safe));

        drop(monitor);
        assert_eq!(seen, 2);
    }

    #[test]
    fn outputs_leave_other_pins_alone() {
        let board = SimBus::nucleo().into_board();
        let layout = *board.layout();
        let delay = SimDelay::new();

        board.bus().poke(layout.gpio.odr, 1 << 15 | 1 << 0);
        let mut monitor = monitor(&board, &delay, THRESHOLDS);

        board.bus().set_input_mv(VREF_MV);
        monitor.step().unwrap();

        assert_eq!(board.bus().peek(layout.gpio.odr), 1 << 15 | 1 << 8 | 1 << 5 | 1 << 0);
    }
}
