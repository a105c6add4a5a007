//! Board configuration

use embedded_time::rate::Hertz;
use water_monitor_hal::{AdcConfig, Thresholds};

/// Core clock. The 16 MHz HSI is left running as set up by reset.
pub const SYSCLK: Hertz = Hertz(16_000_000);

/// Time between samples (ms)
pub const SAMPLE_PERIOD_MS: u32 = 500;

/// Reference voltage the ADC measures against (mV)
pub const VREF_MV: u16 = 3300;

pub const ADC: AdcConfig = AdcConfig::DEFAULT;

/// Calibrated against the prototype tank with the sensor mounted upright: warning at roughly a
/// third of the sensor submerged, critical at roughly two thirds. Re-measure for any other
/// mounting.
pub const THRESHOLDS: Thresholds = Thresholds::new(1500, 2800);
