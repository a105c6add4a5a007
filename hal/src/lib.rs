//! # Water level monitor
//!
//! A hardware abstraction library for the stm32f401 based water level monitor.
//!
//! ---
//!
//! The board carries a single analogue water level sensor, three status LEDs and a piezo
//! buzzer, all on GPIO port A. This library configures and drives that hardware directly
//! through the memory mapped registers.
//!
//! - [`register`] is the only place that touches memory. Every shared register is updated with
//!   a read-modify-write so that drivers configuring disjoint bits never undo each other
//! - The register map and pin map are plain data ([`Layout`], [`Wiring`]) so the drivers can be
//!   retargeted to another part by swapping constants
//! - The ADC is sampled one conversion at a time with a bounded wait on the end of conversion
//!   flag. A converter that never finishes is reported as an error instead of hanging
//! - Drivers borrow a single [`Board`] handle. Nothing is interrupt driven and the handle is not
//!   `Sync`, so the read-modify-write sequences can not race each other

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod board;
pub mod buzzer;
pub mod error;
pub mod gpio;
pub mod layout;
pub mod led;
pub mod monitor;
pub mod register;
pub mod system;
pub mod timeout;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use adc::{AdcConfig, Reading, Sensor};
pub use board::{Board, Wiring};
pub use buzzer::Buzzer;
pub use error::{Error, Result};
pub use layout::Layout;
pub use led::{Indicator, Leds};
pub use monitor::{LevelPolicy, Monitor, Status, Thresholds};
pub use register::{Mmio, RegisterBus};
pub use system::System;

pub use stm32f4::stm32f401 as pac;
