//! # Register map
//!
//! The addresses and bit positions the drivers depend on. They are a bit-exact contract with the
//! silicon, so they live here as data rather than being spread through the drivers. Porting to
//! another part means providing another [`Layout`].
//!
//! [`Layout::STM32F401`] is the register map of the stm32f401 (RM0368).

use crate::register::Field;

const RCC_BASE: usize = 0x4002_3800;
const GPIOA_BASE: usize = 0x4002_0000;
const ADC1_BASE: usize = 0x4001_2000;

/// A peripheral clock enable bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockGate {
    /// Address of the enable register
    pub register: usize,
    /// Enable bit within the register
    pub enable: Field,
}

/// Reset and clock control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RccLayout {
    /// Clock for the GPIO port carrying the LEDs, buzzer and sensor
    pub gpio: ClockGate,
    /// Clock for the ADC
    pub adc: ClockGate,
}

/// GPIO port
///
/// The mode register holds a 2-bit field per pin; the data registers hold one bit per pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioLayout {
    /// Mode register (MODER)
    pub moder: usize,
    /// Input data register (IDR)
    pub idr: usize,
    /// Output data register (ODR)
    pub odr: usize,
}

/// Analogue to digital converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcLayout {
    /// Status register (SR)
    pub sr: usize,
    /// Control register 2 (CR2)
    pub cr2: usize,
    /// Regular sequence register holding the first conversion slot (SQR3)
    pub sqr3: usize,
    /// Regular data register (DR)
    pub dr: usize,

    /// End of conversion flag in SR. Cleared by reading DR
    pub eoc: Field,
    /// Converter on in CR2
    pub adon: Field,
    /// Start conversion trigger in CR2. Cleared by hardware
    pub swstart: Field,
    /// First conversion in the regular sequence, in SQR3
    pub sq1: Field,
    /// Right aligned conversion result in DR
    pub data: Field,
}

/// Register map of a target part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub rcc: RccLayout,
    pub gpio: GpioLayout,
    pub adc: AdcLayout,
}

impl Layout {
    /// stm32f401 with the peripherals on GPIOA and ADC1
    pub const STM32F401: Layout = Layout {
        rcc: RccLayout {
            // GPIOAEN in RCC_AHB1ENR
            gpio: ClockGate {
                register: RCC_BASE + 0x30,
                enable: Field::bit(0),
            },
            // ADC1EN in RCC_APB2ENR
            adc: ClockGate {
                register: RCC_BASE + 0x44,
                enable: Field::bit(8),
            },
        },
        gpio: GpioLayout {
            moder: GPIOA_BASE,
            idr: GPIOA_BASE + 0x10,
            odr: GPIOA_BASE + 0x14,
        },
        adc: AdcLayout {
            sr: ADC1_BASE,
            cr2: ADC1_BASE + 0x08,
            sqr3: ADC1_BASE + 0x34,
            dr: ADC1_BASE + 0x4C,
            eoc: Field::bit(1),
            adon: Field::bit(0),
            swstart: Field::bit(30),
            sq1: Field::new(0, 5),
            data: Field::new(0, 12),
        },
    };
}
