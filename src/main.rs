#![no_main]
#![no_std]

mod config;
mod delay;

use defmt_rtt as _; // global logger
use panic_probe as _; // panic handler

use rtic_monotonics::systick::Systick;
use rtic_monotonics::Monotonic;

defmt::timestamp!("{=u32:ms}", Systick::now().ticks());

#[rtic::app(
    device = water_monitor_hal::pac,
    dispatchers = []
)]
mod app {
    use crate::config;
    use crate::delay::CycleDelay;
    use embedded_hal::delay::DelayNs;
    use rtic_monotonics::systick::Systick;
    use water_monitor_hal::{Board, Buzzer, Leds, Mmio, Monitor, Sensor};

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        board: Board<Mmio>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        defmt::info!("init");

        let dp = cx.device;

        let systick_token = rtic_monotonics::create_systick_token!();
        Systick::start(cx.core.SYST, config::SYSCLK.0, systick_token);

        let board = Board::take(dp.RCC, dp.GPIOA, dp.ADC1);

        (Shared {}, Local { board })
    }

    #[idle(local = [board])]
    fn idle(cx: idle::Context) -> ! {
        defmt::info!("idle");

        let board: &Board<Mmio> = cx.local.board;

        let leds = Leds::init(board);
        let buzzer = Buzzer::init(board);
        let sensor = Sensor::init(board, CycleDelay::new(config::SYSCLK), config::ADC);

        let mut monitor = Monitor::new(leds, buzzer, sensor, config::THRESHOLDS);
        let mut period = CycleDelay::new(config::SYSCLK);

        defmt::info!("monitoring every {} ms", config::SAMPLE_PERIOD_MS);

        loop {
            match monitor.step() {
                Ok(sample) => defmt::debug!(
                    "level {} ({} mV): {}",
                    *sample.reading,
                    sample.reading.millivolts(config::VREF_MV),
                    sample.status
                ),
                Err(err) => defmt::error!("sample failed: {}", err),
            }

            period.delay_ms(config::SAMPLE_PERIOD_MS);
        }
    }
}
