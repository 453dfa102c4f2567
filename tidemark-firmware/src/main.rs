//! Tidemark - ADC data logger firmware
//!
//! RP2040 firmware that samples analog channels, smooths them with
//! per-channel recursive filters, and logs calibrated CSV rows to an
//! SD card in block-aligned writes. A push button starts and stops
//! sessions; channel setup is read from `ADC.TXT` on the card.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::rtc::{DateTime, DayOfWeek, Rtc};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use {defmt_rtt as _, panic_probe as _};

use crate::sd::{SdStorage, SD_SPI_INIT_FREQ};

mod channels;
mod sd;
mod tasks;

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tidemark firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // ADC inputs on GPIO 26..29, logical channels 1..4.
    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let inputs = [
        Channel::new_pin(p.PIN_26, Pull::None),
        Channel::new_pin(p.PIN_27, Pull::None),
        Channel::new_pin(p.PIN_28, Pull::None),
        Channel::new_pin(p.PIN_29, Pull::None),
    ];

    // SD card on SPI0. The bus starts at the identification clock;
    // storage init raises it once the card answers.
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = SD_SPI_INIT_FREQ;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let storage = match SdStorage::new(spi, cs) {
        Ok(storage) => storage,
        Err(err) => {
            error!("storage setup failed: {}", err);
            return;
        }
    };

    // The RTC only stamps log file names; it starts from a fixed epoch
    // since the board has no battery backup.
    let mut rtc = Rtc::new(p.RTC);
    let epoch = DateTime {
        year: 2020,
        month: 1,
        day: 1,
        day_of_week: DayOfWeek::Wednesday,
        hour: 0,
        minute: 0,
        second: 0,
    };
    if rtc.set_datetime(epoch).is_err() {
        warn!("RTC setup failed, file names fall back to uptime");
    }

    let button = Input::new(p.PIN_15, Pull::Down);

    let red = Output::new(p.PIN_13, Level::Low);
    let green = Output::new(p.PIN_14, Level::Low);
    let blue = Output::new(p.PIN_25, Level::Low);

    spawner.must_spawn(tasks::sample_task(adc, inputs));
    spawner.must_spawn(tasks::rows_task());
    spawner.must_spawn(tasks::control_task(storage, rtc, button));
    spawner.must_spawn(tasks::indicator_task(red, green, blue));

    info!("All tasks spawned");
}
