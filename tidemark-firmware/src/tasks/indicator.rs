//! Status LED task
//!
//! Renders the shared status atomics onto three LEDs:
//! green = session active, blue = storage write in flight,
//! red = any latched fault.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};
use portable_atomic::Ordering;

use crate::channels::{fault_flags, FLUSHING, LOGGING};

/// LED refresh interval in milliseconds.
pub const INDICATOR_INTERVAL_MS: u64 = 100;

/// Status LED task.
#[embassy_executor::task]
pub async fn indicator_task(
    mut red: Output<'static>,
    mut green: Output<'static>,
    mut blue: Output<'static>,
) {
    info!("Indicator task started");

    let mut ticker = Ticker::every(Duration::from_millis(INDICATOR_INTERVAL_MS));
    let mut last_faults = fault_flags();

    loop {
        ticker.next().await;

        let faults = fault_flags();
        if faults.bits() != last_faults.bits() {
            info!("fault latches now {=u8:b}", faults.bits());
            last_faults = faults;
        }

        red.set_level(faults.any().into());
        green.set_level(LOGGING.load(Ordering::Relaxed).into());
        blue.set_level(FLUSHING.load(Ordering::Relaxed).into());
    }
}
