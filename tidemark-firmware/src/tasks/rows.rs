//! Row production task
//!
//! While a session is active, ticks at the configured row period,
//! snapshots the filter bank, renders one CSV row and appends it to the
//! write scheduler. Never touches storage; the control task owns all
//! blocking I/O.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker, Timer};
use portable_atomic::Ordering;

use tidemark_core::row::data_row;
use tidemark_core::state::Fault;

use crate::channels::{latch_fault, CONFIG, FILTERS, LOGGING, ROW_PERIOD_MS, SCHEDULER};

/// Row production task.
#[embassy_executor::task]
pub async fn rows_task() {
    info!("Row task started");

    loop {
        while !LOGGING.load(Ordering::Relaxed) {
            Timer::after_millis(10).await;
        }

        let period = ROW_PERIOD_MS.load(Ordering::Relaxed).max(1);
        let mut ticker = Ticker::every(Duration::from_millis(period as u64));
        let started = Instant::now();
        info!("Row production started, period {} ms", period);

        while LOGGING.load(Ordering::Relaxed) {
            ticker.next().await;
            if !LOGGING.load(Ordering::Relaxed) {
                break;
            }

            let timestamp = started.elapsed().as_millis() as u32;
            let filtered = FILTERS.lock(|bank| bank.borrow().snapshot());
            let config = CONFIG.lock(|cfg| cfg.borrow().clone());
            let Some(config) = config else {
                continue;
            };

            let row = data_row(Some(timestamp), &filtered, &config);
            let appended =
                SCHEDULER.lock(|sched| sched.borrow_mut().append(row.as_bytes()));
            if appended.is_err() {
                // Row dropped: the accumulation buffer is saturated,
                // meaning storage writes are not keeping up.
                warn!("row dropped, write buffer full");
                latch_fault(Fault::WriteFailure);
            }
        }

        info!("Row production stopped");
    }
}
