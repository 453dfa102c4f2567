//! ADC sampling task
//!
//! Once per tick, reads each wired channel whose gate is open and folds
//! the raw count into the shared filter bank. Disabled channels are
//! skipped entirely, and until a config has been loaded every gate is
//! closed, so the accumulators only track inputs that will appear in
//! rows. Runs whether or not a session is active: the averages for
//! enabled channels are already settled when logging starts.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Ticker};

use tidemark_core::config::MAX_CHANNELS;

use crate::channels::{CONFIG, FILTERS};

/// Sampling interval in milliseconds.
pub const SAMPLE_INTERVAL_MS: u64 = 1;

/// ADC inputs wired on this board. Logical channels beyond these stay
/// at zero.
pub const NUM_ADC_CHANNELS: usize = 4;

/// Sampling task. `inputs[i]` feeds logical channel `i`.
#[embassy_executor::task]
pub async fn sample_task(mut adc: Adc<'static, Async>, mut inputs: [Channel<'static>; NUM_ADC_CHANNELS]) {
    info!("Sample task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_INTERVAL_MS));

    loop {
        ticker.next().await;

        let gates: [Option<f32>; MAX_CHANNELS] = CONFIG.lock(|cfg| {
            cfg.borrow()
                .as_ref()
                .map(|cfg| cfg.channel_gates())
                .unwrap_or([None; MAX_CHANNELS])
        });

        for (idx, (input, gate)) in inputs.iter_mut().zip(gates.iter()).enumerate() {
            let Some(order) = *gate else {
                continue;
            };
            match adc.read(input).await {
                Ok(raw) => {
                    FILTERS.lock(|bank| bank.borrow_mut().update(idx, raw as f32, order));
                }
                Err(_) => {
                    // Transient conversion error: keep the last
                    // filtered value for this tick.
                }
            }
        }
    }
}
