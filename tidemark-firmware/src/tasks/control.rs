//! Control task
//!
//! The single consumer of the write scheduler and the only task that
//! touches the SD card. One pass per millisecond:
//!
//! 1. drain a pending swap buffer to the card, block by block
//! 2. poll the scheduler's flush triggers (soft limit, idle timeout)
//! 3. debounce the button and drive the session state machine
//!
//! Blocking card writes happen outside the scheduler lock: each block
//! is copied out under a short critical section, so the row task keeps
//! appending while a write is in flight.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_rp::peripherals::RTC;
use embassy_rp::rtc::Rtc;
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use tidemark_core::config::{parse_config, LogConfig};
use tidemark_core::debounce::{ButtonDebounce, Edge};
use tidemark_core::row::header_row;
use tidemark_core::scheduler::{FlushOutcome, BLOCK_SIZE};
use tidemark_core::state::{Event, Fault, State};

use crate::channels::{
    clear_fault, latch_fault, CONFIG, FLUSHING, LOGGING, ROW_PERIOD_MS, SCHEDULER,
};
use crate::sd::{log_file_name, SdStorage, CONFIG_FILE};

/// Control loop interval in milliseconds.
pub const CONTROL_INTERVAL_MS: u64 = 1;

/// Consecutive agreeing polls (beyond the first) before a button level
/// change is accepted. At the 1 ms loop rate this is a 30 ms debounce.
pub const BUTTON_DEBOUNCE_POLLS: u32 = 30;

/// Upper bound on the configuration file size.
const CONFIG_BUF_LEN: usize = 1024;

/// Control task. Owns the storage stack, the RTC and the button input.
#[embassy_executor::task]
pub async fn control_task(
    mut storage: SdStorage,
    mut rtc: Rtc<'static, RTC>,
    button: Input<'static>,
) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_INTERVAL_MS));
    let mut debounce = ButtonDebounce::new(BUTTON_DEBOUNCE_POLLS);
    let mut state = State::Idle;

    loop {
        ticker.next().await;

        drain_pending(&mut storage);

        let now_ms = Instant::now().as_millis();
        let polled = SCHEDULER.lock(|sched| sched.borrow_mut().poll(now_ms));
        if polled == Some(FlushOutcome::Overlapped) {
            warn!("write overlap: previous block dropped");
            latch_fault(Fault::WriteOverlap);
        }

        if debounce.sample(button.is_high()) != Some(Edge::Rising) {
            continue;
        }

        state = match state {
            State::Idle => {
                let event = match start_session(&mut storage, &mut rtc) {
                    Ok(()) => Event::SessionStarted,
                    Err(()) => Event::StartFailed,
                };
                state.transition(event)
            }
            State::Logging => {
                stop_session(&mut storage);
                state.transition(Event::ButtonPressed)
            }
        };
    }
}

/// Write a pending swap buffer to the open log file and sync. A failed
/// write latches the fault but still completes the handshake, so the
/// scheduler can hand off the next block.
fn drain_pending(storage: &mut SdStorage) {
    let total = SCHEDULER.lock(|sched| {
        sched
            .borrow()
            .pending_data()
            .map(|data| data.len())
            .unwrap_or(0)
    });
    if total == 0 {
        return;
    }

    FLUSHING.store(true, Ordering::Relaxed);

    let mut block = [0u8; BLOCK_SIZE];
    let mut offset = 0;
    let mut ok = true;
    while offset < total {
        // Flushed data is block-aligned; the min guards the slice if a
        // caller ever hands over an unterminated tail.
        let chunk = (total - offset).min(BLOCK_SIZE);
        SCHEDULER.lock(|sched| {
            let sched = sched.borrow();
            if let Some(data) = sched.pending_data() {
                block[..chunk].copy_from_slice(&data[offset..offset + chunk]);
            }
        });
        if storage.append(&block[..chunk]).is_err() {
            ok = false;
            break;
        }
        offset += chunk;
    }
    if ok {
        ok = storage.sync().is_ok();
    }

    let now_ms = Instant::now().as_millis();
    SCHEDULER.lock(|sched| sched.borrow_mut().complete_write(now_ms));

    if !ok {
        warn!("storage write failed, {} of {} bytes", offset, total);
        latch_fault(Fault::WriteFailure);
    }

    FLUSHING.store(false, Ordering::Relaxed);
}

/// Bring up storage, load the configuration and open the log file with
/// its header row already on the card. Any failure latches the matching
/// fault and leaves the machine idle for a retry.
fn start_session(storage: &mut SdStorage, rtc: &mut Rtc<'static, RTC>) -> Result<(), ()> {
    clear_fault(Fault::StorageInit);
    clear_fault(Fault::ConfigRead);

    if let Err(err) = storage.init() {
        warn!("storage init failed: {}", err);
        latch_fault(Fault::StorageInit);
        return Err(());
    }

    let mut buf = [0u8; CONFIG_BUF_LEN];
    let config = match storage.read_config_into(&mut buf) {
        Ok(text) => match parse_config(text) {
            Ok(config) => config,
            Err(err) => {
                warn!("{} parse failed: {}", CONFIG_FILE, err);
                latch_fault(Fault::ConfigRead);
                return Err(());
            }
        },
        Err(err) => {
            warn!("{} read failed: {}", CONFIG_FILE, err);
            latch_fault(Fault::ConfigRead);
            return Err(());
        }
    };

    let name = {
        let (hour, minute, second) = match rtc.now() {
            Ok(now) => (now.hour, now.minute, now.second),
            Err(_) => {
                // RTC not running: fall back to uptime so file names
                // stay unique within a power cycle.
                let uptime = Instant::now().as_secs();
                (
                    ((uptime / 3600) % 24) as u8,
                    ((uptime / 60) % 60) as u8,
                    (uptime % 60) as u8,
                )
            }
        };
        log_file_name(hour, minute, second)
    };
    if let Err(err) = storage.open_log(&name) {
        warn!("log open failed: {}", err);
        latch_fault(Fault::StorageInit);
        return Err(());
    }

    apply_config(&config);
    clear_fault(Fault::WriteOverlap);
    clear_fault(Fault::WriteFailure);

    // Header goes out immediately so the file is valid CSV even if
    // power is cut before the first data block.
    let header = header_row(&config);
    let now_ms = Instant::now().as_millis();
    SCHEDULER.lock(|sched| {
        let mut sched = sched.borrow_mut();
        sched.reset(now_ms);
        let _ = sched.append(header.as_bytes());
        sched.flush()
    });
    drain_pending(storage);

    info!("session started, logging to {}", name.as_str());
    LOGGING.store(true, Ordering::Relaxed);
    Ok(())
}

/// Publish the session configuration to the producer tasks.
fn apply_config(config: &LogConfig) {
    ROW_PERIOD_MS.store(config.sample_period_ms as u32, Ordering::Relaxed);
    CONFIG.lock(|slot| {
        *slot.borrow_mut() = Some(config.clone());
    });
}

/// Stop row production, force out whatever accumulated and close the
/// file.
fn stop_session(storage: &mut SdStorage) {
    LOGGING.store(false, Ordering::Relaxed);

    let outcome = SCHEDULER.lock(|sched| {
        let mut sched = sched.borrow_mut();
        if sched.is_empty() {
            None
        } else {
            Some(sched.flush())
        }
    });
    if outcome == Some(FlushOutcome::Overlapped) {
        latch_fault(Fault::WriteOverlap);
    }
    drain_pending(storage);

    if storage.sync().is_err() {
        latch_fault(Fault::WriteFailure);
    }
    storage.close_log();

    info!("session stopped");
}
