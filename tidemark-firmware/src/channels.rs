//! Shared state between tasks
//!
//! The producer tasks behave like interrupt callbacks: they touch
//! shared state only under short critical sections
//! (`CriticalSectionRawMutex`), and the control task is the sole
//! consumer of the pending swap and of button edges. Scalar status
//! crossing task boundaries lives in atomics so the indicator task can
//! render it without locking.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use tidemark_core::config::LogConfig;
use tidemark_core::filter::FilterBank;
use tidemark_core::scheduler::WriteScheduler;
use tidemark_core::state::{Fault, FaultFlags};

/// Accumulation/swap buffer capacity.
pub const WRITE_BUFFER_CAP: usize = 49 * 1024;

/// Soft flush limit, leaving headroom for one more maximal row plus
/// alignment padding before the hard capacity.
pub const WRITE_BUFFER_FLUSH_LIMIT: usize = 48 * 1024;

/// Filter accumulators. Written by the sampling task, snapshotted by
/// the row task under the same critical section.
pub static FILTERS: Mutex<CriticalSectionRawMutex, RefCell<FilterBank>> =
    Mutex::new(RefCell::new(FilterBank::new()));

/// Double-buffered write scheduler shared by the row and control tasks.
pub static SCHEDULER: Mutex<
    CriticalSectionRawMutex,
    RefCell<WriteScheduler<WRITE_BUFFER_CAP>>,
> = Mutex::new(RefCell::new(WriteScheduler::new(WRITE_BUFFER_FLUSH_LIMIT)));

/// Active session configuration. `None` until the first successful
/// config read; retained after a session stops so filter orders keep
/// applying while idle.
pub static CONFIG: Mutex<CriticalSectionRawMutex, RefCell<Option<LogConfig>>> =
    Mutex::new(RefCell::new(None));

/// True while a logging session is active.
pub static LOGGING: AtomicBool = AtomicBool::new(false);

/// True while the control task is inside a blocking storage write.
pub static FLUSHING: AtomicBool = AtomicBool::new(false);

/// Row period for the active session, milliseconds.
pub static ROW_PERIOD_MS: AtomicU32 = AtomicU32::new(100);

/// Latched fault bits ([`FaultFlags`] layout).
pub static FAULTS: AtomicU8 = AtomicU8::new(0);

/// Latch a fault for the indicator task.
pub fn latch_fault(fault: Fault) {
    let mut flags = FaultFlags::new();
    flags.latch(fault);
    FAULTS.fetch_or(flags.bits(), Ordering::Relaxed);
}

/// Drop a single fault latch.
pub fn clear_fault(fault: Fault) {
    let mut flags = FaultFlags::from_bits(0xff);
    flags.clear(fault);
    FAULTS.fetch_and(flags.bits(), Ordering::Relaxed);
}

/// Current latched faults.
pub fn fault_flags() -> FaultFlags {
    FaultFlags::from_bits(FAULTS.load(Ordering::Relaxed))
}
