//! Double-buffered write scheduler
//!
//! Decouples row production (timer context, must never block) from the
//! blocking storage write (main-loop context). Rows accumulate in one
//! fixed buffer; a flush block-aligns the contents and copies them into
//! the swap buffer, which the storage side consumes at its leisure.
//!
//! Handshake: `flush` sets `pending`; the sole consumer reads
//! [`WriteScheduler::pending_data`], performs the blocking write and
//! sync, then calls [`WriteScheduler::complete_write`]. A flush while
//! `pending` is still set is the overlap fault: the unconsumed swap
//! contents are discarded and the new block takes their place
//! (latest wins, the dropped block is lost).

/// Storage write granularity in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Flush accumulated rows after this long without a storage write,
/// bounding worst-case data loss on abrupt stop.
pub const IDLE_FLUSH_MS: u64 = 5_000;

/// Fill byte used for block padding.
const PAD_BYTE: u8 = b' ';

/// Marks the last row of a padded block as continued.
const CONTINUATION: u8 = b',';

/// Scheduler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// The row does not fit in the accumulation buffer. Caller error:
    /// the soft flush limit leaves headroom for one maximal row, so a
    /// well-behaved producer flushes before this can happen.
    BufferFull,
}

/// Result of a flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushOutcome {
    /// Swap buffer was free; block handed off.
    Clean,
    /// Previous swap had not been consumed yet; its contents were
    /// discarded and replaced. Latch a write-overlap fault.
    Overlapped,
}

/// Double buffer with block alignment and an idle-flush timer.
///
/// `CAP` must leave at least one block of headroom above the soft flush
/// limit so alignment padding always fits.
#[derive(Debug)]
pub struct WriteScheduler<const CAP: usize> {
    accumulation: [u8; CAP],
    len: usize,
    swap: [u8; CAP],
    swap_len: usize,
    pending: bool,
    flush_limit: usize,
    last_write_ms: u64,
}

impl<const CAP: usize> WriteScheduler<CAP> {
    /// Create a scheduler flushing once `flush_limit` bytes accumulate.
    pub const fn new(flush_limit: usize) -> Self {
        assert!(flush_limit + BLOCK_SIZE <= CAP);
        Self {
            accumulation: [0; CAP],
            len: 0,
            swap: [0; CAP],
            swap_len: 0,
            pending: false,
            flush_limit,
            last_write_ms: 0,
        }
    }

    /// Bytes currently accumulated.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing has been appended since the last flush.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one formatted row to the accumulation buffer.
    pub fn append(&mut self, row: &[u8]) -> Result<(), SchedulerError> {
        if self.len + row.len() > CAP {
            return Err(SchedulerError::BufferFull);
        }
        self.accumulation[self.len..self.len + row.len()].copy_from_slice(row);
        self.len += row.len();
        Ok(())
    }

    /// Pad the accumulation buffer to the next block boundary.
    ///
    /// No-op unless the buffer ends with a CRLF row terminator. The
    /// terminator of the last row is replaced by a continuation comma,
    /// pad bytes follow, and the CRLF is relocated to the end of the
    /// block, so the padded block still reads as CRLF-terminated text.
    pub fn align(&mut self) {
        if self.len < 2 {
            return;
        }
        if self.accumulation[self.len - 2] != b'\r' || self.accumulation[self.len - 1] != b'\n' {
            return;
        }

        let pad = BLOCK_SIZE - self.len % BLOCK_SIZE;
        debug_assert!(self.len + pad <= CAP);
        for slot in self.accumulation[self.len - 2..self.len + pad - 2].iter_mut() {
            *slot = PAD_BYTE;
        }
        self.accumulation[self.len - 2] = CONTINUATION;
        self.accumulation[self.len + pad - 2] = b'\r';
        self.accumulation[self.len + pad - 1] = b'\n';
        self.len += pad;
    }

    /// Align and hand the accumulation buffer to the swap buffer.
    ///
    /// Always proceeds; if the previous swap is still pending it is
    /// silently dropped and [`FlushOutcome::Overlapped`] is returned so
    /// the caller can latch the fault.
    pub fn flush(&mut self) -> FlushOutcome {
        let outcome = if self.pending {
            FlushOutcome::Overlapped
        } else {
            FlushOutcome::Clean
        };

        self.align();
        self.swap[..self.len].copy_from_slice(&self.accumulation[..self.len]);
        self.swap_len = self.len;
        self.len = 0;
        self.pending = true;
        outcome
    }

    /// Check the flush triggers: the soft limit, or the idle timeout
    /// with unflushed data. Returns the flush outcome if one fired.
    pub fn poll(&mut self, now_ms: u64) -> Option<FlushOutcome> {
        if self.len >= self.flush_limit {
            return Some(self.flush());
        }
        if self.len > 0 && now_ms.saturating_sub(self.last_write_ms) > IDLE_FLUSH_MS {
            return Some(self.flush());
        }
        None
    }

    /// The completed block awaiting a storage write, if any.
    pub fn pending_data(&self) -> Option<&[u8]> {
        if self.pending {
            Some(&self.swap[..self.swap_len])
        } else {
            None
        }
    }

    /// Mark the pending swap as consumed and record the write instant.
    ///
    /// Called after the blocking write and sync, whether or not they
    /// succeeded: a failed write latches a fault elsewhere but must not
    /// stall the pipeline.
    pub fn complete_write(&mut self, now_ms: u64) {
        self.pending = false;
        self.last_write_ms = now_ms;
    }

    /// Reset for a new logging session: clear both buffers and the
    /// handshake, and restart the idle timer.
    pub fn reset(&mut self, now_ms: u64) {
        self.len = 0;
        self.swap_len = 0;
        self.pending = false;
        self.last_write_ms = now_ms;
    }
}
