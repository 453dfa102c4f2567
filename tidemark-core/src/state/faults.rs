//! Sticky fault latches
//!
//! All faults are observational: they never halt sampling or block a
//! state transition. `StorageInit` and `ConfigRead` abort one start
//! attempt (the next press retries); the write faults only record that
//! data was lost.

/// Fault conditions surfaced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Storage medium failed to initialize at session start.
    StorageInit,
    /// Config file missing its sample period, or unreadable.
    ConfigRead,
    /// Flush requested while the previous swap was still pending; the
    /// unconsumed block was discarded.
    WriteOverlap,
    /// Short write or failed sync on the storage medium.
    WriteFailure,
}

impl Fault {
    const fn bit(self) -> u8 {
        match self {
            Fault::StorageInit => 1 << 0,
            Fault::ConfigRead => 1 << 1,
            Fault::WriteOverlap => 1 << 2,
            Fault::WriteFailure => 1 << 3,
        }
    }
}

/// Latched fault bits.
///
/// Latches stay set until explicitly cleared; the write faults are
/// cleared when a new logging session starts, the start faults when a
/// later start attempt gets past the step that raised them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultFlags(u8);

impl FaultFlags {
    /// No faults latched.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Latch a fault.
    pub fn latch(&mut self, fault: Fault) {
        self.0 |= fault.bit();
    }

    /// Drop a single latch.
    pub fn clear(&mut self, fault: Fault) {
        self.0 &= !fault.bit();
    }

    /// Drop the write-path latches at session start.
    pub fn clear_write_faults(&mut self) {
        self.clear(Fault::WriteOverlap);
        self.clear(Fault::WriteFailure);
    }

    /// Whether a particular fault is latched.
    pub fn is_set(&self, fault: Fault) -> bool {
        self.0 & fault.bit() != 0
    }

    /// Whether any fault is latched.
    pub fn any(&self) -> bool {
        self.0 != 0
    }

    /// Raw bits, for mirroring into an atomic for the indicator task.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Rebuild from raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_is_sticky() {
        let mut faults = FaultFlags::new();
        assert!(!faults.any());

        faults.latch(Fault::WriteOverlap);
        faults.latch(Fault::WriteOverlap);
        assert!(faults.is_set(Fault::WriteOverlap));
        assert!(!faults.is_set(Fault::WriteFailure));
        assert!(faults.any());
    }

    #[test]
    fn independent_bits() {
        let mut faults = FaultFlags::new();
        faults.latch(Fault::StorageInit);
        faults.latch(Fault::ConfigRead);
        faults.clear(Fault::StorageInit);
        assert!(!faults.is_set(Fault::StorageInit));
        assert!(faults.is_set(Fault::ConfigRead));
    }

    #[test]
    fn session_start_clears_write_faults_only() {
        let mut faults = FaultFlags::new();
        faults.latch(Fault::ConfigRead);
        faults.latch(Fault::WriteOverlap);
        faults.latch(Fault::WriteFailure);

        faults.clear_write_faults();
        assert!(!faults.is_set(Fault::WriteOverlap));
        assert!(!faults.is_set(Fault::WriteFailure));
        assert!(faults.is_set(Fault::ConfigRead));
    }

    #[test]
    fn bits_round_trip() {
        let mut faults = FaultFlags::new();
        faults.latch(Fault::WriteFailure);
        let restored = FaultFlags::from_bits(faults.bits());
        assert!(restored.is_set(Fault::WriteFailure));
    }
}
