//! Per-channel exponential smoothing of raw samples
//!
//! Each channel carries a single-pole recursive average:
//!
//! `filtered = filtered * (n - 1) / n + raw / n`
//!
//! where `n` is the configured filter order. An order of 1 passes raw
//! samples through unchanged. Inputs are not validated; a NaN or infinite
//! sample propagates into the accumulator (documented limitation).
//!
//! Accumulators are reset once at process start and persist across
//! logging sessions: the running average keeps tracking the input even
//! while the logger is idle.

use crate::config::MAX_CHANNELS;

/// Filter accumulators, one per channel.
///
/// Owned by the sampling context. Readers must snapshot the values under
/// the same critical section the writer uses so a multi-byte float is
/// never observed half-written.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterBank {
    filtered: [f32; MAX_CHANNELS],
}

impl Default for FilterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBank {
    /// Create a bank with all accumulators at zero.
    pub const fn new() -> Self {
        Self {
            filtered: [0.0; MAX_CHANNELS],
        }
    }

    /// Fold one raw sample into a channel's accumulator.
    ///
    /// `order` must be >= 1 (enforced at config load). Must stay cheap:
    /// this runs in the sampling context on every conversion.
    pub fn update(&mut self, channel: usize, raw: f32, order: f32) {
        self.filtered[channel] = self.filtered[channel] * ((order - 1.0) / order) + raw / order;
    }

    /// Current filtered value of one channel.
    pub fn value(&self, channel: usize) -> f32 {
        self.filtered[channel]
    }

    /// Copy of all accumulators, for handing to the row formatter.
    pub fn snapshot(&self) -> [f32; MAX_CHANNELS] {
        self.filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn order_one_passes_through() {
        let mut bank = FilterBank::new();
        bank.update(0, 42.5, 1.0);
        assert_eq!(bank.value(0), 42.5);
        bank.update(0, -3.0, 1.0);
        assert_eq!(bank.value(0), -3.0);
    }

    #[test]
    fn converges_to_constant_input() {
        let mut bank = FilterBank::new();
        for _ in 0..10_000 {
            bank.update(3, 100.0, 16.0);
        }
        assert!((bank.value(3) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn higher_order_responds_slower() {
        let mut fast = FilterBank::new();
        let mut slow = FilterBank::new();
        for _ in 0..10 {
            fast.update(0, 50.0, 2.0);
            slow.update(0, 50.0, 32.0);
        }
        assert!(fast.value(0) > slow.value(0));
    }

    #[test]
    fn accumulators_start_at_zero() {
        let bank = FilterBank::new();
        for ch in 0..MAX_CHANNELS {
            assert_eq!(bank.value(ch), 0.0);
        }
    }

    proptest! {
        /// For any order n >= 1 and constant input x, the accumulator
        /// converges to x.
        #[test]
        fn converges_for_any_order(order in 1u32..64, x in -1000.0f32..1000.0) {
            let mut bank = FilterBank::new();
            for _ in 0..20_000 {
                bank.update(0, x, order as f32);
            }
            prop_assert!((bank.value(0) - x).abs() < 0.01 * (1.0 + x.abs()));
        }
    }
}
