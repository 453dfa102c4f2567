//! Button debounce
//!
//! Iteration-count debounce: `sample` is called once per control-loop
//! pass, so the debounce interval is proportional to the loop rate, not
//! wall-clock time. The control task polls at a fixed cadence to keep
//! the count deterministic; converting the threshold to a wall-clock
//! duration would change the contract and is deliberately not done here.

/// A confirmed transition of the debounced level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Stable level went low -> high.
    Rising,
    /// Stable level went high -> low.
    Falling,
}

/// Debounce state for one input.
///
/// `stable` flips only after the raw input has disagreed with it for
/// strictly more than `threshold` consecutive samples. Any agreeing
/// sample resets the counter; there is no hysteresis memory across
/// direction changes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonDebounce {
    stable: bool,
    counter: u32,
    threshold: u32,
}

impl ButtonDebounce {
    /// Create a debouncer starting at the released (low) level.
    pub const fn new(threshold: u32) -> Self {
        Self {
            stable: false,
            counter: 0,
            threshold,
        }
    }

    /// Feed one raw reading; returns the edge if the stable level flips.
    pub fn sample(&mut self, raw: bool) -> Option<Edge> {
        if raw == self.stable {
            self.counter = 0;
            return None;
        }

        self.counter += 1;
        if self.counter > self.threshold {
            self.stable = raw;
            self.counter = 0;
            return Some(if raw { Edge::Rising } else { Edge::Falling });
        }
        None
    }

    /// Current debounced level.
    pub fn stable(&self) -> bool {
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u32 = 5;

    #[test]
    fn exactly_threshold_polls_do_not_flip() {
        let mut button = ButtonDebounce::new(THRESHOLD);
        for _ in 0..THRESHOLD {
            assert_eq!(button.sample(true), None);
        }
        assert!(!button.stable());
    }

    #[test]
    fn threshold_plus_one_polls_flip() {
        let mut button = ButtonDebounce::new(THRESHOLD);
        for _ in 0..THRESHOLD {
            assert_eq!(button.sample(true), None);
        }
        assert_eq!(button.sample(true), Some(Edge::Rising));
        assert!(button.stable());
    }

    #[test]
    fn bounce_resets_counter() {
        let mut button = ButtonDebounce::new(THRESHOLD);
        for _ in 0..THRESHOLD {
            button.sample(true);
        }
        // One agreeing sample wipes the progress.
        assert_eq!(button.sample(false), None);
        for _ in 0..THRESHOLD {
            assert_eq!(button.sample(true), None);
        }
        assert_eq!(button.sample(true), Some(Edge::Rising));
    }

    #[test]
    fn release_produces_falling_edge() {
        let mut button = ButtonDebounce::new(THRESHOLD);
        for _ in 0..=THRESHOLD {
            button.sample(true);
        }
        assert!(button.stable());

        for _ in 0..THRESHOLD {
            assert_eq!(button.sample(false), None);
        }
        assert_eq!(button.sample(false), Some(Edge::Falling));
        assert!(!button.stable());
    }

    #[test]
    fn steady_input_stays_quiet() {
        let mut button = ButtonDebounce::new(THRESHOLD);
        for _ in 0..100 {
            assert_eq!(button.sample(false), None);
        }
        assert!(!button.stable());
    }
}
