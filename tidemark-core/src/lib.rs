//! Board-agnostic core logic for the Tidemark data logger
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Per-channel recursive averaging filter
//! - Configuration types and the plain-text config parser
//! - Row formatting (header and data rows)
//! - The double-buffered write scheduler with block alignment
//! - Button debounce state machine
//! - Logging state machine and sticky fault latches

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod debounce;
pub mod filter;
pub mod row;
pub mod scheduler;
pub mod state;

#[cfg(test)]
mod tests {
    //! End-to-end pipeline scenario: config -> filter -> row -> scheduler.

    use crate::config::{parse_config, ValueFormat};
    use crate::filter::FilterBank;
    use crate::row::{data_row, header_row};
    use crate::scheduler::{FlushOutcome, WriteScheduler, BLOCK_SIZE};

    const CONFIG: &str = "\
sample 100
timestamp 0
format_str %.2f
ch1_en 1
ch1_gain 2.0
ch3_en 1
ch3_gain 1.0
";

    #[test]
    fn config_to_row() {
        let cfg = parse_config(CONFIG).unwrap();
        assert_eq!(cfg.format, ValueFormat::Fixed(2));
        assert!(cfg.channels[0].enabled);
        assert!(cfg.channels[2].enabled);
        assert!(!cfg.channels[1].enabled);

        let mut filters = FilterBank::new();
        // Filter order 1: raw samples pass straight through.
        filters.update(0, 10.0, cfg.channels[0].filter_order);
        filters.update(2, 5.0, cfg.channels[2].filter_order);

        let header = header_row(&cfg);
        assert_eq!(header.as_str(), "ch #1,ch #3\r\n");

        let row = data_row(None, &filters.snapshot(), &cfg);
        assert_eq!(row.as_str(), "20.00,5.00\r\n");
    }

    #[test]
    fn disabled_channels_never_accumulate() {
        let cfg = parse_config(CONFIG).unwrap();
        let mut filters = FilterBank::new();

        // Feed every channel through its gate, the way the sampling
        // side does: closed gates skip the update.
        for _ in 0..100 {
            for (idx, gate) in cfg.channel_gates().iter().enumerate() {
                if let Some(order) = *gate {
                    filters.update(idx, 100.0, order);
                }
            }
        }

        assert_eq!(filters.value(0), 100.0);
        assert_eq!(filters.value(2), 100.0);
        assert_eq!(filters.value(1), 0.0);
        assert_eq!(filters.value(3), 0.0);
    }

    #[test]
    fn rows_accumulate_and_flush_aligned() {
        let cfg = parse_config(CONFIG).unwrap();
        let mut filters = FilterBank::new();
        filters.update(0, 10.0, 1.0);
        filters.update(2, 5.0, 1.0);

        let mut sched: WriteScheduler<2048> = WriteScheduler::new(1024);
        sched.append(header_row(&cfg).as_bytes()).unwrap();
        for _ in 0..3 {
            sched
                .append(data_row(None, &filters.snapshot(), &cfg).as_bytes())
                .unwrap();
        }

        assert_eq!(sched.flush(), FlushOutcome::Clean);
        let block = sched.pending_data().unwrap();
        assert_eq!(block.len() % BLOCK_SIZE, 0);
        assert!(block.starts_with(b"ch #1,ch #3\r\n20.00,5.00\r\n"));
        assert!(block.ends_with(b"\r\n"));
    }
}
