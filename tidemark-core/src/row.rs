//! Row formatting
//!
//! Renders the header row written at file-open time and the data rows
//! appended on every row tick. Rows are comma delimited, CRLF terminated,
//! with an optional leading tick timestamp.
//!
//! Row length is structurally bounded: fields render into at most
//! [`MAX_FIELD_WIDTH`] bytes each (see
//! [`ValueFormat::render`](crate::config::ValueFormat::render)), so a
//! `heapless::String<MAX_ROW_LEN>` always has room and the formatting
//! functions are infallible.

use core::fmt::Write;

use heapless::String;

use crate::config::{LogConfig, MAX_CHANNELS, MAX_FIELD_WIDTH};

/// Widest tick timestamp (u32 decimal digits).
const TIMESTAMP_WIDTH: usize = 10;

/// Upper bound on one rendered row including CRLF.
pub const MAX_ROW_LEN: usize = TIMESTAMP_WIDTH + MAX_CHANNELS * (MAX_FIELD_WIDTH + 1) + 2;

/// Row terminator.
pub const ROW_TERMINATOR: &[u8] = b"\r\n";

/// Render the column header row: `"Timestamp"` if enabled, then
/// `ch #<N>` per enabled channel, CRLF terminated.
pub fn header_row(config: &LogConfig) -> String<MAX_ROW_LEN> {
    let mut row: String<MAX_ROW_LEN> = String::new();
    let mut first = true;

    if config.include_timestamp {
        let _ = row.push_str("Timestamp");
        first = false;
    }
    for (index, channel) in config.channels.iter().enumerate() {
        if channel.enabled {
            if !first {
                let _ = row.push(',');
            }
            first = false;
            let _ = write!(row, "ch #{}", index + 1);
        }
    }
    let _ = row.push_str("\r\n");
    row
}

/// Render one data row from a snapshot of the filtered values.
///
/// For each enabled channel in index order the calibrated value is
/// `(filtered - zero) * gain`, rendered with the session's
/// [`ValueFormat`](crate::config::ValueFormat).
pub fn data_row(
    timestamp: Option<u32>,
    filtered: &[f32; MAX_CHANNELS],
    config: &LogConfig,
) -> String<MAX_ROW_LEN> {
    let mut row: String<MAX_ROW_LEN> = String::new();
    let mut first = true;

    if config.include_timestamp {
        let _ = write!(row, "{}", timestamp.unwrap_or(0));
        first = false;
    }
    for (index, channel) in config.channels.iter().enumerate() {
        if channel.enabled {
            if !first {
                let _ = row.push(',');
            }
            first = false;
            let calibrated = (filtered[index] - channel.zero) * channel.gain;
            let _ = config.format.render(calibrated, &mut row);
        }
    }
    let _ = row.push_str("\r\n");
    row
}
