//! Configuration type definitions
//!
//! One `ChannelConfig` per analog input plus the global acquisition
//! settings. A `LogConfig` is built once when a logging session starts
//! and is immutable for the life of the session.

use core::fmt::{self, Write};

use heapless::String;

/// Number of analog channels the pipeline supports.
pub const MAX_CHANNELS: usize = 8;

/// Upper bound on one rendered value field, including sign and decimals.
///
/// `Fixed(9)` applied to `f32::MAX` is the worst case: sign, 39 integer
/// digits, the point, and 9 decimals.
pub const MAX_FIELD_WIDTH: usize = 56;

/// Maximum decimal precision accepted from the config file.
pub const MAX_PRECISION: u8 = 9;

/// Closed set of supported value renderings.
///
/// The config file names a `printf`-style format, but it is validated
/// once at load time rather than threaded through to every field;
/// anything outside this set is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueFormat {
    /// Fixed decimal notation with the given number of decimals.
    Fixed(u8),
    /// Scientific notation with the given number of decimals.
    Scientific(u8),
    /// Truncating integer rendering.
    Integer,
}

impl Default for ValueFormat {
    fn default() -> Self {
        // Matches an unadorned "%f"
        ValueFormat::Fixed(6)
    }
}

impl ValueFormat {
    /// Parse a printf-style format spec from the config file.
    ///
    /// Accepted: `%f`, `%.Nf`, `%e`, `%.Ne`, `%d`, `%i` with N <= 9.
    pub fn parse(spec: &str) -> Option<Self> {
        let body = spec.strip_prefix('%')?;
        match body {
            "f" => return Some(ValueFormat::Fixed(6)),
            "e" => return Some(ValueFormat::Scientific(6)),
            "d" | "i" => return Some(ValueFormat::Integer),
            _ => {}
        }
        let rest = body.strip_prefix('.')?;
        if !rest.is_ascii() {
            return None;
        }
        let (digits, kind) = rest.split_at(rest.len().checked_sub(1)?);
        let precision: u8 = digits.parse().ok()?;
        if precision > MAX_PRECISION {
            return None;
        }
        match kind {
            "f" => Some(ValueFormat::Fixed(precision)),
            "e" => Some(ValueFormat::Scientific(precision)),
            _ => None,
        }
    }

    /// Render one value into `out`.
    ///
    /// Output is bounded by [`MAX_FIELD_WIDTH`] for any f32, so writing
    /// into a row buffer sized from that constant cannot fail.
    pub fn render<const N: usize>(&self, value: f32, out: &mut String<N>) -> fmt::Result {
        match *self {
            ValueFormat::Fixed(decimals) => write!(out, "{:.*}", decimals as usize, value),
            ValueFormat::Scientific(decimals) => write!(out, "{:.*e}", decimals as usize, value),
            ValueFormat::Integer => write!(out, "{}", value as i32),
        }
    }
}

/// Per-channel acquisition settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Channel participates in sampling and output rows.
    pub enabled: bool,
    /// Offset subtracted from the filtered value before scaling.
    pub zero: f32,
    /// Scale applied after the zero offset.
    pub gain: f32,
    /// Smoothing window of the recursive average, >= 1.
    pub filter_order: f32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            zero: 0.0,
            gain: 1.0,
            filter_order: 1.0,
        }
    }
}

/// Full logging configuration for one session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogConfig {
    /// Per-channel settings, indexed 0..MAX_CHANNELS.
    pub channels: [ChannelConfig; MAX_CHANNELS],
    /// Row period in milliseconds.
    pub sample_period_ms: f32,
    /// Prefix every row with the tick timestamp.
    pub include_timestamp: bool,
    /// Value rendering shared by all channels.
    pub format: ValueFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            channels: [ChannelConfig::default(); MAX_CHANNELS],
            sample_period_ms: 100.0,
            include_timestamp: true,
            format: ValueFormat::default(),
        }
    }
}

impl LogConfig {
    /// Number of channels that will appear in each row.
    pub fn enabled_count(&self) -> usize {
        self.channels.iter().filter(|c| c.enabled).count()
    }

    /// Per-channel filter gate: `Some(order)` for enabled channels,
    /// `None` for disabled ones. The sampling side feeds the filter
    /// bank only through open gates, so disabled channels never
    /// accumulate.
    pub fn channel_gates(&self) -> [Option<f32>; MAX_CHANNELS] {
        let mut gates = [None; MAX_CHANNELS];
        for (gate, channel) in gates.iter_mut().zip(self.channels.iter()) {
            if channel.enabled {
                *gate = Some(channel.filter_order);
            }
        }
        gates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(format: ValueFormat, value: f32) -> String<64> {
        let mut out = String::new();
        format.render(value, &mut out).unwrap();
        out
    }

    #[test]
    fn parse_plain_specs() {
        assert_eq!(ValueFormat::parse("%f"), Some(ValueFormat::Fixed(6)));
        assert_eq!(ValueFormat::parse("%e"), Some(ValueFormat::Scientific(6)));
        assert_eq!(ValueFormat::parse("%d"), Some(ValueFormat::Integer));
        assert_eq!(ValueFormat::parse("%i"), Some(ValueFormat::Integer));
    }

    #[test]
    fn parse_precision_specs() {
        assert_eq!(ValueFormat::parse("%.2f"), Some(ValueFormat::Fixed(2)));
        assert_eq!(ValueFormat::parse("%.0f"), Some(ValueFormat::Fixed(0)));
        assert_eq!(ValueFormat::parse("%.3e"), Some(ValueFormat::Scientific(3)));
    }

    #[test]
    fn reject_unsupported_specs() {
        assert_eq!(ValueFormat::parse("%s"), None);
        assert_eq!(ValueFormat::parse("%.12f"), None);
        assert_eq!(ValueFormat::parse("%10.2f"), None);
        assert_eq!(ValueFormat::parse("f"), None);
        assert_eq!(ValueFormat::parse("%"), None);
    }

    #[test]
    fn render_fixed() {
        assert_eq!(rendered(ValueFormat::Fixed(2), 20.0).as_str(), "20.00");
        assert_eq!(rendered(ValueFormat::Fixed(0), -1.5).as_str(), "-2");
    }

    #[test]
    fn render_integer_truncates() {
        assert_eq!(rendered(ValueFormat::Integer, 5.9).as_str(), "5");
        assert_eq!(rendered(ValueFormat::Integer, -5.9).as_str(), "-5");
    }

    #[test]
    fn render_scientific() {
        assert_eq!(rendered(ValueFormat::Scientific(2), 1234.5).as_str(), "1.23e3");
    }

    #[test]
    fn worst_case_field_fits_bound() {
        let out = rendered(ValueFormat::Fixed(9), f32::MAX);
        assert!(out.len() <= MAX_FIELD_WIDTH);
    }

    #[test]
    fn channel_gates_follow_enablement() {
        let mut config = LogConfig::default();
        config.channels[1].enabled = true;
        config.channels[1].filter_order = 4.0;

        let gates = config.channel_gates();
        assert_eq!(gates[1], Some(4.0));
        assert!(gates.iter().enumerate().all(|(i, g)| i == 1 || g.is_none()));
    }
}
