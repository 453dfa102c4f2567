//! Plain-text configuration parser
//!
//! The config source is a text file with one `key value` pair per line,
//! whitespace separated. Recognized keys:
//!
//! - `sample`: row period in milliseconds (float, required)
//! - `timestamp`: 0/1, prefix rows with the tick timestamp
//! - `ch<N>_en`, `ch<N>_zero`, `ch<N>_gain`, `ch<N>_filt` for N = 1..8
//! - `format_str`: value format spec, validated into [`ValueFormat`]
//!
//! Unknown keys are ignored and malformed lines are skipped, so a
//! hand-edited file with stray text still loads. Only a missing
//! `sample` key or an unsupported format spec fails the whole read.

use super::types::{LogConfig, ValueFormat, MAX_CHANNELS};

/// Config read failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The required `sample` key was not found.
    MissingSamplePeriod,
    /// `format_str` is not in the supported set.
    UnsupportedFormat,
}

/// Parse the config file contents into a [`LogConfig`].
pub fn parse_config(input: &str) -> Result<LogConfig, ConfigError> {
    let mut config = LogConfig::default();
    let mut have_sample = false;

    for line in input.lines() {
        let mut fields = line.split_whitespace();
        let (key, value) = match (fields.next(), fields.next()) {
            (Some(k), Some(v)) => (k, v),
            _ => continue,
        };

        match key {
            "sample" => {
                if let Ok(period) = value.parse::<f32>() {
                    config.sample_period_ms = period;
                    have_sample = true;
                }
            }
            "timestamp" => {
                if let Ok(flag) = value.parse::<f32>() {
                    config.include_timestamp = flag != 0.0;
                }
            }
            "format_str" => {
                config.format = ValueFormat::parse(value).ok_or(ConfigError::UnsupportedFormat)?;
            }
            _ => {
                if let Some((index, field)) = parse_channel_key(key) {
                    apply_channel_field(&mut config, index, field, value);
                }
            }
        }
    }

    if !have_sample {
        return Err(ConfigError::MissingSamplePeriod);
    }
    Ok(config)
}

/// Per-channel key suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelField {
    Enabled,
    Zero,
    Gain,
    FilterOrder,
}

/// Split `ch<N>_<field>` into a zero-based channel index and field.
fn parse_channel_key(key: &str) -> Option<(usize, ChannelField)> {
    let rest = key.strip_prefix("ch")?;
    let (digit, suffix) = rest.split_once('_')?;
    let number: usize = digit.parse().ok()?;
    if number < 1 || number > MAX_CHANNELS {
        return None;
    }
    let field = match suffix {
        "en" => ChannelField::Enabled,
        "zero" => ChannelField::Zero,
        "gain" => ChannelField::Gain,
        "filt" => ChannelField::FilterOrder,
        _ => return None,
    };
    Some((number - 1, field))
}

fn apply_channel_field(config: &mut LogConfig, index: usize, field: ChannelField, value: &str) {
    let parsed = match value.parse::<f32>() {
        Ok(v) => v,
        Err(_) => return,
    };
    let channel = &mut config.channels[index];
    match field {
        ChannelField::Enabled => channel.enabled = parsed != 0.0,
        ChannelField::Zero => channel.zero = parsed,
        ChannelField::Gain => channel.gain = parsed,
        // The recursive average divides by the order; clamp below 1
        // here so the filter never has to.
        ChannelField::FilterOrder => channel.filter_order = parsed.max(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let cfg = parse_config("sample 50\n").unwrap();
        assert_eq!(cfg.sample_period_ms, 50.0);
        assert!(cfg.include_timestamp);
        assert_eq!(cfg.enabled_count(), 0);
        assert_eq!(cfg.format, ValueFormat::Fixed(6));
    }

    #[test]
    fn missing_sample_fails() {
        assert_eq!(
            parse_config("ch1_en 1\n"),
            Err(ConfigError::MissingSamplePeriod)
        );
        assert_eq!(parse_config(""), Err(ConfigError::MissingSamplePeriod));
    }

    #[test]
    fn channel_settings() {
        let cfg = parse_config(
            "sample 100\nch1_en 1\nch1_zero 0.5\nch1_gain 2.5\nch1_filt 8\nch8_en 1\n",
        )
        .unwrap();
        assert!(cfg.channels[0].enabled);
        assert_eq!(cfg.channels[0].zero, 0.5);
        assert_eq!(cfg.channels[0].gain, 2.5);
        assert_eq!(cfg.channels[0].filter_order, 8.0);
        assert!(cfg.channels[7].enabled);
        assert_eq!(cfg.enabled_count(), 2);
    }

    #[test]
    fn filter_order_clamped_to_one() {
        let cfg = parse_config("sample 100\nch2_filt 0\nch3_filt -4\n").unwrap();
        assert_eq!(cfg.channels[1].filter_order, 1.0);
        assert_eq!(cfg.channels[2].filter_order, 1.0);
    }

    #[test]
    fn unknown_keys_and_garbage_ignored() {
        let cfg = parse_config(
            "sample 100\nch9_en 1\nch0_en 1\nbogus_key 7\njustoneword\nch1_gain notanumber\n",
        )
        .unwrap();
        assert_eq!(cfg.enabled_count(), 0);
        assert_eq!(cfg.channels[0].gain, 1.0);
    }

    #[test]
    fn timestamp_flag() {
        let cfg = parse_config("sample 100\ntimestamp 0\n").unwrap();
        assert!(!cfg.include_timestamp);
        let cfg = parse_config("sample 100\ntimestamp 1\n").unwrap();
        assert!(cfg.include_timestamp);
    }

    #[test]
    fn unsupported_format_fails() {
        assert_eq!(
            parse_config("sample 100\nformat_str %s\n"),
            Err(ConfigError::UnsupportedFormat)
        );
    }

    #[test]
    fn format_spec_accepted() {
        let cfg = parse_config("sample 100\nformat_str %.3e\n").unwrap();
        assert_eq!(cfg.format, ValueFormat::Scientific(3));
    }
}
