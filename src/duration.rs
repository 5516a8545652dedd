//! Human Duration Module
//!
//! Parses human-readable durations such as `"1s"`, `"250ms"` or
//! `"1h 30m"` into a [`Duration`].

use std::time::Duration;

use crate::error::{Result, StoreError};

/// Parse a human-readable duration string.
///
/// Supports `ms`, `s`, `m`, `h`, `d` and `w` units along with their long
/// forms (`sec`, `seconds`, `min`, `hours`, ...). Groups are summed, so
/// `"1h30m"` is ninety minutes. A bare number is taken as milliseconds.
pub fn parse_human(input: &str) -> Result<Duration> {
    let input = input.trim();

    if input.is_empty() {
        return Err(StoreError::Configuration(
            "duration cannot be empty".to_string(),
        ));
    }

    // Bare number: milliseconds
    if let Ok(ms) = input.parse::<f64>() {
        return millis_to_duration(ms, input);
    }

    let mut total_ms: f64 = 0.0;
    let mut current_num = String::new();
    let mut current_unit = String::new();

    for c in input.chars() {
        match c {
            '0'..='9' | '.' => {
                if !current_unit.is_empty() {
                    total_ms += group_ms(&current_num, &current_unit, input)?;
                    current_num.clear();
                    current_unit.clear();
                }
                current_num.push(c);
            }
            c if c.is_ascii_alphabetic() => {
                if current_num.is_empty() {
                    return Err(StoreError::Configuration(format!(
                        "missing number before '{}' in duration: '{}'",
                        c, input
                    )));
                }
                current_unit.push(c.to_ascii_lowercase());
            }
            c if c.is_whitespace() || c == ',' => {}
            _ => {
                return Err(StoreError::Configuration(format!(
                    "invalid character '{}' in duration: '{}'",
                    c, input
                )));
            }
        }
    }

    if current_unit.is_empty() {
        return Err(StoreError::Configuration(format!(
            "missing unit after '{}' in duration: '{}'",
            current_num, input
        )));
    }
    total_ms += group_ms(&current_num, &current_unit, input)?;

    millis_to_duration(total_ms, input)
}

/// Milliseconds contributed by one `<number><unit>` group.
fn group_ms(num: &str, unit: &str, input: &str) -> Result<f64> {
    let value: f64 = num.parse().map_err(|_| {
        StoreError::Configuration(format!("invalid number '{}' in duration: '{}'", num, input))
    })?;

    let factor = match unit {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        _ => {
            return Err(StoreError::Configuration(format!(
                "unknown unit '{}' in duration: '{}'",
                unit, input
            )))
        }
    };

    Ok(value * factor)
}

fn millis_to_duration(ms: f64, input: &str) -> Result<Duration> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(StoreError::Configuration(format!(
            "duration must be a non-negative finite value: '{}'",
            input
        )));
    }
    Ok(Duration::from_millis(ms.round() as u64))
}
