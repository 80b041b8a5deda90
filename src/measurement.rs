//! Time and memory snapshot taken at a call or return event

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Sub, SubAssign};

/// Wall clock time and resident memory observed at one event
///
/// Subtraction is componentwise, which gives the cost of an invocation
/// (`return - call`) or an offset from a session baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Wall clock time in seconds
    pub time: f64,
    /// Resident memory in bytes (signed so that deltas can shrink)
    pub memory: i64,
}

impl Measurement {
    pub fn new(time: f64, memory: i64) -> Self {
        Self { time, memory }
    }

    /// Componentwise minimum of two measurements
    pub fn min(self, other: Self) -> Self {
        Self {
            time: self.time.min(other.time),
            memory: self.memory.min(other.memory),
        }
    }

    /// Componentwise maximum of two measurements
    pub fn max(self, other: Self) -> Self {
        Self {
            time: self.time.max(other.time),
            memory: self.memory.max(other.memory),
        }
    }

    /// Time in milliseconds and memory in kilobytes, formatted for reports
    pub fn str_pair(&self) -> (String, String) {
        (
            format!("{} (ms)", group_thousands(self.time * 1e3)),
            format!("{} (kb)", group_thousands(self.memory as f64 / 1024.0)),
        )
    }
}

impl Sub for Measurement {
    type Output = Measurement;

    fn sub(self, other: Self) -> Self::Output {
        Measurement {
            time: self.time - other.time,
            memory: self.memory - other.memory,
        }
    }
}

impl SubAssign for Measurement {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (time, memory) = self.str_pair();
        write!(f, "{} {}", time, memory)
    }
}

/// Round to an integer and insert `,` every three digits
fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if grouped == "0" {
        // "-0" after rounding a tiny negative value
        return grouped;
    }
    format!("{}{}", sign, grouped)
}
