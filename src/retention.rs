//! Retention filtering of completed invocations
//!
//! A filter is evaluated once, when an invocation returns. Invocations it
//! rejects are spliced out of the call tree together with their subtrees.
//! "No filter" is represented as `Option::None` by the call tree so that the
//! retain-everything case never pays for a predicate call.

use crate::error::{MemTraceError, Result};
use crate::measurement::Measurement;
use std::fmt;

/// Time threshold that disables time filtering (milliseconds)
pub const DEFAULT_FILTER_MIN_TIME: i64 = -1;

/// Memory threshold that disables memory filtering (kilobytes)
pub const DEFAULT_FILTER_MIN_MEMORY: i64 = 0;

type Predicate = Box<dyn Fn(&Measurement, &Measurement) -> bool + Send + Sync>;

/// Predicate over `(call_data, return_data)` deciding if an invocation is kept
pub struct RetentionFilter {
    label: String,
    predicate: Predicate,
}

impl RetentionFilter {
    /// Wrap an arbitrary predicate
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Measurement, &Measurement) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Keep invocations that took at least `min_time_ms` milliseconds
    pub fn min_time(min_time_ms: i64) -> Self {
        Self::new(format!("time >= {} ms", min_time_ms), move |call, ret| {
            time_reached(call, ret, min_time_ms)
        })
    }

    /// Keep invocations whose memory changed by at least `min_memory_kb` either way
    pub fn min_memory(min_memory_kb: i64) -> Self {
        Self::new(format!("|memory| >= {} kb", min_memory_kb), move |call, ret| {
            memory_reached(call, ret, min_memory_kb)
        })
    }

    /// Keep invocations meeting either the time or the memory threshold
    pub fn either(min_time_ms: i64, min_memory_kb: i64) -> Self {
        Self::new(
            format!("time >= {} ms or |memory| >= {} kb", min_time_ms, min_memory_kb),
            move |call, ret| {
                time_reached(call, ret, min_time_ms) || memory_reached(call, ret, min_memory_kb)
            },
        )
    }

    /// Build a filter from command line style thresholds
    ///
    /// Returns `Ok(None)` when both thresholds are at their defaults, meaning
    /// every invocation is retained.
    pub fn from_thresholds(min_time_ms: i64, min_memory_kb: i64) -> Result<Option<Self>> {
        if min_memory_kb < 0 {
            return Err(MemTraceError::InvalidInput(format!(
                "filter_min_memory must be >= 0 not {}",
                min_memory_kb
            )));
        }
        let time_set = min_time_ms != DEFAULT_FILTER_MIN_TIME;
        let memory_set = min_memory_kb != DEFAULT_FILTER_MIN_MEMORY;

        let filter = match (time_set, memory_set) {
            (false, false) => None,
            (true, false) => Some(Self::min_time(min_time_ms)),
            (false, true) => Some(Self::min_memory(min_memory_kb)),
            (true, true) => Some(Self::either(min_time_ms, min_memory_kb)),
        };
        Ok(filter)
    }

    /// Human readable description of what is retained
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True if the invocation should stay in the tree
    pub fn retains(&self, call_data: &Measurement, return_data: &Measurement) -> bool {
        (self.predicate)(call_data, return_data)
    }
}

impl fmt::Debug for RetentionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetentionFilter")
            .field("label", &self.label)
            .finish()
    }
}

fn time_reached(call: &Measurement, ret: &Measurement, min_time_ms: i64) -> bool {
    let diff = *ret - *call;
    diff.time * 1e3 >= min_time_ms as f64
}

fn memory_reached(call: &Measurement, ret: &Measurement, min_memory_kb: i64) -> bool {
    let diff = *ret - *call;
    (diff.memory as f64 / 1024.0).abs() >= min_memory_kb as f64
}
