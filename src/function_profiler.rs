//! Function-level cost aggregation over a finished call tree
//!
//! Every retained invocation contributes its `return - call` measurement to
//! the totals of its function. Invocations dropped by the retention filter
//! are not in the tree and so never contribute.

use crate::call_tree::{CallSequence, EventKind};
use crate::error::Result;
use crate::function_encoder::FunctionEncoder;
use crate::measurement::Measurement;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Statistics for a single function
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FunctionStats {
    /// Number of retained invocations
    pub call_count: u64,
    /// Inclusive elapsed time over all invocations (seconds)
    pub total_time: f64,
    /// Net memory change over all invocations (bytes)
    pub total_memory: i64,
    /// Largest single memory change, either direction (bytes)
    pub peak_memory_delta: i64,
}

/// Tracks function-level statistics keyed by function id
#[derive(Debug, Default)]
pub struct FunctionProfiler {
    stats: HashMap<usize, FunctionStats>,
}

impl FunctionProfiler {
    /// Create an empty profiler
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate every closed invocation in `sequence`
    pub fn from_sequence(sequence: &CallSequence) -> Self {
        let mut profiler = Self::new();
        let mut open_calls: Vec<Measurement> = Vec::new();
        for event in sequence.gen_depth_first() {
            match event.event {
                EventKind::Call => open_calls.push(event.data),
                EventKind::Return => {
                    if let Some(call_data) = open_calls.pop() {
                        profiler.record(event.function_id, event.data - call_data);
                    }
                }
            }
        }
        // Anything left is on the still-open rightmost path
        if !open_calls.is_empty() {
            tracing::debug!(open = open_calls.len(), "open invocations not aggregated");
        }
        profiler
    }

    /// Record one invocation's cost
    pub fn record(&mut self, function_id: usize, delta: Measurement) {
        let entry = self.stats.entry(function_id).or_default();
        entry.call_count += 1;
        entry.total_time += delta.time;
        entry.total_memory += delta.memory;
        if delta.memory.abs() > entry.peak_memory_delta.abs() {
            entry.peak_memory_delta = delta.memory;
        }
    }

    pub fn get(&self, function_id: usize) -> Option<&FunctionStats> {
        self.stats.get(&function_id)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Functions sorted by total time, slowest first; ties by id
    pub fn sorted(&self) -> Vec<(usize, &FunctionStats)> {
        let mut sorted: Vec<_> = self.stats.iter().map(|(id, stats)| (*id, stats)).collect();
        sorted.sort_by(|a, b| {
            b.1.total_time
                .total_cmp(&a.1.total_time)
                .then_with(|| a.0.cmp(&b.0))
        });
        sorted
    }

    /// Write the function summary table
    pub fn write_summary<W: Write>(&self, w: &mut W, encoder: &FunctionEncoder) -> Result<()> {
        if self.stats.is_empty() {
            writeln!(w, "No function profiling data collected.")?;
            return Ok(());
        }

        writeln!(
            w,
            "{:<40} {:>8} {:>14} {:>14} {:>14}",
            "Function", "Calls", "Total (ms)", "Avg (ms)", "Net (kb)"
        )?;
        writeln!(w, "{}", "─".repeat(94))?;

        for (function_id, stats) in self.sorted() {
            let name = match encoder.decode(function_id) {
                Ok(location) => location.function.clone(),
                Err(_) => format!("<id {}>", function_id),
            };
            let avg_ms = if stats.call_count > 0 {
                stats.total_time * 1e3 / stats.call_count as f64
            } else {
                0.0
            };
            writeln!(
                w,
                "{:<40} {:>8} {:>14.3} {:>14.3} {:>14.1}",
                name,
                stats.call_count,
                stats.total_time * 1e3,
                avg_ms,
                stats.total_memory as f64 / 1024.0
            )?;
        }

        writeln!(w, "{}", "─".repeat(94))?;
        Ok(())
    }
}
