//! JSON report of a profiling session
//!
//! The report holds the function table, one traversal of the call tree and
//! the session summary, so it can be plotted without the original session.

use crate::call_tree::{TraversalOrder, WidthDepthEvent};
use crate::error::Result;
use crate::function_profiler::{FunctionProfiler, FunctionStats};
use crate::measurement::Measurement;
use crate::session::{EventCounter, MemTrace};
use serde::Serialize;

/// A function from the encoder table
#[derive(Debug, Clone, Serialize)]
pub struct JsonFunction {
    pub id: usize,
    pub file: String,
    pub function: String,
    pub line: u32,
    /// Aggregated cost, absent when no invocation was retained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FunctionStats>,
}

/// Session level figures
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Traversal order of `events`
    pub order: &'static str,
    pub functions_kept: usize,
    pub functions_filtered: usize,
    pub events: EventCounter,
    /// `None` when no invocation was retained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    pub max_width: usize,
    pub data_initial: Measurement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_final: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_min: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_max: Option<Measurement>,
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub summary: JsonSummary,
    pub functions: Vec<JsonFunction>,
    pub events: Vec<WidthDepthEvent>,
}

impl JsonReport {
    pub fn from_session(session: &MemTrace, order: TraversalOrder) -> Self {
        let sequence = session.function_tree_seq();
        let profiler = FunctionProfiler::from_sequence(sequence);

        let functions = session
            .function_encoder()
            .iter()
            .map(|(id, location)| JsonFunction {
                id,
                file: location.filename.clone(),
                function: location.function.clone(),
                line: location.lineno,
                stats: profiler.get(id).copied(),
            })
            .collect();

        let summary = JsonSummary {
            order: match order {
                TraversalOrder::DepthFirst => "depth",
                TraversalOrder::WidthFirst => "width",
            },
            functions_kept: sequence.function_count(),
            functions_filtered: sequence.filtered_function_count(),
            events: session.event_counter(),
            // An empty tree has no depth; report it as absent
            max_depth: sequence.max_depth().ok(),
            max_width: sequence.max_width(),
            data_initial: session.data_initial(),
            data_final: session.data_final(),
            data_min: session.data_min(),
            data_max: session.data_max(),
        };

        Self {
            summary,
            functions,
            events: sequence.events(order).collect(),
        }
    }

    /// Pretty printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| std::io::Error::from(e).into())
    }
}
