//! CSV output of call-tree traversals
//!
//! One row per traversal tuple, for spreadsheet analysis and plotting.

use crate::call_tree::{CallSequence, TraversalOrder, WidthDepthEvent};
use crate::error::Result;
use crate::function_encoder::FunctionEncoder;
use crate::function_profiler::FunctionProfiler;

/// CSV record for a single traversal tuple
#[derive(Debug, Clone)]
pub struct CsvEvent {
    pub event: WidthDepthEvent,
    pub function: String,
    pub file: String,
    pub line: u32,
}

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput {
    events: Vec<CsvEvent>,
    include_source: bool,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new(include_source: bool) -> Self {
        Self {
            events: Vec::new(),
            include_source,
        }
    }

    /// Collect a whole traversal, decoding function ids through `encoder`
    pub fn from_sequence(
        sequence: &CallSequence,
        order: TraversalOrder,
        encoder: &FunctionEncoder,
        include_source: bool,
    ) -> Result<Self> {
        let mut output = Self::new(include_source);
        for event in sequence.events(order) {
            let location = encoder.decode(event.function_id)?;
            output.add_event(CsvEvent {
                event,
                function: location.function.clone(),
                file: location.filename.clone(),
                line: location.lineno,
            });
        }
        Ok(output)
    }

    /// Add a traversal tuple to the output
    pub fn add_event(&mut self, event: CsvEvent) {
        self.events.push(event);
    }

    /// Generate CSV header row based on enabled flags
    fn header(&self) -> String {
        let mut headers = vec![
            "width",
            "depth",
            "event",
            "function_id",
            "function",
            "time",
            "memory",
        ];

        if self.include_source {
            headers.push("source_location");
        }

        headers.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Format a traversal tuple as CSV row
    fn format_event(&self, row: &CsvEvent) -> String {
        let mut fields = vec![
            row.event.width.to_string(),
            row.event.depth.to_string(),
            row.event.event.to_string(),
            row.event.function_id.to_string(),
            Self::escape_field(&row.function),
            format!("{:.6}", row.event.data.time),
            row.event.data.memory.to_string(),
        ];

        if self.include_source {
            fields.push(Self::escape_field(&format!("{}:{}", row.file, row.line)));
        }

        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for row in &self.events {
            output.push_str(&self.format_event(row));
            output.push('\n');
        }

        output
    }
}

/// CSV of the per-function summary
pub fn function_stats_csv(profiler: &FunctionProfiler, encoder: &FunctionEncoder) -> String {
    let mut output = String::from("function_id,function,calls,total_time,total_memory\n");
    for (function_id, stats) in profiler.sorted() {
        let name = encoder
            .decode(function_id)
            .map(|location| location.function.clone())
            .unwrap_or_default();
        output.push_str(&format!(
            "{},{},{},{:.6},{}\n",
            function_id,
            CsvOutput::escape_field(&name),
            stats.call_count,
            stats.total_time,
            stats.total_memory
        ));
    }
    output
}
