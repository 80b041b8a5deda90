//! Profiling session: function encoding, tree building and bookkeeping
//!
//! An event source (a language hook, a replayed log, a test) feeds
//! `(location, event, measurement)` observations into a `MemTrace`. The
//! session encodes the location, routes the event into its call sequence and
//! keeps running extremes of the measurements for reporting.

use crate::call_tree::{CallSequence, EventKind};
use crate::error::{MemTraceError, Result};
use crate::function_encoder::{FunctionEncoder, FunctionLocation};
use crate::measurement::Measurement;
use crate::retention::RetentionFilter;
use serde::Serialize;

/// Function names that do not correspond to a declared function
pub const SYNTHETIC_FUNCTION_NAMES: [&str; 5] =
    ["<dictcomp>", "<genexpr>", "<listcomp>", "<module>", "<setcomp>"];

/// Session settings
#[derive(Debug)]
pub struct SessionConfig {
    /// Retention filter, `None` keeps every invocation
    pub filter: Option<RetentionFilter>,
    /// Ignore comprehension/module frames and code compiled from strings
    pub skip_synthetic_frames: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            filter: None,
            skip_synthetic_frames: true,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_filter(mut self, filter: Option<RetentionFilter>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn skip_synthetic_frames(mut self, skip: bool) -> Self {
        self.skip_synthetic_frames = skip;
        self
    }
}

/// Counts of observed events by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounter {
    pub calls: u64,
    pub returns: u64,
    /// Events from synthetic frames that were not recorded
    pub skipped: u64,
}

impl EventCounter {
    pub fn total(&self) -> u64 {
        self.calls + self.returns + self.skipped
    }
}

/// True for frames that have no real declaration to point at
///
/// A file name counts as temporary when it starts with `<` and a later `>`
/// closes a non-empty tag, so `<stdin>` and `<frozen zipimport>.py` match.
pub fn is_synthetic_frame(filename: &str, function: &str) -> bool {
    let temporary_file = filename
        .strip_prefix('<')
        .is_some_and(|rest| rest.char_indices().skip(1).any(|(_, c)| c == '>'));
    temporary_file || SYNTHETIC_FUNCTION_NAMES.contains(&function)
}

/// One profiling session over a single thread of control
#[derive(Debug)]
pub struct MemTrace {
    function_encoder: FunctionEncoder,
    function_tree_seq: CallSequence,
    skip_synthetic_frames: bool,
    event_counter: EventCounter,
    data_initial: Measurement,
    data_min: Option<Measurement>,
    data_max: Option<Measurement>,
    data_final: Option<Measurement>,
}

impl MemTrace {
    /// Start a session; `data_initial` is the measurement taken at start
    pub fn new(config: SessionConfig, data_initial: Measurement) -> Self {
        if let Some(filter) = &config.filter {
            tracing::debug!(filter = filter.label(), "retention filter installed");
        }
        Self {
            function_encoder: FunctionEncoder::new(),
            function_tree_seq: CallSequence::with_filter(config.filter),
            skip_synthetic_frames: config.skip_synthetic_frames,
            event_counter: EventCounter::default(),
            data_initial,
            data_min: None,
            data_max: None,
            data_final: None,
        }
    }

    /// Handle one observation from an event source
    ///
    /// Synthetic frames are counted and ignored when the session skips them.
    pub fn record(
        &mut self,
        filename: &str,
        function: &str,
        firstlineno: u32,
        event: EventKind,
        data: Measurement,
    ) -> Result<()> {
        if self.data_final.is_some() {
            return Err(MemTraceError::SequenceError(
                "MemTrace.record() after finalise()".to_string(),
            ));
        }
        if self.skip_synthetic_frames && is_synthetic_frame(filename, function) {
            self.event_counter.skipped += 1;
            return Ok(());
        }
        self.add_data_point(filename, function, firstlineno, event, data)?;
        match event {
            EventKind::Call => self.event_counter.calls += 1,
            EventKind::Return => self.event_counter.returns += 1,
        }
        Ok(())
    }

    /// Encode the function and route the event, returning the function id
    ///
    /// Tests and replays drive this directly with synthetic measurements.
    pub fn add_data_point(
        &mut self,
        filename: &str,
        function: &str,
        firstlineno: u32,
        event: EventKind,
        data: Measurement,
    ) -> Result<usize> {
        let function_id = self.function_encoder.encode(filename, function, firstlineno)?;
        self.function_tree_seq
            .add_call_return_event(event, function_id, data)?;
        self.data_min = Some(self.data_min.map_or(data, |min| min.min(data)));
        self.data_max = Some(self.data_max.map_or(data, |max| max.max(data)));
        Ok(function_id)
    }

    /// Close the session; every top-level invocation must have returned
    pub fn finalise(&mut self, data_final: Measurement) -> Result<()> {
        if self.function_tree_seq.is_open() {
            return Err(MemTraceError::SequenceError(
                "MemTrace.finalise() with an open function".to_string(),
            ));
        }
        self.data_final = Some(data_final);
        tracing::debug!(
            events = self.event_counter.total(),
            functions = self.function_encoder.len(),
            retained = self.function_tree_seq.function_count(),
            filtered = self.function_tree_seq.filtered_function_count(),
            "session finalised"
        );
        Ok(())
    }

    pub fn decode_function_id(&self, function_id: usize) -> Result<&FunctionLocation> {
        self.function_encoder.decode(function_id)
    }

    pub fn function_encoder(&self) -> &FunctionEncoder {
        &self.function_encoder
    }

    pub fn function_tree_seq(&self) -> &CallSequence {
        &self.function_tree_seq
    }

    pub fn event_counter(&self) -> EventCounter {
        self.event_counter
    }

    /// Number of events observed, recorded or skipped
    pub fn eventno(&self) -> u64 {
        self.event_counter.total()
    }

    pub fn data_initial(&self) -> Measurement {
        self.data_initial
    }

    /// Componentwise minimum over recorded events
    pub fn data_min(&self) -> Option<Measurement> {
        self.data_min
    }

    /// Componentwise maximum over recorded events
    pub fn data_max(&self) -> Option<Measurement> {
        self.data_max
    }

    pub fn data_final(&self) -> Option<Measurement> {
        self.data_final
    }

    pub fn is_finalised(&self) -> bool {
        self.data_final.is_some()
    }
}
