//! memtrace - call-tree reconstruction for time and memory profiling
//!
//! This library rebuilds a tree of function invocations from a flat stream
//! of call and return events, each carrying a time and memory measurement,
//! and offers depth-first and width-first traversals of the result for
//! plotting, dumps and per-function summaries.

pub mod call_tree;
pub mod cli;
pub mod csv_output;
pub mod dump;
pub mod error;
pub mod event_log;
pub mod function_encoder;
pub mod function_profiler;
pub mod json_output;
pub mod measurement;
pub mod retention;
pub mod session;

pub use call_tree::{CallNode, CallSequence, EventKind, TraversalOrder, WidthDepthEvent};
pub use error::{MemTraceError, Result};
pub use function_encoder::{FunctionEncoder, FunctionLocation};
pub use measurement::Measurement;
pub use retention::RetentionFilter;
pub use session::{MemTrace, SessionConfig};
