// Call-tree reconstruction from a flat call/return event stream
//
// Events arrive in program order from a single thread of control. Each call
// opens a node under the deepest open node; each return closes that deepest
// open node. Completed nodes may be dropped by a RetentionFilter.
//
// Two read-only views are produced:
// - depth first: call tuples in pre-order, return tuples in post-order
// - width first: every node at depth 0, then every node at depth 1, ...

mod node;
mod sequence;
mod traversal;

pub use node::{CallNode, NodeState, ReturnOutcome};
pub use sequence::CallSequence;
pub use traversal::{DepthFirst, WidthFirst};

use crate::error::MemTraceError;
use crate::measurement::Measurement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of event observed at a function boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Call,
    Return,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Call => "call",
            EventKind::Return => "return",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = MemTraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(EventKind::Call),
            "return" => Ok(EventKind::Return),
            other => Err(MemTraceError::InvalidInput(format!(
                "Expected \"call\" or \"return\" not \"{}\"",
                other
            ))),
        }
    }
}

/// Which traversal a consumer wants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraversalOrder {
    #[default]
    DepthFirst,
    WidthFirst,
}

/// One traversal tuple from a single tree, depth relative to the tree's root
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthEvent {
    pub depth: usize,
    pub event: EventKind,
    pub function_id: usize,
    pub data: Measurement,
}

/// One traversal tuple from a sequence of trees
///
/// `width` is the root index for depth-first traversal and a per-depth node
/// ordinal for width-first traversal. Treat it as a layout hint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WidthDepthEvent {
    pub width: usize,
    pub depth: usize,
    pub event: EventKind,
    pub function_id: usize,
    pub data: Measurement,
}

impl WidthDepthEvent {
    pub fn new(width: usize, depth: usize, event: EventKind, function_id: usize, data: Measurement) -> Self {
        Self {
            width,
            depth,
            event,
            function_id,
            data,
        }
    }

    fn tagged(width: usize, event: DepthEvent) -> Self {
        Self::new(width, event.depth, event.event, event.function_id, event.data)
    }
}
