//! Error taxonomy for call-tree reconstruction
//!
//! `SequenceError` and `IdentityMismatch` mean the event stream is malformed.
//! The tree that raised them must not receive further events.

use thiserror::Error;

/// Errors raised while encoding functions or rebuilding call trees
#[derive(Error, Debug)]
pub enum MemTraceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Call/return sequence error: {0}")]
    SequenceError(String),

    #[error("Returning from open function {expected} but given ID of {found}")]
    IdentityMismatch { expected: usize, found: usize },

    #[error("Unknown function identifier: {0}")]
    UnknownIdentifier(usize),

    #[error("{0}.max_depth() on empty tree")]
    EmptyTree(&'static str),

    #[error("Event log line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for memtrace operations
pub type Result<T> = std::result::Result<T, MemTraceError>;
