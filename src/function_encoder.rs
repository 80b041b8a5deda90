//! Compact integer identities for function locations
//!
//! Every call event names its function by `(file, function, declaration line)`.
//! Storing that triple on every node is wasteful, so the encoder hands out a
//! dense integer per distinct triple and keeps the reverse mapping for reports.

use crate::error::{MemTraceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a function is declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionLocation {
    /// Absolute file path
    pub filename: String,
    /// Unqualified function name
    pub function: String,
    /// First line of the function declaration (not the call site)
    pub lineno: u32,
}

impl FunctionLocation {
    pub fn new(filename: impl Into<String>, function: impl Into<String>, lineno: u32) -> Self {
        Self {
            filename: filename.into(),
            function: function.into(),
            lineno,
        }
    }
}

impl fmt::Display for FunctionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}() {}#{}", self.function, self.filename, self.lineno)
    }
}

/// Bidirectional mapping between function locations and dense ids
///
/// Ids start at 0 and are assigned in first-seen order. The encoder only
/// grows; nothing is ever removed during a session.
#[derive(Debug, Default, Clone)]
pub struct FunctionEncoder {
    id_lookup: HashMap<FunctionLocation, usize>,
    id_rev_lookup: Vec<FunctionLocation>,
}

impl FunctionEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct functions seen
    pub fn len(&self) -> usize {
        self.id_lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_lookup.is_empty()
    }

    /// Encode a function location, assigning the next id if it is new
    ///
    /// `lineno` must be the declaration line and must be >= 1.
    pub fn encode(&mut self, file_path: &str, function_name: &str, lineno: u32) -> Result<usize> {
        if lineno < 1 {
            return Err(MemTraceError::InvalidInput(format!(
                "FunctionEncoder.encode(): line number must be >=1 not {}",
                lineno
            )));
        }
        let location = FunctionLocation::new(file_path, function_name, lineno);
        if let Some(&id) = self.id_lookup.get(&location) {
            return Ok(id);
        }

        let id = self.id_rev_lookup.len();
        self.id_lookup.insert(location.clone(), id);
        self.id_rev_lookup.push(location);
        Ok(id)
    }

    /// Decode an id back to its function location
    pub fn decode(&self, function_id: usize) -> Result<&FunctionLocation> {
        self.id_rev_lookup
            .get(function_id)
            .ok_or(MemTraceError::UnknownIdentifier(function_id))
    }

    /// All `(id, location)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FunctionLocation)> {
        self.id_rev_lookup.iter().enumerate()
    }

    /// Checks that the forward and reverse maps mirror each other exactly
    pub fn integrity(&self) -> bool {
        if self.id_lookup.len() != self.id_rev_lookup.len() {
            return false;
        }
        self.id_lookup.iter().all(|(location, &id)| {
            self.id_rev_lookup
                .get(id)
                .is_some_and(|reverse| reverse == location)
        })
    }
}
