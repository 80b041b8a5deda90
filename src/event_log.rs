//! JSON-lines event logs
//!
//! An event log is one JSON object per line, recorded by an external hook:
//!
//! ```text
//! {"event":"call","file":"/app/main.py","function":"main","line":3,"time":0.5,"memory":1048576}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::call_tree::EventKind;
use crate::error::{MemTraceError, Result};
use crate::measurement::Measurement;
use crate::session::MemTrace;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::Path;

/// One recorded call or return observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// `"call"` or `"return"`
    pub event: String,
    pub file: String,
    pub function: String,
    /// Declaration line of the function
    pub line: u32,
    /// Wall clock seconds
    pub time: f64,
    /// Resident bytes
    pub memory: i64,
}

impl EventRecord {
    pub fn new(
        event: EventKind,
        file: impl Into<String>,
        function: impl Into<String>,
        line: u32,
        data: Measurement,
    ) -> Self {
        Self {
            event: event.as_str().to_string(),
            file: file.into(),
            function: function.into(),
            line,
            time: data.time,
            memory: data.memory,
        }
    }

    /// Event kind, `InvalidInput` for anything but call/return
    pub fn kind(&self) -> Result<EventKind> {
        self.event.parse()
    }

    pub fn measurement(&self) -> Measurement {
        Measurement::new(self.time, self.memory)
    }
}

/// Parse one line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str, lineno: usize) -> Result<Option<EventRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| MemTraceError::Parse {
            line: lineno,
            source,
        })
}

/// Streaming reader yielding one record per non-blank line
pub struct EventLogReader<R> {
    lines: Lines<R>,
    lineno: usize,
}

impl<R: BufRead> EventLogReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            lineno: 0,
        }
    }
}

impl EventLogReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for EventLogReader<R> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.lineno += 1;
            match parse_line(&line, self.lineno) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {
                    tracing::debug!(line = self.lineno, "skipping blank or comment line");
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Write records as JSON lines
pub fn write_event_log<'a, W: Write>(
    mut writer: W,
    records: impl IntoIterator<Item = &'a EventRecord>,
) -> Result<()> {
    for record in records {
        let line = serde_json::to_string(record).map_err(std::io::Error::from)?;
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

/// Feed every record into `session`, returning how many were consumed
///
/// Stops at the first malformed record or out-of-order event.
pub fn replay<I>(session: &mut MemTrace, records: I) -> Result<usize>
where
    I: IntoIterator<Item = Result<EventRecord>>,
{
    let mut count = 0;
    for record in records {
        let record = record?;
        session.record(
            &record.file,
            &record.function,
            record.line,
            record.kind()?,
            record.measurement(),
        )?;
        count += 1;
    }
    Ok(count)
}
