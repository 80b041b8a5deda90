#![no_main]

use libfuzzer_sys::fuzz_target;
use memtrace::event_log::{replay, EventLogReader};
use memtrace::measurement::Measurement;
use memtrace::session::{MemTrace, SessionConfig};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the reader or the tree builder
    let mut session = MemTrace::new(SessionConfig::default(), Measurement::default());
    let _ = replay(&mut session, EventLogReader::new(data));
    assert!(session.function_tree_seq().integrity());
});
