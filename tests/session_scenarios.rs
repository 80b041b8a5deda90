// Profiling sessions driven through the public API

use memtrace::call_tree::{EventKind, TraversalOrder};
use memtrace::event_log::{replay, write_event_log, EventLogReader, EventRecord};
use memtrace::{MemTrace, MemTraceError, Measurement, RetentionFilter, SessionConfig};
use tempfile::TempDir;

fn m(time: f64, memory: i64) -> Measurement {
    Measurement::new(time, memory)
}

fn session(filter: Option<RetentionFilter>) -> MemTrace {
    MemTrace::new(SessionConfig::default().with_filter(filter), m(0.0, 0))
}

#[test]
fn test_nested_calls_share_encoded_ids() {
    let mut trace = session(None);
    let main = trace
        .add_data_point("/app/main.py", "main", 1, EventKind::Call, m(0.0, 1024))
        .unwrap();
    let first = trace
        .add_data_point("/app/util.py", "load", 4, EventKind::Call, m(0.1, 1024))
        .unwrap();
    trace
        .add_data_point("/app/util.py", "load", 4, EventKind::Return, m(0.2, 2048))
        .unwrap();
    let second = trace
        .add_data_point("/app/util.py", "load", 4, EventKind::Call, m(0.3, 2048))
        .unwrap();
    trace
        .add_data_point("/app/util.py", "load", 4, EventKind::Return, m(0.4, 4096))
        .unwrap();
    trace
        .add_data_point("/app/main.py", "main", 1, EventKind::Return, m(0.5, 4096))
        .unwrap();
    trace.finalise(m(0.6, 4096)).unwrap();

    assert_eq!(main, 0);
    assert_eq!(first, 1);
    assert_eq!(first, second);
    assert_eq!(trace.function_encoder().len(), 2);

    let seq = trace.function_tree_seq();
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.max_depth().unwrap(), 2);
    assert_eq!(seq.max_width(), 2);

    let widths: Vec<_> = seq
        .gen_width_first()
        .map(|e| (e.width, e.depth, e.event))
        .collect();
    assert_eq!(
        widths,
        [
            (0, 0, EventKind::Call),
            (0, 0, EventKind::Return),
            (0, 1, EventKind::Call),
            (0, 1, EventKind::Return),
            (1, 1, EventKind::Call),
            (1, 1, EventKind::Return),
        ]
    );
}

#[test]
fn test_rejected_only_root_leaves_nothing() {
    let mut trace = session(RetentionFilter::from_thresholds(100, 0).unwrap());
    trace
        .add_data_point("/a.py", "quick", 1, EventKind::Call, m(0.0, 0))
        .unwrap();
    trace
        .add_data_point("/a.py", "quick", 1, EventKind::Return, m(0.05, 0))
        .unwrap();

    let seq = trace.function_tree_seq();
    assert!(seq.is_empty());
    assert_eq!(seq.filtered_function_count(), 1);
    assert_eq!(seq.events(TraversalOrder::DepthFirst).count(), 0);
    assert_eq!(seq.events(TraversalOrder::WidthFirst).count(), 0);
    assert!(matches!(seq.max_depth(), Err(MemTraceError::EmptyTree(_))));
    assert_eq!(seq.max_width(), 0);
    // The function was still encoded even though its invocation was dropped
    assert_eq!(trace.decode_function_id(0).unwrap().function, "quick");
}

#[test]
fn test_memory_filter_keeps_shrinking_calls() {
    let mut trace = session(RetentionFilter::from_thresholds(-1, 1).unwrap());
    trace
        .add_data_point("/a.py", "free", 1, EventKind::Call, m(0.0, 8192))
        .unwrap();
    trace
        .add_data_point("/a.py", "free", 1, EventKind::Return, m(0.0, 0))
        .unwrap();
    trace
        .add_data_point("/a.py", "noop", 9, EventKind::Call, m(0.0, 0))
        .unwrap();
    trace
        .add_data_point("/a.py", "noop", 9, EventKind::Return, m(0.0, 512))
        .unwrap();

    let seq = trace.function_tree_seq();
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.roots()[0].function_id(), 0);
    assert_eq!(seq.filtered_function_count(), 1);
}

#[test]
fn test_record_after_finalise_fails() {
    let mut trace = session(None);
    trace.finalise(m(1.0, 0)).unwrap();
    let err = trace
        .record("/a.py", "late", 1, EventKind::Call, m(2.0, 0))
        .unwrap_err();
    assert!(matches!(err, MemTraceError::SequenceError(_)));
}

#[test]
fn test_event_log_file_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    let records = vec![
        EventRecord::new(EventKind::Call, "/a.py", "main", 1, m(0.0, 0)),
        EventRecord::new(EventKind::Call, "/a.py", "work", 5, m(0.1, 0)),
        EventRecord::new(EventKind::Return, "/a.py", "work", 5, m(0.4, 4096)),
        EventRecord::new(EventKind::Return, "/a.py", "main", 1, m(0.5, 4096)),
    ];
    write_event_log(std::fs::File::create(&path).unwrap(), &records).unwrap();

    let mut trace = session(None);
    let count = replay(&mut trace, EventLogReader::open(&path).unwrap()).unwrap();
    assert_eq!(count, 4);
    trace.finalise(m(0.5, 4096)).unwrap();

    assert_eq!(trace.event_counter().calls, 2);
    assert_eq!(trace.event_counter().returns, 2);
    assert_eq!(trace.data_max(), Some(m(0.5, 4096)));
    assert_eq!(trace.data_min(), Some(m(0.0, 0)));
    assert_eq!(trace.function_tree_seq().function_count(), 2);
}
