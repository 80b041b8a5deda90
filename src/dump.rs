//! Plain-text dumps of a session's call tree and function table

use crate::call_tree::{CallSequence, EventKind, TraversalOrder};
use crate::error::Result;
use crate::function_encoder::FunctionEncoder;
use crate::measurement::Measurement;
use crate::session::MemTrace;
use std::io::Write;

const BANNER_WIDTH: usize = 75;

/// Center `title` in a line of `fill` characters
fn banner(title: &str, fill: char) -> String {
    let len = title.chars().count();
    if len >= BANNER_WIDTH {
        return title.to_string();
    }
    let pad = BANNER_WIDTH - len;
    let left = pad / 2;
    let right = pad - left;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        title,
        fill.to_string().repeat(right)
    )
}

/// Write one line per traversal tuple, returning the number of lines
///
/// Each line shows the width coordinate, indentation by depth, `>` for a call
/// or `<` for a return, the measurement relative to `baseline`, the change
/// since the previous line and the function's declaration.
pub fn dump_sequence<W: Write>(
    w: &mut W,
    sequence: &CallSequence,
    order: TraversalOrder,
    baseline: Measurement,
    encoder: &FunctionEncoder,
) -> Result<usize> {
    writeln!(w, "{}", banner(" DUMP of call sequence ", '='))?;
    let mut previous = Measurement::default();
    let mut count = 0;
    for event in sequence.events(order) {
        let location = encoder.decode(event.function_id)?;
        let relative = event.data - baseline;
        let marker = match event.event {
            EventKind::Call => '>',
            EventKind::Return => '<',
        };
        writeln!(
            w,
            "{:4} {}{} {:28} {:28} {:32} {}#{}",
            event.width,
            "  ".repeat(event.depth),
            marker,
            relative.to_string(),
            (relative - previous).to_string(),
            location.function,
            location.filename,
            location.lineno,
        )?;
        previous = relative;
        count += 1;
    }
    writeln!(
        w,
        "{}",
        banner(&format!(" DUMP of call sequence ENDS [{}] ", count), '=')
    )?;
    Ok(count)
}

/// Write every encoded function in id order
pub fn dump_encoder<W: Write>(w: &mut W, encoder: &FunctionEncoder) -> Result<()> {
    writeln!(
        w,
        "{}",
        banner(&format!(" DUMP of function encoder [{}] ", encoder.len()), '=')
    )?;
    for (id, location) in encoder.iter() {
        writeln!(
            w,
            "{:4} {:32} {}#{}",
            id, location.function, location.filename, location.lineno
        )?;
    }
    writeln!(w, "{}", banner(" DUMP of function encoder ENDS ", '='))?;
    Ok(())
}

/// Write the end-of-session summary
pub fn dump_summary<W: Write>(w: &mut W, session: &MemTrace) -> Result<()> {
    let sequence = session.function_tree_seq();
    let kept = sequence.function_count();
    let filtered = sequence.filtered_function_count();
    let counter = session.event_counter();

    writeln!(w, "memtrace functions total: {:10}", kept + filtered)?;
    writeln!(w, "   memtrace filtered out: {:10}", filtered)?;
    writeln!(w, " memtrace functions kept: {:10}", kept)?;
    writeln!(w, "   memtrace total events: {:10}", session.eventno())?;
    writeln!(
        w,
        "    memtrace event count: calls={} returns={} skipped={}",
        counter.calls, counter.returns, counter.skipped
    )?;
    if let (Some(min), Some(max)) = (session.data_min(), session.data_max()) {
        writeln!(w, "       memtrace data_min: {}", min)?;
        writeln!(w, "       memtrace data_max: {}", max)?;
        writeln!(w, "              Difference: {}", max - min)?;
    }
    writeln!(w, "   memtrace data_initial: {}", session.data_initial())?;
    if let Some(data_final) = session.data_final() {
        writeln!(w, "     memtrace data_final: {}", data_final)?;
        writeln!(w, "              Difference: {}", data_final - session.data_initial())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CallSequence, FunctionEncoder) {
        let mut encoder = FunctionEncoder::new();
        let main = encoder.encode("/a.py", "main", 1).unwrap();
        let helper = encoder.encode("/a.py", "helper", 9).unwrap();
        let mut seq = CallSequence::new();
        seq.add_call_return_event(EventKind::Call, main, Measurement::new(10.0, 1024))
            .unwrap();
        seq.add_call_return_event(EventKind::Call, helper, Measurement::new(10.5, 2048))
            .unwrap();
        seq.add_call_return_event(EventKind::Return, helper, Measurement::new(11.0, 4096))
            .unwrap();
        seq.add_call_return_event(EventKind::Return, main, Measurement::new(12.0, 2048))
            .unwrap();
        (seq, encoder)
    }

    #[test]
    fn test_banner_is_centered() {
        let line = banner(" X ", '=');
        assert_eq!(line.len(), BANNER_WIDTH);
        assert!(line.starts_with("====="));
        assert!(line.contains(" X "));
    }

    #[test]
    fn test_dump_sequence_lines() {
        let (seq, encoder) = sample();
        let mut out = Vec::new();
        let count = dump_sequence(
            &mut out,
            &seq,
            TraversalOrder::DepthFirst,
            Measurement::new(10.0, 1024),
            &encoder,
        )
        .unwrap();
        assert_eq!(count, 4);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("   0 > 0 (ms) 0 (kb)"));
        assert!(lines[2].starts_with("   0   > 500 (ms) 1 (kb)"));
        assert!(lines[2].contains("helper"));
        assert!(lines[3].contains("/a.py#9"));
        assert!(lines[4].starts_with("   0 <"));
        assert!(lines[5].contains("ENDS [4]"));
    }

    #[test]
    fn test_dump_sequence_unknown_function_fails() {
        let (seq, _) = sample();
        let mut out = Vec::new();
        let err = dump_sequence(
            &mut out,
            &seq,
            TraversalOrder::WidthFirst,
            Measurement::default(),
            &FunctionEncoder::new(),
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::MemTraceError::UnknownIdentifier(0)));
    }

    #[test]
    fn test_dump_summary() {
        use crate::session::SessionConfig;

        let mut session = MemTrace::new(SessionConfig::default(), Measurement::new(0.0, 0));
        session
            .record("/a.py", "main", 1, EventKind::Call, Measurement::new(1.0, 1024))
            .unwrap();
        session
            .record("/a.py", "main", 1, EventKind::Return, Measurement::new(2.0, 3072))
            .unwrap();
        session.finalise(Measurement::new(3.0, 4096)).unwrap();

        let mut out = Vec::new();
        dump_summary(&mut out, &session).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("memtrace functions kept:          1"));
        assert!(text.contains("memtrace total events:          2"));
        assert!(text.contains("Difference: 1,000 (ms) 2 (kb)"));
        assert!(text.contains("data_final: 3,000 (ms) 4 (kb)"));
    }

    #[test]
    fn test_dump_encoder() {
        let (_, encoder) = sample();
        let mut out = Vec::new();
        dump_encoder(&mut out, &encoder).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[2]"));
        assert!(text.contains("   0 main"));
        assert!(text.contains("   1 helper"));
        assert!(text.contains("/a.py#9"));
    }
}
