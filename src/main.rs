use anyhow::{Context, Result};
use clap::Parser;
use memtrace::call_tree::TraversalOrder;
use memtrace::cli::{Cli, OutputFormat};
use memtrace::csv_output::{function_stats_csv, CsvOutput};
use memtrace::dump::{dump_encoder, dump_sequence, dump_summary};
use memtrace::event_log::{replay, EventLogReader};
use memtrace::function_profiler::FunctionProfiler;
use memtrace::json_output::JsonReport;
use memtrace::measurement::Measurement;
use memtrace::retention::RetentionFilter;
use memtrace::session::{MemTrace, SessionConfig};
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Replay the event log into a finalised session
fn build_session(args: &Cli) -> Result<MemTrace> {
    let filter = RetentionFilter::from_thresholds(args.filter_min_time, args.filter_min_memory)?;
    let config = SessionConfig::default()
        .with_filter(filter)
        .skip_synthetic_frames(!args.keep_synthetic);

    let mut records = EventLogReader::open(&args.event_log)
        .with_context(|| format!("Cannot open event log {}", args.event_log.display()))?
        .peekable();

    // The first record stands in for the measurement taken at session start
    let data_initial = match records.peek() {
        Some(Ok(record)) => record.measurement(),
        _ => Measurement::default(),
    };
    let mut data_final = data_initial;

    let mut session = MemTrace::new(config, data_initial);
    let count = replay(
        &mut session,
        records.inspect(|record| {
            if let Ok(record) = record {
                data_final = record.measurement();
            }
        }),
    )
    .with_context(|| format!("Failed to replay {}", args.event_log.display()))?;
    tracing::debug!(records = count, "event log replayed");

    session
        .finalise(data_final)
        .context("Event log ends inside an open function")?;
    Ok(session)
}

fn write_text<W: Write>(out: &mut W, session: &MemTrace, args: &Cli) -> Result<()> {
    dump_summary(out, session)?;
    if args.dump {
        dump_sequence(
            out,
            session.function_tree_seq(),
            args.order.into(),
            session.data_min().unwrap_or_default(),
            session.function_encoder(),
        )?;
        dump_encoder(out, session.function_encoder())?;
    }
    writeln!(out)?;
    FunctionProfiler::from_sequence(session.function_tree_seq())
        .write_summary(out, session.function_encoder())?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let session = build_session(&args)?;
    let order: TraversalOrder = args.order.into();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => write_text(&mut out, &session, &args)?,
        OutputFormat::Json => {
            let report = JsonReport::from_session(&session, order);
            writeln!(out, "{}", report.to_json()?)?;
        }
        OutputFormat::Csv if args.csv_stats => {
            let profiler = FunctionProfiler::from_sequence(session.function_tree_seq());
            write!(
                out,
                "{}",
                function_stats_csv(&profiler, session.function_encoder())
            )?;
        }
        OutputFormat::Csv => {
            let csv = CsvOutput::from_sequence(
                session.function_tree_seq(),
                order,
                session.function_encoder(),
                args.csv_source,
            )?;
            write!(out, "{}", csv.to_csv())?;
        }
    }
    out.flush()?;
    Ok(())
}
