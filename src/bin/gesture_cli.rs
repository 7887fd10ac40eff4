use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use gesture_control::analysis::{GestureEvent, GestureKind, GesturePhase};
use gesture_control::bindings::{Action, GestureBindings};
use gesture_control::config::AppConfig;
use gesture_control::error::ErrorCode;
use gesture_control::fixtures::{ExpectationDiff, FixtureCatalog, ReplayReport, TraceRunner};
use gesture_control::ipc::{encode, WireMessage};
use gesture_control::telemetry::{self, MetricEvent};
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(
    name = "gesture_cli",
    about = "Deterministic pose-trace harness for the gesture engine"
)]
struct Cli {
    /// Override directory containing fixture traces (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and optionally compare against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Config file supplying settings the trace does not embed
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Stream a trace's gestures as wire-protocol lines to stdout
    Stream {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as JSON
    Defaults,
    /// Validate a configuration file
    Check {
        #[arg(long)]
        config: PathBuf,
    },
    /// List available fixtures on disk
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
            config,
        } => run_replay(&catalog, &fixture, expect, output, config.as_deref()),
        Commands::Stream { fixture, config } => run_stream(&catalog, &fixture, config.as_deref()),
        Commands::Defaults => run_defaults(),
        Commands::Check { config } => run_check(&config),
        Commands::List => run_list(&catalog),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::try_load(path),
        None => Ok(AppConfig::default()),
    }
}

fn run_replay(
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let data = catalog.load(fixture, override_expect)?;
    let report = TraceRunner::new(&config)
        .run(&data.trace)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    let scroll_amount = data
        .trace
        .config
        .as_ref()
        .map_or(config.detection.scroll_amount, |detection| detection.scroll_amount);
    emit_report(
        &data.metadata.name,
        &report,
        &config.gestures,
        scroll_amount,
        output_path,
    )?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&report.events) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(
    catalog: &FixtureCatalog,
    fixture: &str,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let data = catalog.load(fixture, None)?;
    let mut metrics = telemetry::hub().subscribe();

    let mut lines = Vec::new();
    TraceRunner::new(&config)
        .run_with(&data.trace, |event| {
            lines.push(encode(&WireMessage::from_event(event)));
        })
        .with_context(|| format!("replaying fixture {}", fixture))?;

    for line in lines {
        print!("{}", line?);
    }

    // A lagged receiver resumes at the oldest retained event.
    let mut rejected = 0u64;
    loop {
        match metrics.try_recv() {
            Ok(MetricEvent::SampleRejected { .. }) => rejected += 1,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    if rejected > 0 {
        info!("[gesture_cli] {} samples rejected while streaming", rejected);
    }

    Ok(ExitCode::from(0))
}

fn run_defaults() -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&AppConfig::default())?);
    Ok(ExitCode::from(0))
}

fn run_check(path: &Path) -> Result<ExitCode> {
    let config = AppConfig::try_load(path)?;
    match config.validate() {
        Ok(()) => {
            println!("{}", serde_json::json!({ "valid": true }));
            Ok(ExitCode::from(0))
        }
        Err(err) => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": false,
                    "code": err.code(),
                    "message": err.message(),
                })
            );
            Ok(ExitCode::from(2))
        }
    }
}

fn run_list(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_report(
    fixture: &str,
    report: &ReplayReport,
    bindings: &GestureBindings,
    scroll_amount: u32,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let actions = report
        .events
        .iter()
        .filter_map(|event| dispatch(bindings, event, scroll_amount))
        .collect::<Vec<_>>();

    let payload = FixtureReportPayload {
        fixture,
        samples_total: report.samples_total,
        samples_dropped: report.samples_dropped,
        hands_demoted: report.hands_demoted,
        event_count: report.events.len(),
        events: &report.events,
        actions,
        telemetry: TelemetrySummary::collect(),
    };
    let json = serde_json::to_string_pretty(&payload)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn dispatch(
    bindings: &GestureBindings,
    event: &GestureEvent,
    scroll_amount: u32,
) -> Option<DispatchedAction> {
    let action = bindings.resolve(event)?;
    Some(DispatchedAction {
        gesture: event.kind,
        phase: event.phase,
        t_ms: event.timestamp_ms,
        action,
        scroll_delta: action.scroll_delta(scroll_amount),
    })
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FixtureReportPayload<'a> {
    fixture: &'a str,
    samples_total: usize,
    samples_dropped: usize,
    hands_demoted: usize,
    event_count: usize,
    #[serde(skip_serializing_if = "slice_empty")]
    events: &'a [GestureEvent],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    actions: Vec<DispatchedAction>,
    telemetry: TelemetrySummary,
}

/// Hub counters accumulated by the replay
#[derive(Serialize)]
struct TelemetrySummary {
    total_events: u64,
    dropped_events: u64,
    gesture_counts: BTreeMap<&'static str, u64>,
}

impl TelemetrySummary {
    fn collect() -> Self {
        let hub = telemetry::hub();
        let snapshot = hub.snapshot();
        Self {
            total_events: snapshot.total_events,
            dropped_events: snapshot.dropped_events,
            gesture_counts: hub
                .gesture_counts()
                .into_iter()
                .map(|(kind, count)| (kind.as_str(), count))
                .collect(),
        }
    }
}

/// Action the host would invoke for one event
#[derive(Serialize)]
struct DispatchedAction {
    gesture: GestureKind,
    phase: GesturePhase,
    t_ms: u64,
    action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    scroll_delta: Option<i64>,
}

fn slice_empty(events: &&[GestureEvent]) -> bool {
    events.is_empty()
}
