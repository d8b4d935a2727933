//! BuildNotify - posts a build notification to a configured room.
//!
//! Dispatch mode always exits successfully so that a notification problem
//! cannot fail the calling build. `--check` exits non-zero when the room
//! configuration has errors.

use anyhow::Result;
use buildnotify::{
    activity::{ActivityEntry, WriterSink},
    cli::Cli,
    config::Config,
    core::{ActivitySink, Publisher},
    dispatcher::error_trace,
    publisher::{HttpPublisher, LoggingPublisher},
    tokens::discover_providers,
    validation::validate_rooms,
    NotificationDispatcher, RoomRegistry,
};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            init_logging("info");
            error!("Failed to load configuration: {:#}", err);
            return if cli.check { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    init_logging(&config.log_level);

    if cli.check {
        return check(&config);
    }

    let sink = WriterSink::new(std::io::stdout());
    if let Err(err) = run(&cli, &config, &sink).await {
        error!("Notification not sent: {:#}", err);
        record_setup_failure(&cli, &sink, &err);
    }
    ExitCode::SUCCESS
}

/// Writes the activity markers for a run that failed before dispatch began.
fn record_setup_failure(cli: &Cli, sink: &dyn ActivitySink, err: &anyhow::Error) {
    if cli.disabled {
        sink.record(ActivityEntry::Skipped);
        return;
    }
    sink.record(ActivityEntry::Start);
    sink.record(ActivityEntry::Error {
        message: err.to_string(),
        trace: error_trace(&**err),
    });
    sink.record(ActivityEntry::Finished { success: false });
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn check(config: &Config) -> ExitCode {
    let findings = validate_rooms(&config.rooms);
    for finding in &findings {
        if finding.result.is_error() {
            error!("{}", finding);
        } else {
            warn!("{}", finding);
        }
    }
    info!("Checked {} rooms, {} findings", config.rooms.len(), findings.len());

    if findings.iter().any(|f| f.result.is_error()) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(cli: &Cli, config: &Config, sink: &dyn ActivitySink) -> Result<()> {
    let context = cli.build_context()?;

    let registry = Arc::new(RoomRegistry::init(config.rooms()));
    info!("Loaded {} rooms", registry.len());

    let publisher: Arc<dyn Publisher> = if cli.dry_run {
        Arc::new(LoggingPublisher)
    } else {
        Arc::new(HttpPublisher::new(&config.publisher)?)
    };

    let dispatcher = NotificationDispatcher::new(registry, discover_providers(config), publisher);
    dispatcher.dispatch(&cli.request(), &context, sink).await;

    Ok(())
}
