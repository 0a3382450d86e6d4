use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::info;

use leakwatch::data::duration::parse_duration;
use leakwatch::{logging, App, DataSource, FileSource, Settings, StreamSource};
use leakwatch_sdk::{LeakMonitor, Output};

#[derive(Parser, Debug)]
#[command(name = "leakwatch", version)]
#[command(about = "Track compressed-air leaks from gateway readings and keep leak records in sync")]
struct Args {
    /// Path to a JSON file of gateway readings
    #[arg(short, long, default_value = "readings.json", conflicts_with_all = ["connect"])]
    file: PathBuf,

    /// Connect to a gateway TCP endpoint for live readings (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "once"])]
    connect: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Document store: "memory" or "rest"
    #[arg(long)]
    store: Option<String>,

    /// Base URL of the hosted document API (rest store)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the document API
    #[arg(long, env = "LEAKWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Collection holding leak records
    #[arg(long)]
    collection: Option<String>,

    /// Poll interval (e.g., "1s", "500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Minimum leak duration before a record is written (e.g., "5m")
    #[arg(long)]
    moderate: Option<String>,

    /// Duration at which a leak becomes critical (e.g., "10m")
    #[arg(long)]
    critical: Option<String>,

    /// Duration at which a leak becomes severe (e.g., "15m")
    #[arg(long)]
    severe: Option<String>,

    /// Append lifecycle events to this JSON-lines file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Log format: "human" or "json"
    #[arg(long)]
    log_format: Option<String>,

    /// Process a single poll and exit
    #[arg(long)]
    once: bool,

    /// Write a JSON leak report to this file before exiting
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Layer command-line overrides on top of file and environment settings.
    fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(kind) = &self.store {
            settings.store.kind = kind.parse()?;
        }
        if let Some(endpoint) = &self.endpoint {
            settings.store.endpoint = endpoint.clone();
        }
        if let Some(token) = &self.token {
            settings.store.token = Some(token.clone());
        }
        if let Some(collection) = &self.collection {
            settings.store.collection = collection.clone();
        }
        if let Some(interval) = &self.interval {
            settings.monitor.poll_interval = parse_duration(interval)?;
        }
        if let Some(events) = &self.events {
            settings.monitor.events = Some(events.clone());
        }
        if let Some(moderate) = &self.moderate {
            settings.policy.moderate_after = parse_duration(moderate)?;
        }
        if let Some(critical) = &self.critical {
            settings.policy.critical_after = parse_duration(critical)?;
        }
        if let Some(severe) = &self.severe {
            settings.policy.severe_after = parse_duration(severe)?;
        }
        if let Some(format) = &self.log_format {
            settings.log.format = format.parse()?;
        }
        settings.monitor.validate()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings)?;
    logging::init(&settings.log.level, settings.log.format)?;

    let sync = settings.synchronizer()?;
    info!(
        "Syncing leaks to {:?} store, collection {:?}",
        settings.store.kind,
        sync.collection()
    );

    let mut monitor = LeakMonitor::builder(Arc::new(sync));
    if let Some(path) = &settings.monitor.events {
        monitor = monitor.output(Output::file(path));
    }

    let source = open_source(&args).await?;
    let mut app = App::new(source, monitor.build());
    info!("Reading from {}", app.source_description());

    if args.once {
        app.tick().await;
    } else {
        run(&mut app, settings.monitor.poll_interval).await?;
    }

    let totals = app.totals;
    info!(
        "Processed {} readings in {} polls: {} created, {} resolved, {} failed",
        totals.readings, totals.ticks, totals.created, totals.resolved, totals.failed
    );

    if let Some(path) = &args.export {
        let report = app.report().await?;
        report
            .write_to(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Exported leak report to: {}", path.display());
    }

    Ok(())
}

/// Open the reading source selected on the command line.
async fn open_source(args: &Args) -> Result<Box<dyn DataSource>> {
    match &args.connect {
        Some(addr) => {
            let stream = tokio::net::TcpStream::connect(addr)
                .await
                .with_context(|| format!("Failed to connect to {}", addr))?;
            Ok(Box::new(StreamSource::spawn(stream, addr)))
        }
        None => Ok(Box::new(FileSource::new(&args.file))),
    }
}

/// Poll until Ctrl-C.
async fn run(app: &mut App, interval: Duration) -> Result<()> {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                app.tick().await;
            }
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
