//! Quakescope - explore recent earthquakes from your terminal or a map.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use quakescope::cli::{self, Cli, Command};
use quakescope::client::UsgsClient;
use quakescope::feed;
use quakescope::filters::EventFilter;
use quakescope::models::EventRecord;
use quakescope::output::{self, Report};
use quakescope::server;
use quakescope::stats::{self, BucketSchema};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Summary(args) => cmd_summary(&args),
        Command::List(args) => cmd_list(&args),
        Command::Serve(args) => cmd_serve(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Read the feed from `--input` or fetch it, then apply the filters.
fn load_filtered(args: &cli::FeedArgs) -> Result<Vec<EventRecord>> {
    let records = if let Some(path) = &args.input {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        feed::parse(&body).context("failed to parse earthquake feed")?
    } else {
        let client = UsgsClient::new().context("failed to create USGS client")?;
        tokio::runtime::Runtime::new()
            .context("failed to create tokio runtime")?
            .block_on(client.fetch_feed(args.range))
            .context("failed to fetch earthquake feed")?
    };

    let filter = args.filter();
    let active = filter.apply(&records);
    let source = match &args.input {
        Some(path) => path.display().to_string(),
        None => format!("{} feed", args.range.as_str()),
    };
    info!(
        "{} of {} events pass the filters ({source})",
        active.len(),
        records.len()
    );
    Ok(active)
}

/// Execute the `summary` command - statistics and distributions.
fn cmd_summary(args: &cli::SummaryArgs) -> Result<()> {
    let events = load_filtered(&args.feed)?;

    let magnitude_bins = stats::bucketize(&events, BucketSchema::Magnitude);
    let depth_bins = stats::bucketize(&events, BucketSchema::Depth);
    let report = Report {
        summary: stats::summarize(&events),
        magnitude_bins: &magnitude_bins,
        depth_bins: &depth_bins,
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_report(&mut handle, &report, args.format)?;
    Ok(())
}

/// Execute the `list` command - filtered events, newest first.
fn cmd_list(args: &cli::ListArgs) -> Result<()> {
    let mut events = load_filtered(&args.feed)?;

    // Sort by time descending; undated events go last
    events.sort_by(|a, b| b.time.cmp(&a.time));
    events.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &events, args.format)?;
    Ok(())
}

/// Execute the `serve` command - HTTP session server.
fn cmd_serve(args: cli::ServeArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host,
        range: args.range,
        filter: EventFilter {
            min_magnitude: args.min_magnitude,
            ..Default::default()
        },
    };

    let url = format!("http://{}:{}", config.host, config.port);
    println!("\x1b[1m🌍 Quakescope\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  API:     \x1b[96m{url}/api/state\x1b[0m");
    println!("  Stream:  {url}/stream");
    println!("  Range:   {}", config.range.as_str());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}
