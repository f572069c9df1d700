//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::client::FeedRange;
use crate::filters::{DEFAULT_MAX_DEPTH, DEFAULT_MIN_DEPTH, DEFAULT_MIN_MAGNITUDE, EventFilter};
use crate::output::Format;

/// Explore recent earthquakes from the USGS feeds.
#[derive(Parser, Debug)]
#[command(name = "quakescope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print summary statistics and distributions for a feed
    Summary(SummaryArgs),

    /// List the events that pass the filters
    List(ListArgs),

    /// Run the HTTP session server for a map front end
    Serve(ServeArgs),
}

/// Where the records come from and which ones to keep.
#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Time window to fetch
    #[arg(long, short = 'r', default_value = "day", value_parser = parse_range)]
    pub range: FeedRange,

    /// Read a GeoJSON feed from a file instead of fetching
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Minimum magnitude to keep
    #[arg(long, default_value_t = DEFAULT_MIN_MAGNITUDE)]
    pub min_magnitude: f64,

    /// Shallowest depth in km to keep
    #[arg(long, default_value_t = DEFAULT_MIN_DEPTH)]
    pub min_depth: f64,

    /// Deepest depth in km to keep
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: f64,
}

impl FeedArgs {
    /// Filter built from the flags.
    #[must_use]
    pub fn filter(&self) -> EventFilter {
        EventFilter {
            min_magnitude: self.min_magnitude,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
        }
    }
}

/// Arguments for the `summary` command.
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Time window loaded at startup
    #[arg(long, short = 'r', default_value = "day", value_parser = parse_range)]
    pub range: FeedRange,

    /// Initial minimum magnitude
    #[arg(long, default_value_t = DEFAULT_MIN_MAGNITUDE)]
    pub min_magnitude: f64,
}

/// Parse a feed range from string.
fn parse_range(s: &str) -> Result<FeedRange, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
