//! Output formatters for records and summaries.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::marks::MagnitudeTier;
use crate::models::EventRecord;
use crate::stats::{HistogramBucket, Summary};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Magnitude tiers, matching the map marks
const RED: &str = "\x1b[91m";
const ORANGE: &str = "\x1b[38;5;208m";
const CYAN: &str = "\x1b[96m";

/// Width of the longest histogram bar.
const BAR_WIDTH: usize = 30;

/// Placeholder for a missing value.
const MISSING: &str = "—";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Get the color code for a magnitude value.
fn magnitude_color(mag: Option<f64>) -> &'static str {
    match MagnitudeTier::for_magnitude(mag) {
        MagnitudeTier::Major => RED,
        MagnitudeTier::Moderate => ORANGE,
        MagnitudeTier::Minor => CYAN,
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| MISSING.into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn format_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| MISSING.into(), |v| format!("{v:.decimals$}"))
}

fn json_error(e: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Write events in human-readable format, one line each.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, events: &[EventRecord]) -> io::Result<()> {
    for event in events {
        let color = magnitude_color(event.mag);
        let mag = format_opt(event.mag, 1);
        let depth = format_opt(event.depth, 0);
        let time = format_time(event.time_utc());
        let place = if event.place.is_empty() {
            MISSING
        } else {
            event.place.as_str()
        };

        writeln!(
            writer,
            "{color}{BOLD}M{mag:>4}{RESET} │ \
             {DIM}{depth:>5}km{RESET} │ \
             {time} │ \
             {place}"
        )?;
    }
    Ok(())
}

/// Write events as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[EventRecord]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(events).map_err(json_error)?;
    writeln!(writer, "{json}")
}

/// Write events as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[EventRecord]) -> io::Result<()> {
    for event in events {
        let json = serde_json::to_string(event).map_err(json_error)?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(
    writer: &mut W,
    events: &[EventRecord],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, events),
        Format::Json => write_json(writer, events),
        Format::Ndjson => write_ndjson(writer, events),
    }
}

/// Summary plus both histograms.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub summary: Summary,
    pub magnitude_bins: &'a [HistogramBucket],
    pub depth_bins: &'a [HistogramBucket],
}

fn write_bars<W: Write>(writer: &mut W, title: &str, bins: &[HistogramBucket]) -> io::Result<()> {
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    writeln!(writer, "{BOLD}{title}{RESET}")?;
    for bin in bins {
        let filled = bin.count * BAR_WIDTH / max;
        let bar = "█".repeat(filled);
        writeln!(
            writer,
            "  {:<7} {CYAN}{bar:<width$}{RESET} {:>6}",
            bin.label,
            bin.count,
            width = BAR_WIDTH
        )?;
    }
    Ok(())
}

/// Write a report in the specified format. NDJSON is a single line.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &Report<'_>,
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(report).map_err(json_error)?;
            writeln!(writer, "{json}")
        }
        Format::Ndjson => {
            let json = serde_json::to_string(report).map_err(json_error)?;
            writeln!(writer, "{json}")
        }
        Format::Human => {
            let s = &report.summary;
            let latest = format_time(s.latest_time.and_then(DateTime::from_timestamp_millis));

            writeln!(writer, "{BOLD}Events:{RESET}        {}", s.count)?;
            writeln!(
                writer,
                "{BOLD}Max magnitude:{RESET} {}",
                format_opt(s.max_magnitude, 1)
            )?;
            writeln!(
                writer,
                "{BOLD}Mean depth:{RESET}    {} km",
                format_opt(s.mean_depth, 1)
            )?;
            writeln!(writer, "{BOLD}Latest event:{RESET}  {latest}")?;
            writeln!(writer)?;
            write_bars(writer, "Magnitude distribution", report.magnitude_bins)?;
            writeln!(writer)?;
            write_bars(writer, "Depth distribution (km)", report.depth_bins)
        }
    }
}
