//! Quakescope - explore recent earthquakes.
//!
//! Loads a USGS summary feed, filters it, derives summary statistics and
//! histograms, and tracks what a map front end has selected, hovered and
//! focused. Rendering is left to the front end.

pub mod app;
pub mod cli;
pub mod client;
pub mod errors;
pub mod feed;
pub mod filters;
pub mod marks;
pub mod models;
pub mod output;
pub mod selection;
pub mod server;
pub mod stats;
pub mod viewport;
