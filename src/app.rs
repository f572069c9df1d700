//! Application state and its reducer.
//!
//! [`AppState::apply`] takes the current snapshot and one [`AppEvent`] and
//! returns the next snapshot plus an [`Effect`] for the caller to run. All
//! derived values (active set, summary, histograms) are recomputed wholesale
//! whenever their inputs change, so any snapshot is internally consistent.
//!
//! Loads are applied in the order they complete. A slow earlier request that
//! finishes after a faster later one overwrites it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::FeedRange;
use crate::errors::QuakeError;
use crate::filters::EventFilter;
use crate::models::EventRecord;
use crate::selection::{
    DisplayMode, HoverPreview, Phase, Pick, Selection, SelectionEvent, SelectionState,
};
use crate::stats::{self, BucketSchema, HistogramBucket, Summary};
use crate::viewport::{ViewState, ViewportController};

/// Identifies one issued fetch.
pub type RequestId = u64;

/// Everything that can happen to the explorer.
#[derive(Debug)]
pub enum AppEvent {
    /// User picked another time window; always starts a load
    RangeChanged(FeedRange),
    /// Manual reload of the current window; ignored while loading
    RefreshRequested,
    /// A fetch finished
    LoadCompleted {
        request: RequestId,
        range: FeedRange,
        result: Result<Vec<EventRecord>, QuakeError>,
    },
    FilterChanged(EventFilter),
    ModeChanged(DisplayMode),
    MarkClicked(Option<Pick>),
    MarkHovered { pick: Option<Pick>, x: f64, y: f64 },
    FocusRegion(String),
    ViewStateChanged(ViewState),
    TransitionFinished,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Fetch { request: RequestId, range: FeedRange },
}

/// The explorer's complete state.
#[derive(Debug, Clone)]
pub struct AppState {
    range: FeedRange,
    filter: EventFilter,
    records: Arc<[EventRecord]>,
    records_range: Option<FeedRange>,
    active: Arc<[EventRecord]>,
    summary: Summary,
    magnitude_bins: Vec<HistogramBucket>,
    depth_bins: Vec<HistogramBucket>,
    interaction: SelectionState,
    viewport: ViewportController,
    loading: bool,
    error: Option<String>,
    next_request: RequestId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            range: FeedRange::default(),
            filter: EventFilter::default(),
            records: Arc::from(Vec::new()),
            records_range: None,
            active: Arc::from(Vec::new()),
            summary: Summary::default(),
            magnitude_bins: stats::bucketize(&[], BucketSchema::Magnitude),
            depth_bins: stats::bucketize(&[], BucketSchema::Depth),
            interaction: SelectionState::default(),
            viewport: ViewportController::default(),
            loading: false,
            error: None,
            next_request: 1,
        }
    }
}

impl AppState {
    /// Fresh state for `range`, together with the initial load.
    #[must_use]
    pub fn start(range: FeedRange, filter: EventFilter) -> (Self, Effect) {
        let state = Self {
            filter,
            ..Self::default()
        };
        state.apply(AppEvent::RangeChanged(range))
    }

    /// Compute the state that follows `event`.
    #[must_use]
    pub fn apply(mut self, event: AppEvent) -> (Self, Effect) {
        match event {
            AppEvent::RangeChanged(range) => {
                self.range = range;
                return self.begin_load();
            }
            AppEvent::RefreshRequested => {
                if self.loading {
                    return (self, Effect::None);
                }
                return self.begin_load();
            }
            AppEvent::LoadCompleted {
                request,
                range,
                result,
            } => {
                self.loading = false;
                match result {
                    Ok(records) => {
                        info!(
                            "load #{request} ({}) completed with {} events",
                            range.as_str(),
                            records.len()
                        );
                        self.records = Arc::from(records);
                        self.records_range = Some(range);
                        self.interaction = self.interaction.cleared();
                        self = self.recompute();
                    }
                    Err(e) => {
                        warn!("load #{request} ({}) failed: {e}", range.as_str());
                        self.error = Some(e.to_string());
                    }
                }
            }
            AppEvent::FilterChanged(filter) => {
                self.filter = filter;
                self = self.recompute();
            }
            AppEvent::ModeChanged(mode) => {
                self.interaction = self.interaction.apply(SelectionEvent::ModeChanged(mode));
            }
            AppEvent::MarkClicked(pick) => {
                self.interaction = self.interaction.apply(SelectionEvent::MarkClicked(pick));
            }
            AppEvent::MarkHovered { pick, x, y } => {
                self.interaction = self
                    .interaction
                    .apply(SelectionEvent::MarkHovered { pick, x, y });
            }
            AppEvent::FocusRegion(key) => {
                self.viewport.focus(&key);
            }
            AppEvent::ViewStateChanged(view) => self.viewport.update(view),
            AppEvent::TransitionFinished => self.viewport.finish_transition(),
        }
        (self, Effect::None)
    }

    fn begin_load(mut self) -> (Self, Effect) {
        let request = self.next_request;
        self.next_request += 1;
        self.loading = true;
        self.error = None;
        let range = self.range;
        (self, Effect::Fetch { request, range })
    }

    fn recompute(mut self) -> Self {
        let active = self.filter.apply(&self.records);
        self.summary = stats::summarize(&active);
        self.magnitude_bins = stats::bucketize(&active, BucketSchema::Magnitude);
        self.depth_bins = stats::bucketize(&active, BucketSchema::Depth);
        self.active = Arc::from(active);
        self
    }

    #[must_use]
    pub const fn range(&self) -> FeedRange {
        self.range
    }

    #[must_use]
    pub const fn filter(&self) -> EventFilter {
        self.filter
    }

    /// Everything from the last successful load.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records passing the current filter.
    #[must_use]
    pub fn active(&self) -> &[EventRecord] {
        &self.active
    }

    #[must_use]
    pub const fn summary(&self) -> Summary {
        self.summary
    }

    #[must_use]
    pub const fn mode(&self) -> DisplayMode {
        self.interaction.mode
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.interaction.selection
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.interaction.phase()
    }

    #[must_use]
    pub const fn hover(&self) -> Option<&HoverPreview> {
        self.interaction.hover.as_ref()
    }

    #[must_use]
    pub const fn view(&self) -> ViewState {
        self.viewport.view()
    }

    /// Whether a manual refresh would be accepted.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        !self.loading
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serializable view of the state, without the record lists.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            range: self.range,
            records_range: self.records_range,
            filter: self.filter,
            mode: self.mode(),
            total_records: self.records.len(),
            summary: self.summary,
            magnitude_bins: &self.magnitude_bins,
            depth_bins: &self.depth_bins,
            selection: self.selection(),
            hover: self.hover(),
            view_state: self.view(),
            loading: self.loading,
            error: self.error(),
        }
    }
}

/// JSON shape of [`AppState::snapshot`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub range: FeedRange,
    /// Window the displayed records were loaded for
    pub records_range: Option<FeedRange>,
    pub filter: EventFilter,
    pub mode: DisplayMode,
    pub total_records: usize,
    pub summary: Summary,
    pub magnitude_bins: &'a [HistogramBucket],
    pub depth_bins: &'a [HistogramBucket],
    pub selection: &'a Selection,
    pub hover: Option<&'a HoverPreview>,
    pub view_state: ViewState,
    pub loading: bool,
    pub error: Option<&'a str>,
}
