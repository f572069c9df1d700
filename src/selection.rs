//! Selection state machine.
//!
//! Reconciles display mode, clicks and hovers reported by the map renderer
//! into one persistent [`Selection`] plus an ephemeral [`HoverPreview`].
//!
//! ```text
//!               ModeChanged / click on nothing
//!        ┌────────────────────────────────────────┐
//!        ▼                                        │
//!      Idle ──click point──▶ PointFocused ────────┤
//!        │                                        │
//!        └────click aggregate──▶ AggregateFocused ┘
//! ```
//!
//! Hovers only ever touch the preview.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::models::EventRecord;

/// How the renderer draws the active records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// One mark per record
    #[default]
    Points,
    /// Spatial bins (hotspots)
    #[serde(alias = "hex")]
    Aggregate,
}

impl DisplayMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Aggregate => "aggregate",
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "points" => Ok(Self::Points),
            "aggregate" | "hex" => Ok(Self::Aggregate),
            _ => Err(format!("unknown mode: {s} (expected: points, aggregate)")),
        }
    }
}

/// A constituent point of a spatial bin. Only magnitude matters here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AggregatePoint {
    #[serde(default)]
    pub mag: Option<f64>,
}

/// A spatial bin as reported by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AggregatePick {
    /// Explicit event count, when the renderer provides one
    #[serde(default)]
    pub count: Option<usize>,

    #[serde(default)]
    pub points: Option<Vec<AggregatePoint>>,
}

impl AggregatePick {
    /// Explicit count, else the number of points, else zero.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.count
            .or_else(|| self.points.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    /// Largest magnitude among the constituent points.
    #[must_use]
    pub fn max_magnitude(&self) -> Option<f64> {
        self.points
            .iter()
            .flatten()
            .filter_map(|p| p.mag)
            .reduce(f64::max)
    }
}

/// A picked mark, already typed for the display mode it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Pick {
    Point(EventRecord),
    Aggregate(AggregatePick),
}

impl Pick {
    /// Interpret an untyped picked object according to `mode`.
    ///
    /// Returns `None` for a missing or null object, or one that does not have
    /// the shape the mode expects.
    #[must_use]
    pub fn from_renderer(mode: DisplayMode, object: Option<Value>) -> Option<Self> {
        let object = object.filter(|v| !v.is_null())?;
        let pick = match mode {
            DisplayMode::Points => serde_json::from_value(object).map(Self::Point),
            DisplayMode::Aggregate => serde_json::from_value(object).map(Self::Aggregate),
        };
        match pick {
            Ok(p) => Some(p),
            Err(e) => {
                debug!("ignoring picked object not shaped for {} mode: {e}", mode.as_str());
                None
            }
        }
    }

    const fn mode(&self) -> DisplayMode {
        match self {
            Self::Point(_) => DisplayMode::Points,
            Self::Aggregate(_) => DisplayMode::Aggregate,
        }
    }
}

/// The persistent selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Point { record: EventRecord },
    #[serde(rename_all = "camelCase")]
    Aggregate {
        event_count: usize,
        max_magnitude: Option<f64>,
    },
}

/// State names of the machine, derived from the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PointFocused,
    AggregateFocused,
}

impl Selection {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::None => Phase::Idle,
            Self::Point { .. } => Phase::PointFocused,
            Self::Aggregate { .. } => Phase::AggregateFocused,
        }
    }
}

/// What a hover tooltip shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HoverDetail {
    Point {
        mag: Option<f64>,
        depth: Option<f64>,
        time: Option<i64>,
        place: String,
    },
    #[serde(rename_all = "camelCase")]
    Aggregate {
        event_count: usize,
        max_magnitude: Option<f64>,
    },
}

/// A tooltip anchored at the pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverPreview {
    pub screen_x: f64,
    pub screen_y: f64,
    #[serde(flatten)]
    pub detail: HoverDetail,
}

/// Interaction events fed to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    ModeChanged(DisplayMode),
    MarkClicked(Option<Pick>),
    MarkHovered { pick: Option<Pick>, x: f64, y: f64 },
}

/// Mode, persistent selection and hover preview, replaced as a unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectionState {
    pub mode: DisplayMode,
    pub selection: Selection,
    pub hover: Option<HoverPreview>,
}

impl SelectionState {
    #[must_use]
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.selection.phase()
    }

    /// Drop selection and hover, keeping the mode (used on feed reload).
    #[must_use]
    pub fn cleared(self) -> Self {
        Self::new(self.mode)
    }

    /// Compute the state that follows `event`.
    #[must_use]
    pub fn apply(self, event: SelectionEvent) -> Self {
        match event {
            SelectionEvent::ModeChanged(mode) => Self::new(mode),
            SelectionEvent::MarkClicked(None) => Self {
                selection: Selection::None,
                ..self
            },
            SelectionEvent::MarkClicked(Some(pick)) => {
                if pick.mode() != self.mode {
                    debug!("ignoring click on a {} mark", pick.mode().as_str());
                    return self;
                }
                let selection = match pick {
                    Pick::Point(record) => Selection::Point { record },
                    Pick::Aggregate(agg) => Selection::Aggregate {
                        event_count: agg.event_count(),
                        max_magnitude: agg.max_magnitude(),
                    },
                };
                Self { selection, ..self }
            }
            SelectionEvent::MarkHovered { pick, x, y } => {
                let hover = pick
                    .filter(|p| p.mode() == self.mode)
                    .map(|p| HoverPreview {
                        screen_x: x,
                        screen_y: y,
                        detail: hover_detail(&p),
                    });
                Self { hover, ..self }
            }
        }
    }
}

fn hover_detail(pick: &Pick) -> HoverDetail {
    match pick {
        Pick::Point(rec) => HoverDetail::Point {
            mag: rec.mag,
            depth: rec.depth,
            time: rec.time,
            place: rec.place.clone(),
        },
        Pick::Aggregate(agg) => HoverDetail::Aggregate {
            event_count: agg.event_count(),
            max_magnitude: agg.max_magnitude(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;
    use serde_json::json;

    fn point_pick(id: &str, mag: Option<f64>) -> Pick {
        Pick::Point(record(id, mag, Some(10.0)))
    }

    fn aggregate_pick(value: Value) -> Pick {
        Pick::from_renderer(DisplayMode::Aggregate, Some(value)).unwrap()
    }

    fn hovered(pick: Option<Pick>) -> SelectionEvent {
        SelectionEvent::MarkHovered {
            pick,
            x: 120.0,
            y: 48.0,
        }
    }

    #[test]
    fn test_click_point_focuses_record() {
        let state = SelectionState::new(DisplayMode::Points)
            .apply(SelectionEvent::MarkClicked(Some(point_pick("us1", Some(4.4)))));

        assert_eq!(state.phase(), Phase::PointFocused);
        match &state.selection {
            Selection::Point { record } => assert_eq!(record.id, "us1"),
            other => panic!("unexpected selection {other:?}"),
        }
    }

    #[test]
    fn test_click_aggregate_counts_points() {
        let pick = aggregate_pick(json!({"points": [{"mag": 3}, {"mag": 5}, {"mag": null}]}));
        let state = SelectionState::new(DisplayMode::Aggregate)
            .apply(SelectionEvent::MarkClicked(Some(pick)));

        assert_eq!(
            state.selection,
            Selection::Aggregate {
                event_count: 3,
                max_magnitude: Some(5.0),
            }
        );
    }

    #[test]
    fn test_aggregate_explicit_count_wins() {
        let pick = aggregate_pick(json!({"count": 12, "points": [{"mag": 2.0}]}));
        let state = SelectionState::new(DisplayMode::Aggregate)
            .apply(SelectionEvent::MarkClicked(Some(pick)));

        assert_eq!(
            state.selection,
            Selection::Aggregate {
                event_count: 12,
                max_magnitude: Some(2.0),
            }
        );
    }

    #[test]
    fn test_aggregate_without_points() {
        let pick = aggregate_pick(json!({}));
        let state = SelectionState::new(DisplayMode::Aggregate)
            .apply(SelectionEvent::MarkClicked(Some(pick)));

        assert_eq!(
            state.selection,
            Selection::Aggregate {
                event_count: 0,
                max_magnitude: None,
            }
        );
    }

    #[test]
    fn test_click_nothing_deselects() {
        let state = SelectionState::new(DisplayMode::Points)
            .apply(SelectionEvent::MarkClicked(Some(point_pick("a", None))))
            .apply(SelectionEvent::MarkClicked(None));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_point_and_aggregate_exclusive() {
        let state = SelectionState::new(DisplayMode::Points)
            .apply(SelectionEvent::MarkClicked(Some(point_pick("a", Some(1.0)))))
            .apply(SelectionEvent::ModeChanged(DisplayMode::Aggregate))
            .apply(SelectionEvent::MarkClicked(Some(aggregate_pick(json!({"count": 2})))));

        assert_eq!(state.phase(), Phase::AggregateFocused);
        assert!(!matches!(state.selection, Selection::Point { .. }));
    }

    #[test]
    fn test_mode_change_resets_from_any_state() {
        let starts = [
            SelectionState::new(DisplayMode::Points),
            SelectionState::new(DisplayMode::Points)
                .apply(SelectionEvent::MarkClicked(Some(point_pick("a", Some(1.0)))))
                .apply(hovered(Some(point_pick("b", Some(2.0))))),
            SelectionState::new(DisplayMode::Aggregate)
                .apply(SelectionEvent::MarkClicked(Some(aggregate_pick(json!({"count": 1})))))
                .apply(hovered(Some(aggregate_pick(json!({"count": 4}))))),
        ];

        for start in starts {
            for mode in [DisplayMode::Points, DisplayMode::Aggregate] {
                let next = start.clone().apply(SelectionEvent::ModeChanged(mode));
                assert_eq!(next.phase(), Phase::Idle);
                assert!(next.hover.is_none());
                assert_eq!(next.mode, mode);
            }
        }
    }

    #[test]
    fn test_hover_point_preview() {
        let mut rec = record("a", Some(4.5), Some(33.0));
        rec.place = "Off the coast".into();
        rec.time = Some(5_000);

        let state = SelectionState::new(DisplayMode::Points)
            .apply(hovered(Some(Pick::Point(rec))));

        let hover = state.hover.clone().unwrap();
        assert_eq!(hover.screen_x, 120.0);
        assert_eq!(hover.screen_y, 48.0);
        assert_eq!(
            hover.detail,
            HoverDetail::Point {
                mag: Some(4.5),
                depth: Some(33.0),
                time: Some(5_000),
                place: "Off the coast".into(),
            }
        );
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_hover_never_touches_selection() {
        let focused = SelectionState::new(DisplayMode::Aggregate)
            .apply(SelectionEvent::MarkClicked(Some(aggregate_pick(json!({"count": 7})))));

        let hovering = focused
            .clone()
            .apply(hovered(Some(aggregate_pick(json!({"points": [{"mag": 6.2}]})))));
        assert_eq!(hovering.selection, focused.selection);
        assert_eq!(
            hovering.hover.as_ref().map(|h| h.detail.clone()),
            Some(HoverDetail::Aggregate {
                event_count: 1,
                max_magnitude: Some(6.2),
            })
        );

        let left = hovering.apply(hovered(None));
        assert!(left.hover.is_none());
        assert_eq!(left.selection, focused.selection);
    }

    #[test]
    fn test_from_renderer_shapes() {
        assert_eq!(Pick::from_renderer(DisplayMode::Points, None), None);
        assert_eq!(Pick::from_renderer(DisplayMode::Points, Some(Value::Null)), None);
        // Point mode needs coordinates
        assert_eq!(Pick::from_renderer(DisplayMode::Points, Some(json!({"mag": 3}))), None);

        let pick = Pick::from_renderer(
            DisplayMode::Points,
            Some(json!({"id": "x", "lon": 1.0, "lat": 2.0, "mag": 3.0})),
        );
        assert!(matches!(pick, Some(Pick::Point(ref r)) if r.id == "x"));
    }

    #[test]
    fn test_mismatched_pick_ignored() {
        let focused = SelectionState::new(DisplayMode::Points)
            .apply(SelectionEvent::MarkClicked(Some(point_pick("a", Some(1.0)))));
        let next = focused
            .clone()
            .apply(SelectionEvent::MarkClicked(Some(aggregate_pick(json!({"count": 3})))));
        assert_eq!(next, focused);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("points".parse::<DisplayMode>().unwrap(), DisplayMode::Points);
        assert_eq!("hex".parse::<DisplayMode>().unwrap(), DisplayMode::Aggregate);
        assert!("heatmap".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_selection_serializes_tagged() {
        let sel = Selection::Aggregate {
            event_count: 3,
            max_magnitude: Some(5.0),
        };
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json, json!({"kind": "aggregate", "eventCount": 3, "maxMagnitude": 5.0}));
        assert_eq!(serde_json::to_value(Selection::None).unwrap(), json!({"kind": "none"}));
    }
}
