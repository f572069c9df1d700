//! Camera tracking and named focus transitions.

use serde::{Deserialize, Serialize};

/// Duration of an animated focus transition.
pub const FOCUS_TRANSITION_MS: u64 = 1100;

/// How the renderer interpolates between two view states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interpolation {
    /// Zoom out, pan, zoom in
    FlyTo,
}

/// Parameters of an in-flight animated transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub duration_ms: u64,
    pub interpolation: Interpolation,
}

/// Camera position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
    /// Present only while a programmatic focus is animating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 20.0,
            zoom: 1.6,
            pitch: 0.0,
            bearing: 0.0,
            transition: None,
        }
    }
}

/// Named camera presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Global,
    RingOfFire,
    Japan,
    Chile,
    Mediterranean,
    Indonesia,
}

impl Region {
    pub const ALL: [Self; 6] = [
        Self::Global,
        Self::RingOfFire,
        Self::Japan,
        Self::Chile,
        Self::Mediterranean,
        Self::Indonesia,
    ];

    /// Look up a preset; unknown keys fall back to [`Region::Global`].
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|r| r.key() == key)
            .unwrap_or(Self::Global)
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::RingOfFire => "ringOfFire",
            Self::Japan => "japan",
            Self::Chile => "chile",
            Self::Mediterranean => "med",
            Self::Indonesia => "indo",
        }
    }

    /// Target `(longitude, latitude, zoom)`.
    #[must_use]
    pub const fn target(self) -> (f64, f64, f64) {
        match self {
            Self::Global => (0.0, 20.0, 1.6),
            Self::RingOfFire => (160.0, 15.0, 1.8),
            Self::Japan => (138.5, 37.5, 4.6),
            Self::Chile => (-71.0, -31.0, 4.0),
            Self::Mediterranean => (18.0, 38.0, 4.0),
            Self::Indonesia => (118.0, -2.5, 3.8),
        }
    }
}

/// Tracks the current camera and issues focus transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportController {
    view: ViewState,
}

impl ViewportController {
    #[must_use]
    pub const fn new(view: ViewState) -> Self {
        Self { view }
    }

    #[must_use]
    pub const fn view(&self) -> ViewState {
        self.view
    }

    /// Start an animated move to the preset named `key`.
    ///
    /// Pitch and bearing are kept from the current view.
    pub fn focus(&mut self, key: &str) -> ViewState {
        let (longitude, latitude, zoom) = Region::from_key(key).target();
        self.view = ViewState {
            longitude,
            latitude,
            zoom,
            transition: Some(Transition {
                duration_ms: FOCUS_TRANSITION_MS,
                interpolation: Interpolation::FlyTo,
            }),
            ..self.view
        };
        self.view
    }

    /// Replace the tracked view with one reported by the renderer.
    pub fn update(&mut self, view: ViewState) {
        self.view = view;
    }

    /// Discard transition parameters once the animation is over.
    pub fn finish_transition(&mut self) {
        self.view.transition = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_falls_back_to_global() {
        let mut a = ViewportController::default();
        let mut b = ViewportController::default();
        assert_eq!(a.focus("atlantis"), b.focus("global"));
        assert_eq!(Region::from_key(""), Region::Global);
    }

    #[test]
    fn test_focus_merges_target_and_tags_transition() {
        let mut ctl = ViewportController::new(ViewState {
            pitch: 40.0,
            bearing: -15.0,
            ..ViewState::default()
        });
        let view = ctl.focus("japan");

        assert_eq!((view.longitude, view.latitude, view.zoom), Region::Japan.target());
        assert_eq!(view.pitch, 40.0);
        assert_eq!(view.bearing, -15.0);
        assert_eq!(
            view.transition,
            Some(Transition {
                duration_ms: FOCUS_TRANSITION_MS,
                interpolation: Interpolation::FlyTo,
            })
        );
        assert_eq!(ctl.view(), view);
    }

    #[test]
    fn test_every_key_resolves_to_itself() {
        for region in Region::ALL {
            assert_eq!(Region::from_key(region.key()), region);
        }
    }

    #[test]
    fn test_update_replaces_verbatim() {
        let mut ctl = ViewportController::default();
        ctl.focus("chile");

        let manual = ViewState {
            longitude: -60.0,
            latitude: -20.0,
            zoom: 5.5,
            pitch: 10.0,
            bearing: 3.0,
            transition: None,
        };
        ctl.update(manual);
        assert_eq!(ctl.view(), manual);
    }

    #[test]
    fn test_finish_transition() {
        let mut ctl = ViewportController::default();
        ctl.focus("med");
        ctl.finish_transition();
        assert!(ctl.view().transition.is_none());
        assert_eq!(ctl.view().zoom, Region::Mediterranean.target().2);
    }

    #[test]
    fn test_view_state_json() {
        let view: ViewState =
            serde_json::from_str(r#"{"longitude": 1.0, "latitude": 2.0, "zoom": 3.0}"#).unwrap();
        assert_eq!(view.pitch, 0.0);
        assert!(view.transition.is_none());

        let json = serde_json::to_value(ViewportController::default().focus("indo")).unwrap();
        assert_eq!(json["transition"]["durationMs"], 1100);
        assert_eq!(json["transition"]["interpolation"], "flyTo");
    }
}
