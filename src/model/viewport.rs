//! Viewport and playback state.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Scale;

/// The visible time window.
///
/// `start` and `end` are derived from `scale` and `position` against the
/// loaded journey; they are never set on their own. Until a journey loads,
/// the window is empty at the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub scale: Scale,
    /// Normalized location of `start` within the pannable range, in `[0, 1]`.
    pub position: f64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl Viewport {
    /// Position is clamped into `[0, 1]` and pinned to 0 at `full`.
    pub fn new(scale: Scale, position: f64) -> Self {
        let position = if scale.is_full() {
            0.0
        } else {
            clamp_unit(position)
        };
        Self {
            scale,
            position,
            start_time: Timestamp::UNIX_EPOCH,
            end_time: Timestamp::UNIX_EPOCH,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_time.as_millisecond() - self.start_time.as_millisecond()
    }

    /// Whether `at` falls inside the window, both ends inclusive.
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start_time <= at && at <= self.end_time
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Scale::default(), 0.0)
    }
}

/// Playback speed bounds.
pub const MIN_PLAY_SPEED: f64 = 0.5;
pub const MAX_PLAY_SPEED: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Always within [`MIN_PLAY_SPEED`, `MAX_PLAY_SPEED`].
    pub play_speed: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            play_speed: 1.0,
        }
    }
}

/// Clamp into `[0, 1]`. NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp into the playback speed range. NaN becomes the minimum.
pub fn clamp_speed(value: f64) -> f64 {
    if value.is_nan() {
        MIN_PLAY_SPEED
    } else {
        value.clamp(MIN_PLAY_SPEED, MAX_PLAY_SPEED)
    }
}

/// Saved viewport as written to the persistence store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedViewport {
    pub scale: Scale,
    pub position: f64,
}

impl Default for SavedViewport {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            position: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_unit_interval() {
        assert!((clamp_unit(-0.5)).abs() < f64::EPSILON);
        assert!((clamp_unit(1.5) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_unit(0.25) - 0.25).abs() < f64::EPSILON);
        assert!((clamp_unit(f64::NAN)).abs() < f64::EPSILON);
        assert!((clamp_unit(f64::INFINITY) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamps_play_speed() {
        assert!((clamp_speed(0.1) - MIN_PLAY_SPEED).abs() < f64::EPSILON);
        assert!((clamp_speed(10.0) - MAX_PLAY_SPEED).abs() < f64::EPSILON);
        assert!((clamp_speed(1.5) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn new_viewport_clamps_position() {
        let viewport = Viewport::new(Scale::Hour, 4.0);
        assert!((viewport.position - 1.0).abs() < f64::EPSILON);
        assert_eq!(viewport.duration_ms(), 0);
    }

    #[test]
    fn full_scale_pins_position_to_zero() {
        let viewport = Viewport::new(Scale::Full, 0.9);
        assert!(viewport.position.abs() < f64::EPSILON);
    }

    #[test]
    fn contains_is_inclusive() {
        let mut viewport = Viewport::default();
        viewport.start_time = "2024-01-01T00:00:00Z".parse().unwrap();
        viewport.end_time = "2024-01-02T00:00:00Z".parse().unwrap();

        assert!(viewport.contains(viewport.start_time));
        assert!(viewport.contains(viewport.end_time));
        assert!(!viewport.contains("2024-01-02T00:00:00.001Z".parse().unwrap()));
    }

    #[test]
    fn saved_viewport_wire_shape() {
        let saved = SavedViewport {
            scale: Scale::SixHours,
            position: 0.5,
        };
        assert_eq!(
            serde_json::to_string(&saved).unwrap(),
            r#"{"scale":"6h","position":0.5}"#
        );
    }
}
