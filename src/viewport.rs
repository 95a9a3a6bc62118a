//! Viewport control: the only code that moves the visible window.
//!
//! Every operation is a silent no-op when no journey is loaded. Successful
//! operations stamp `last_update` so consumers can throttle redraws.

use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::journey::Journey;
use crate::model::{Scale, Viewport, clamp_unit};

#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    viewport: Viewport,
    last_update: Option<Timestamp>,
}

impl ViewportController {
    /// A controller that will open at `scale` and `position` once data loads.
    pub fn new(scale: Scale, position: f64) -> Self {
        Self {
            viewport: Viewport::new(scale, position),
            last_update: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    /// Re-derives the window after a (re)load, keeping scale and position.
    pub fn attach(&mut self, journey: &Journey) {
        self.apply(journey, self.viewport.scale, self.viewport.position);
    }

    /// Switches zoom level, keeping the current relative position.
    ///
    /// `full` spans the whole journey and resets position to 0.
    pub fn set_scale(&mut self, journey: Option<&Journey>, scale: Scale) -> bool {
        let Some(journey) = journey else {
            return false;
        };
        let position = if scale.is_full() {
            0.0
        } else {
            self.viewport.position
        };
        self.apply(journey, scale, position);
        debug!(%scale, position, "viewport scale set");
        true
    }

    /// Moves the window. Ignored at `full`, where the window already spans everything.
    pub fn set_position(&mut self, journey: Option<&Journey>, position: f64) -> bool {
        let Some(journey) = journey else {
            return false;
        };
        if self.viewport.scale.is_full() {
            return false;
        }
        self.apply(journey, self.viewport.scale, clamp_unit(position));
        true
    }

    /// Moves back to position 0, with or without a journey.
    ///
    /// Returns `false` when already there.
    pub fn rewind(&mut self, journey: Option<&Journey>) -> bool {
        if self.viewport.position <= 0.0 {
            return false;
        }
        match journey {
            Some(journey) => self.apply(journey, self.viewport.scale, 0.0),
            None => self.viewport.position = 0.0,
        }
        true
    }

    pub fn pan(&mut self, journey: Option<&Journey>, delta: f64) -> bool {
        let target = self.viewport.position + delta;
        self.set_position(journey, target)
    }

    /// Brings an event into view.
    ///
    /// At `full` the position becomes the event's fraction of the journey;
    /// otherwise the window is centered on the event as far as bounds allow.
    pub fn jump_to_event(&mut self, journey: Option<&Journey>, id: &str) -> bool {
        let Some(journey) = journey else {
            return false;
        };
        let Some(event) = journey.event(id) else {
            debug!(id, "jump to unknown event ignored");
            return false;
        };

        let offset_ms = event.timestamp.as_millisecond() - journey.start().as_millisecond();
        let scale = self.viewport.scale;
        #[allow(clippy::cast_precision_loss)]
        let position = match scale.duration_ms() {
            None => ratio(offset_ms as f64, journey.duration_ms() as f64),
            Some(window_ms) => {
                let max_offset = (journey.duration_ms() - window_ms).max(0);
                ratio(offset_ms as f64 - window_ms as f64 / 2.0, max_offset as f64)
            }
        };
        self.apply(journey, scale, clamp_unit(position));
        debug!(id, position = self.viewport.position, "jumped to event");
        true
    }

    /// Installs a scale and position and re-derives the window.
    fn apply(&mut self, journey: &Journey, scale: Scale, position: f64) {
        let (start, end) = window(journey, scale, position);
        self.viewport = Viewport {
            scale,
            position,
            start_time: start,
            end_time: end,
        };
        self.last_update = Some(Timestamp::now());
    }
}

/// Computes the window for a scale and position against journey bounds.
///
/// The window keeps the scale's exact duration and is shifted, never shrunk,
/// to fit. A journey shorter than the window pins the start to the journey
/// start.
fn window(journey: &Journey, scale: Scale, position: f64) -> (Timestamp, Timestamp) {
    let Some(window_ms) = scale.duration_ms() else {
        return (journey.start(), journey.end());
    };

    let journey_start = journey.start().as_millisecond();
    let journey_end = journey.end().as_millisecond();
    let max_offset = (journey.duration_ms() - window_ms).max(0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let offset = (clamp_unit(position) * max_offset as f64).round() as i64;

    let mut start = journey_start + offset;
    if start + window_ms > journey_end {
        start = journey_end - window_ms;
    }
    if start < journey_start {
        start = journey_start;
    }

    let start_ts = journey.start() + SignedDuration::from_millis(start - journey_start);
    let end_ts = start_ts + SignedDuration::from_millis(window_ms);
    (start_ts, end_ts)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
