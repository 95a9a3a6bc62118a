//! Core data model for the journey timeline.
//!
//! These types describe what the engine works on: events, scales, the
//! viewport window, and the journey documents providers hand over.

mod event;
mod journey;
mod scale;
mod viewport;

pub use event::{EventMetadata, EventType, JourneyEvent};
pub use journey::{JourneyData, JourneyRequest, JourneyStats, ProjectSummary, TimelineSpan};
pub use scale::{Scale, TIME_SCALES, TimeScale, nice_interval_ms, ticks};
pub use viewport::{
    MAX_PLAY_SPEED, MIN_PLAY_SPEED, PlaybackState, SavedViewport, Viewport, clamp_speed,
    clamp_unit,
};
