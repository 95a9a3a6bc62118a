//! The loaded journey and its load lifecycle.

use std::collections::HashMap;

use jiff::Timestamp;
use tracing::{info, warn};

use crate::model::{JourneyData, JourneyEvent, JourneyStats, ProjectSummary};
use crate::provider::ProviderError;

/// An immutable, time-ordered event set with its overall bounds.
#[derive(Debug, Clone)]
pub struct Journey {
    events: Vec<JourneyEvent>,
    projects: Vec<ProjectSummary>,
    milestones: Vec<JourneyEvent>,
    stats: JourneyStats,
    start: Timestamp,
    end: Timestamp,
    by_id: HashMap<String, usize>,
}

impl Journey {
    /// Takes ownership of provider data.
    ///
    /// Bounds come from the document's timeline, widened to cover every
    /// event so the viewport can always reach each one.
    pub fn new(data: JourneyData) -> Self {
        let JourneyData {
            mut events,
            projects,
            mut milestones,
            timeline,
            stats,
        } = data;
        events.sort_by_key(|e| e.timestamp);
        milestones.sort_by_key(|e| e.timestamp);

        let mut start = timeline.start_time;
        let mut end = timeline.end_time.max(start);
        if let (Some(first), Some(last)) = (events.first(), events.last()) {
            start = start.min(first.timestamp);
            end = end.max(last.timestamp);
        }

        let mut by_id = HashMap::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            if by_id.contains_key(&event.id) {
                warn!(id = %event.id, "duplicate event id, keeping the earliest");
                continue;
            }
            by_id.insert(event.id.clone(), i);
        }

        Self {
            events,
            projects,
            milestones,
            stats,
            start,
            end,
            by_id,
        }
    }

    pub fn events(&self) -> &[JourneyEvent] {
        &self.events
    }

    pub fn projects(&self) -> &[ProjectSummary] {
        &self.projects
    }

    pub fn milestones(&self) -> &[JourneyEvent] {
        &self.milestones
    }

    pub fn stats(&self) -> &JourneyStats {
        &self.stats
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Milliseconds between start and end.
    pub fn duration_ms(&self) -> i64 {
        self.end.as_millisecond() - self.start.as_millisecond()
    }

    pub fn event(&self, id: &str) -> Option<&JourneyEvent> {
        self.by_id.get(id).map(|&i| &self.events[i])
    }

    /// Events with `start <= timestamp <= end`, in journey order.
    pub fn events_between(&self, start: Timestamp, end: Timestamp) -> &[JourneyEvent] {
        let lo = self.events.partition_point(|e| e.timestamp < start);
        let hi = self.events.partition_point(|e| e.timestamp <= end);
        if lo >= hi {
            return &[];
        }
        &self.events[lo..hi]
    }
}

/// Holds the current journey plus loading and error state.
#[derive(Debug, Default)]
pub struct JourneyStore {
    journey: Option<Journey>,
    loading: bool,
    error: Option<String>,
}

impl JourneyStore {
    pub fn journey(&self) -> Option<&Journey> {
        self.journey.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Marks a fetch as in flight.
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Settles a fetch. A failure keeps whatever journey was already loaded.
    ///
    /// Returns whether a new journey was installed.
    pub fn finish_load(&mut self, result: Result<JourneyData, ProviderError>) -> bool {
        self.loading = false;
        match result {
            Ok(data) => {
                let journey = Journey::new(data);
                info!(
                    events = journey.events().len(),
                    start = %journey.start(),
                    end = %journey.end(),
                    "journey loaded"
                );
                self.journey = Some(journey);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "journey load failed");
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
