//! Filter and search over a journey.
//!
//! Categories combine with AND; values within a category combine with OR.
//! An empty category places no restriction, so the default filter passes
//! everything through.

use std::collections::BTreeSet;

use jiff::Timestamp;
use serde::Serialize;

use crate::model::{EventType, JourneyEvent};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DateRange {
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineFilter {
    pub projects: BTreeSet<String>,
    pub event_types: BTreeSet<EventType>,
    pub tags: BTreeSet<String>,
    pub date_range: Option<DateRange>,
    pub search_query: String,
}

impl TimelineFilter {
    /// Whether this filter lets everything through.
    pub fn is_identity(&self) -> bool {
        self.projects.is_empty()
            && self.event_types.is_empty()
            && self.tags.is_empty()
            && self.date_range.is_none()
            && self.search_query.trim().is_empty()
    }

    pub fn matches(&self, event: &JourneyEvent) -> bool {
        if !self.projects.is_empty() && !self.projects.contains(&event.project) {
            return false;
        }
        if !self.event_types.is_empty() && !self.event_types.contains(&event.kind) {
            return false;
        }
        if !self.tags.is_empty() && self.tags.is_disjoint(&event.tags) {
            return false;
        }
        if let Some(range) = &self.date_range
            && !range.contains(event.timestamp)
        {
            return false;
        }

        let query = self.search_query.trim();
        query.is_empty() || matches_query(event, &query.to_lowercase())
    }

    /// Adds the project if absent, removes it otherwise.
    pub fn toggle_project(&mut self, project: &str) {
        if !self.projects.remove(project) {
            self.projects.insert(project.to_string());
        }
    }

    pub fn toggle_event_type(&mut self, kind: EventType) {
        if !self.event_types.remove(&kind) {
            self.event_types.insert(kind);
        }
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }
}

/// Case-insensitive match against content, project, and each tag.
fn matches_query(event: &JourneyEvent, needle: &str) -> bool {
    event.content.to_lowercase().contains(needle)
        || event.project.to_lowercase().contains(needle)
        || event.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

/// Events passing `filter`, in journey order.
pub fn apply<'a>(events: &'a [JourneyEvent], filter: &TimelineFilter) -> Vec<&'a JourneyEvent> {
    if filter.is_identity() {
        return events.iter().collect();
    }
    events.iter().filter(|e| filter.matches(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::EventMetadata;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn event(id: &str, kind: EventType, project: &str, tags: &[&str], content: &str) -> JourneyEvent {
        JourneyEvent {
            id: id.into(),
            timestamp: ts("2024-01-02T00:00:00Z"),
            kind,
            project: project.into(),
            content: content.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            metadata: EventMetadata::default(),
        }
    }

    fn sample_events() -> Vec<JourneyEvent> {
        let mut events = vec![
            event("1", EventType::Milestone, "uroboro", &["release"], "Shipped v1"),
            event("2", EventType::Learning, "uroboro", &["rust", "async"], "Learned pinning"),
            event("3", EventType::Commit, "wherewasi", &["rust"], "Fix parser"),
            event("4", EventType::Capture, "examinator", &[], "Notes on Flashcards"),
        ];
        events[3].timestamp = ts("2024-01-05T00:00:00Z");
        events
    }

    fn ids(events: &[&JourneyEvent]) -> Vec<String> {
        events.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn default_filter_is_identity() {
        let events = sample_events();
        let filter = TimelineFilter::default();
        assert!(filter.is_identity());
        assert_eq!(apply(&events, &filter).len(), events.len());
    }

    #[test]
    fn whitespace_query_is_no_query() {
        let events = sample_events();
        let filter = TimelineFilter {
            search_query: "   ".into(),
            ..Default::default()
        };
        assert!(filter.is_identity());
        assert_eq!(apply(&events, &filter).len(), 4);
    }

    #[test]
    fn tags_match_any() {
        let events = sample_events();
        let mut filter = TimelineFilter::default();
        filter.toggle_tag("release");
        filter.toggle_tag("async");
        assert_eq!(ids(&apply(&events, &filter)), ["1", "2"]);
    }

    #[test]
    fn categories_combine_with_and() {
        let events = sample_events();
        let mut filter = TimelineFilter::default();
        filter.toggle_project("uroboro");
        filter.toggle_tag("rust");
        assert_eq!(ids(&apply(&events, &filter)), ["2"]);
    }

    #[test]
    fn category_order_does_not_matter() {
        let events = sample_events();

        let mut by_project = TimelineFilter::default();
        by_project.toggle_project("wherewasi");
        by_project.toggle_project("uroboro");
        let mut by_tag = TimelineFilter::default();
        by_tag.toggle_tag("rust");

        let project_then_tag: Vec<JourneyEvent> = apply(&events, &by_project)
            .into_iter()
            .cloned()
            .collect();
        let project_then_tag = apply(&project_then_tag, &by_tag);

        let tag_then_project: Vec<JourneyEvent> =
            apply(&events, &by_tag).into_iter().cloned().collect();
        let tag_then_project = apply(&tag_then_project, &by_project);

        assert_eq!(ids(&project_then_tag), ids(&tag_then_project));
        assert_eq!(ids(&project_then_tag), ["2", "3"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let events = sample_events();
        let search = |q: &str| {
            let filter = TimelineFilter {
                search_query: q.into(),
                ..Default::default()
            };
            ids(&apply(&events, &filter))
        };

        assert_eq!(search("flashcards"), ["4"]);
        assert_eq!(search("WHEREWASI"), ["3"]);
        assert_eq!(search("Rust"), ["2", "3"]);
        assert_eq!(search("  shipped  "), ["1"]);
        assert!(search("nothing matches this").is_empty());
    }

    #[test]
    fn event_types_filter() {
        let events = sample_events();
        let mut filter = TimelineFilter::default();
        filter.toggle_event_type(EventType::Commit);
        filter.toggle_event_type(EventType::Capture);
        assert_eq!(ids(&apply(&events, &filter)), ["3", "4"]);

        filter.toggle_event_type(EventType::Capture);
        assert_eq!(ids(&apply(&events, &filter)), ["3"]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let events = sample_events();
        let filter = TimelineFilter {
            date_range: Some(DateRange {
                start: ts("2024-01-03T00:00:00Z"),
                end: ts("2024-01-05T00:00:00Z"),
            }),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&events, &filter)), ["4"]);
    }

    #[test]
    fn toggling_twice_restores_identity() {
        let mut filter = TimelineFilter::default();
        filter.toggle_project("uroboro");
        filter.toggle_project("uroboro");
        assert!(filter.is_identity());
    }
}
