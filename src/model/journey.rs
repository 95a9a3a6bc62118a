//! Journey documents as exchanged with a data provider.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{EventType, JourneyEvent};

/// Colours handed out to projects in order of first appearance.
const PROJECT_COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FECA57", "#FF9FF3", "#54A0FF", "#5F27CD",
];

/// What to ask a provider for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyRequest {
    /// Only the trailing `days` days of the journey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,

    /// Only these projects. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
}

/// A complete journey for some time period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyData {
    pub events: Vec<JourneyEvent>,
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
    /// Significant events, in journey order.
    #[serde(default)]
    pub milestones: Vec<JourneyEvent>,
    pub timeline: TimelineSpan,
    #[serde(default)]
    pub stats: JourneyStats,
}

/// The overall time span a journey covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSpan {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Milliseconds between start and end.
    pub total_duration: i64,
}

impl TimelineSpan {
    pub fn new(start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            start_time,
            end_time,
            total_duration: end_time.as_millisecond() - start_time.as_millisecond(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub name: String,
    pub event_count: usize,
    pub color: String,
    pub start_date: Timestamp,
    pub last_active: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStats {
    pub total_events: usize,
    pub project_count: usize,
    pub milestone_count: usize,
    pub learning_moments: usize,
    /// Mean event importance.
    pub productivity_score: f64,
}

impl JourneyData {
    /// Builds a journey from raw events, deriving project summaries and stats.
    ///
    /// Events are ordered by timestamp; events sharing a timestamp keep their
    /// relative order.
    pub fn from_events(mut events: Vec<JourneyEvent>, span: TimelineSpan) -> Self {
        events.sort_by_key(|e| e.timestamp);
        let projects = summarize_projects(&events);
        let stats = compute_stats(&events, projects.len());
        let milestones = events.iter().filter(|e| e.is_milestone()).cloned().collect();
        Self {
            events,
            projects,
            milestones,
            timeline: span,
            stats,
        }
    }
}

fn summarize_projects(events: &[JourneyEvent]) -> Vec<ProjectSummary> {
    let mut summaries: Vec<ProjectSummary> = Vec::new();

    for event in events {
        if event.project.is_empty() {
            continue;
        }
        match summaries.iter_mut().find(|s| s.name == event.project) {
            Some(summary) => {
                summary.event_count += 1;
                summary.start_date = summary.start_date.min(event.timestamp);
                summary.last_active = summary.last_active.max(event.timestamp);
            }
            None => {
                let color = PROJECT_COLORS[summaries.len() % PROJECT_COLORS.len()];
                summaries.push(ProjectSummary {
                    name: event.project.clone(),
                    event_count: 1,
                    color: color.to_string(),
                    start_date: event.timestamp,
                    last_active: event.timestamp,
                });
            }
        }
    }

    // Stable: equal counts keep first-appearance order.
    summaries.sort_by(|a, b| b.event_count.cmp(&a.event_count));
    summaries
}

fn compute_stats(events: &[JourneyEvent], project_count: usize) -> JourneyStats {
    let milestone_count = events
        .iter()
        .filter(|e| e.kind == EventType::Milestone)
        .count();
    let learning_moments = events
        .iter()
        .filter(|e| {
            e.kind == EventType::Learning
                || e.has_tag_ignore_case("learning")
                || e.has_tag_ignore_case("insight")
        })
        .count();

    let productivity_score = if events.is_empty() {
        0.0
    } else {
        let total: u32 = events.iter().map(|e| u32::from(e.importance())).sum();
        #[allow(clippy::cast_precision_loss)]
        let score = f64::from(total) / events.len() as f64;
        score
    };

    JourneyStats {
        total_events: events.len(),
        project_count,
        milestone_count,
        learning_moments,
        productivity_score,
    }
}
