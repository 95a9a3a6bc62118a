//! Journey events: the immutable records a timeline is built from.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A single moment in the development journey.
///
/// Events are never mutated in place. A reload replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyEvent {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub project: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl JourneyEvent {
    /// Importance from the metadata, defaulting to [`EventMetadata::LOW`].
    pub fn importance(&self) -> u8 {
        self.metadata.importance.unwrap_or(EventMetadata::LOW)
    }

    /// Milestone-typed, or at least [`EventMetadata::HIGH`] importance.
    pub fn is_milestone(&self) -> bool {
        self.kind == EventType::Milestone || self.importance() >= EventMetadata::HIGH
    }

    /// Whether the event carries the given tag, ignoring case.
    pub fn has_tag_ignore_case(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// The closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Milestone,
    Learning,
    Decision,
    Commit,
    Capture,
    Error,
    Success,
    ContextSwitch,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::Milestone,
        EventType::Learning,
        EventType::Decision,
        EventType::Commit,
        EventType::Capture,
        EventType::Error,
        EventType::Success,
        EventType::ContextSwitch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Learning => "learning",
            Self::Decision => "decision",
            Self::Commit => "commit",
            Self::Capture => "capture",
            Self::Error => "error",
            Self::Success => "success",
            Self::ContextSwitch => "context_switch",
        }
    }

    /// Rank used to pick a cluster's representative. Higher wins.
    pub fn significance(self) -> u8 {
        match self {
            Self::Milestone => 7,
            Self::Error => 6,
            Self::Success => 5,
            Self::Decision => 4,
            Self::Learning => 3,
            Self::Commit => 2,
            Self::ContextSwitch => 1,
            Self::Capture => 0,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}

/// Fixed metadata schema plus an open extension map.
///
/// Unknown keys land in `extra` so documents written by newer producers
/// still round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// 1 (low) to 4 (critical).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_changed: Vec<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EventMetadata {
    pub const LOW: u8 = 1;
    pub const MEDIUM: u8 = 2;
    pub const HIGH: u8 = 3;
    pub const CRITICAL: u8 = 4;
}
