//! Journey data providers.
//!
//! A provider answers one [`JourneyRequest`] with one [`JourneyData`]. Any
//! failure is terminal for that load attempt; retrying is the caller's call.

use std::path::PathBuf;
use std::{fs, io};

use jiff::Timestamp;
use tracing::debug;

use crate::model::{JourneyData, JourneyRequest, TimelineSpan};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Errors that can occur while fetching journey data.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = core::result::Result<T, ProviderError>;

/// Source of journey data.
pub trait JourneyProvider {
    fn fetch(&self, request: &JourneyRequest) -> Result<JourneyData>;
}

/// Reads a journey document from a JSON file.
///
/// `days` is measured back from the document's own end time, so the same
/// file always yields the same window.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl JourneyProvider for FileProvider {
    fn fetch(&self, request: &JourneyRequest) -> Result<JourneyData> {
        debug!(path = %self.path.display(), ?request, "reading journey file");
        let json = fs::read_to_string(&self.path)?;
        let data: JourneyData = serde_json::from_str(&json)?;
        narrow(data, request)
    }
}

/// Applies a request to a full document.
///
/// Summaries and stats are recomputed only when the request narrows the set.
pub fn narrow(data: JourneyData, request: &JourneyRequest) -> Result<JourneyData> {
    if request.days.is_none() && request.projects.is_empty() {
        return Ok(data);
    }

    let mut span = data.timeline;
    if let Some(days) = request.days {
        if days == 0 {
            return Err(ProviderError::Rejected("days must be at least 1".into()));
        }
        let cutoff_ms = span.end_time.as_millisecond() - i64::from(days) * DAY_MS;
        // A window reaching past the earliest instant covers the whole journey.
        let start = Timestamp::from_millisecond(cutoff_ms)
            .map_or(span.start_time, |cutoff| span.start_time.max(cutoff));
        span = TimelineSpan::new(start, span.end_time);
    }

    let events = data
        .events
        .into_iter()
        .filter(|e| request.projects.is_empty() || request.projects.contains(&e.project))
        .filter(|e| e.timestamp >= span.start_time)
        .collect();

    Ok(JourneyData::from_events(events, span))
}
