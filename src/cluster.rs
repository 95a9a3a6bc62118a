//! Collapses dense stretches of the viewport into clusters.
//!
//! The window is split into fixed-width buckets, roughly one per display
//! unit. A bucket holding more than `threshold` events becomes a single
//! [`EventCluster`]; lighter buckets pass their events through.

use std::cmp::Ordering;

use jiff::{SignedDuration, Timestamp};

use crate::model::{JourneyEvent, Viewport};

const HOUR_MS: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Buckets with more events than this collapse.
    pub threshold: usize,
    /// Number of buckets across the window; usually the display width.
    pub buckets: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            threshold: 3,
            buckets: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventCluster<'a> {
    pub representative: &'a JourneyEvent,
    /// Every event in the bucket, representative included, in journey order.
    pub members: Vec<&'a JourneyEvent>,
    /// Events per hour across the bucket.
    pub density: f64,
    /// Bucket midpoint as a fraction of the window.
    pub position: f64,
    pub bucket_start: Timestamp,
    pub bucket_end: Timestamp,
}

/// One renderable marker.
#[derive(Debug, Clone, PartialEq)]
pub enum VisibleItem<'a> {
    Event(&'a JourneyEvent),
    Cluster(EventCluster<'a>),
}

impl VisibleItem<'_> {
    /// Fraction of the window at which to draw this item.
    pub fn position(&self, viewport: &Viewport) -> f64 {
        match self {
            Self::Event(e) => fraction_of_window(e.timestamp, viewport),
            Self::Cluster(c) => c.position,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Event(_) => 1,
            Self::Cluster(c) => c.members.len(),
        }
    }
}

pub fn fraction_of_window(at: Timestamp, viewport: &Viewport) -> f64 {
    let span = viewport.duration_ms();
    if span <= 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let fraction =
        (at.as_millisecond() - viewport.start_time.as_millisecond()) as f64 / span as f64;
    fraction.clamp(0.0, 1.0)
}

/// Clusters the events that fall inside the viewport.
///
/// Pure: the same events and viewport always yield the same items.
pub fn cluster<'a>(
    events: &[&'a JourneyEvent],
    viewport: &Viewport,
    options: ClusterOptions,
) -> Vec<VisibleItem<'a>> {
    let window_ms = viewport.duration_ms().max(0);
    // Never more buckets than milliseconds in the window.
    let bucket_count = i64::try_from(options.buckets)
        .unwrap_or(i64::MAX)
        .clamp(1, window_ms.max(1));
    let bucket_ms = (window_ms / bucket_count + i64::from(window_ms % bucket_count != 0)).max(1);
    let start_ms = viewport.start_time.as_millisecond();
    let last_bucket = (window_ms / bucket_ms).min(bucket_count - 1);

    // Events arrive in time order, so buckets fill in order too.
    let mut buckets: Vec<(i64, Vec<&'a JourneyEvent>)> = Vec::new();
    for &event in events.iter().filter(|e| viewport.contains(e.timestamp)) {
        let index = ((event.timestamp.as_millisecond() - start_ms) / bucket_ms).min(last_bucket);
        match buckets.last_mut() {
            Some((i, members)) if *i == index => members.push(event),
            _ => buckets.push((index, vec![event])),
        }
    }

    let mut items = Vec::new();
    for (index, members) in buckets {
        if members.len() <= options.threshold {
            items.extend(members.into_iter().map(VisibleItem::Event));
            continue;
        }

        let bucket_start = viewport.start_time + SignedDuration::from_millis(index * bucket_ms);
        let bucket_end = bucket_start + SignedDuration::from_millis(bucket_ms);
        let midpoint = bucket_start + SignedDuration::from_millis(bucket_ms / 2);
        #[allow(clippy::cast_precision_loss)]
        let density = members.len() as f64 / (bucket_ms as f64 / HOUR_MS);

        items.push(VisibleItem::Cluster(EventCluster {
            representative: most_significant(&members),
            density,
            position: fraction_of_window(midpoint, viewport),
            bucket_start,
            bucket_end,
            members,
        }));
    }
    items
}

/// Highest event-type significance, then importance, then earliest.
fn most_significant<'a>(members: &[&'a JourneyEvent]) -> &'a JourneyEvent {
    let mut best = members[0];
    for &candidate in &members[1..] {
        if compare_significance(candidate, best) == Ordering::Greater {
            best = candidate;
        }
    }
    best
}

fn compare_significance(a: &JourneyEvent, b: &JourneyEvent) -> Ordering {
    a.kind
        .significance()
        .cmp(&b.kind.significance())
        .then_with(|| a.importance().cmp(&b.importance()))
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{EventMetadata, EventType, Scale};

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn event(id: &str, at: &str, kind: EventType) -> JourneyEvent {
        JourneyEvent {
            id: id.into(),
            timestamp: ts(at),
            kind,
            project: "p".into(),
            content: String::new(),
            tags: Default::default(),
            metadata: EventMetadata::default(),
        }
    }

    /// 2024-01-01, one day wide.
    fn day_viewport() -> Viewport {
        Viewport {
            scale: Scale::Day,
            position: 0.0,
            start_time: ts("2024-01-01T00:00:00Z"),
            end_time: ts("2024-01-02T00:00:00Z"),
        }
    }

    /// 24 one-hour buckets.
    fn hourly() -> ClusterOptions {
        ClusterOptions {
            threshold: 2,
            buckets: 24,
        }
    }

    #[test]
    fn sparse_events_pass_through() {
        let events = [
            event("a", "2024-01-01T01:00:00Z", EventType::Capture),
            event("b", "2024-01-01T05:00:00Z", EventType::Commit),
        ];
        let refs: Vec<_> = events.iter().collect();
        let items = cluster(&refs, &day_viewport(), hourly());

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| matches!(i, VisibleItem::Event(_))));
    }

    #[test]
    fn dense_bucket_collapses() {
        let events = [
            event("a", "2024-01-01T03:05:00Z", EventType::Capture),
            event("b", "2024-01-01T03:10:00Z", EventType::Decision),
            event("c", "2024-01-01T03:20:00Z", EventType::Capture),
            event("d", "2024-01-01T09:00:00Z", EventType::Capture),
        ];
        let refs: Vec<_> = events.iter().collect();
        let items = cluster(&refs, &day_viewport(), hourly());

        assert_eq!(items.len(), 2);
        let VisibleItem::Cluster(c) = &items[0] else {
            panic!("expected a cluster first");
        };
        assert_eq!(c.members.len(), 3);
        assert_eq!(c.representative.id, "b");
        assert!((c.density - 3.0).abs() < 1e-9);
        assert_eq!(c.bucket_start, ts("2024-01-01T03:00:00Z"));
        assert_eq!(c.bucket_end, ts("2024-01-01T04:00:00Z"));
        assert!((c.position - 3.5 / 24.0).abs() < 1e-9);
        assert!(matches!(items[1], VisibleItem::Event(e) if e.id == "d"));
    }

    #[test]
    fn huge_bucket_count_is_capped_to_millisecond_buckets() {
        let events = [
            event("a", "2024-01-01T03:05:00Z", EventType::Capture),
            event("b", "2024-01-01T03:05:00Z", EventType::Decision),
            event("c", "2024-01-01T03:05:00Z", EventType::Capture),
            event("d", "2024-01-01T03:05:00.001Z", EventType::Capture),
        ];
        let refs: Vec<_> = events.iter().collect();
        let options = ClusterOptions {
            threshold: 2,
            buckets: usize::MAX,
        };
        let items = cluster(&refs, &day_viewport(), options);

        assert_eq!(items.len(), 2);
        let VisibleItem::Cluster(c) = &items[0] else {
            panic!("expected the shared instant to cluster");
        };
        assert_eq!(c.members.len(), 3);
        assert_eq!(c.bucket_end, ts("2024-01-01T03:05:00.001Z"));
    }

    #[test]
    fn bucket_at_threshold_is_not_collapsed() {
        let events = [
            event("a", "2024-01-01T03:05:00Z", EventType::Capture),
            event("b", "2024-01-01T03:10:00Z", EventType::Capture),
        ];
        let refs: Vec<_> = events.iter().collect();
        assert_eq!(cluster(&refs, &day_viewport(), hourly()).len(), 2);
    }

    #[test]
    fn representative_ties_break_on_importance_then_time() {
        let mut low = event("low", "2024-01-01T03:01:00Z", EventType::Commit);
        low.metadata.importance = Some(EventMetadata::LOW);
        let mut high_late = event("high-late", "2024-01-01T03:30:00Z", EventType::Commit);
        high_late.metadata.importance = Some(EventMetadata::HIGH);
        let mut high_early = event("high-early", "2024-01-01T03:20:00Z", EventType::Commit);
        high_early.metadata.importance = Some(EventMetadata::HIGH);

        let events = [low, high_early, high_late];
        let refs: Vec<_> = events.iter().collect();
        let items = cluster(&refs, &day_viewport(), hourly());

        let VisibleItem::Cluster(c) = &items[0] else {
            panic!("expected a cluster");
        };
        assert_eq!(c.representative.id, "high-early");
    }

    #[test]
    fn window_edges_are_inclusive_and_outside_is_dropped() {
        let events = [
            event("before", "2023-12-31T23:59:59Z", EventType::Capture),
            event("start", "2024-01-01T00:00:00Z", EventType::Capture),
            event("end", "2024-01-02T00:00:00Z", EventType::Capture),
            event("after", "2024-01-02T00:00:01Z", EventType::Capture),
        ];
        let refs: Vec<_> = events.iter().collect();
        let items = cluster(&refs, &day_viewport(), hourly());

        let ids: Vec<_> = items
            .iter()
            .map(|i| match i {
                VisibleItem::Event(e) => e.id.as_str(),
                VisibleItem::Cluster(_) => "cluster",
            })
            .collect();
        assert_eq!(ids, ["start", "end"]);
    }

    #[test]
    fn end_boundary_joins_last_bucket() {
        let events = [
            event("a", "2024-01-01T23:10:00Z", EventType::Capture),
            event("b", "2024-01-01T23:50:00Z", EventType::Capture),
            event("c", "2024-01-02T00:00:00Z", EventType::Milestone),
        ];
        let refs: Vec<_> = events.iter().collect();
        let items = cluster(&refs, &day_viewport(), hourly());

        assert_eq!(items.len(), 1);
        let VisibleItem::Cluster(c) = &items[0] else {
            panic!("expected a cluster");
        };
        assert_eq!(c.representative.id, "c");
    }

    #[test]
    fn clustering_is_idempotent() {
        let events: Vec<_> = (0..40)
            .map(|i| {
                event(
                    &format!("e{i}"),
                    &format!("2024-01-01T{:02}:{:02}:00Z", i % 24, i),
                    EventType::Capture,
                )
            })
            .collect();
        let mut sorted = events.clone();
        sorted.sort_by_key(|e| e.timestamp);
        let refs: Vec<_> = sorted.iter().collect();

        let first = cluster(&refs, &day_viewport(), hourly());
        let second = cluster(&refs, &day_viewport(), hourly());
        assert_eq!(first, second);
    }

    #[test]
    fn item_positions_follow_timestamps() {
        let events = [event("noon", "2024-01-01T12:00:00Z", EventType::Capture)];
        let refs: Vec<_> = events.iter().collect();
        let viewport = day_viewport();
        let items = cluster(&refs, &viewport, hourly());

        assert!((items[0].position(&viewport) - 0.5).abs() < 1e-9);
        assert_eq!(items[0].len(), 1);
    }
}
