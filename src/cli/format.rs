//! Output formatting for CLI display.

use std::fmt::Write;

use jiff::Timestamp;

use crate::cluster::VisibleItem;
use crate::model::{JourneyEvent, JourneyStats, ProjectSummary, Scale, TIME_SCALES, Viewport};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Human-readable span, e.g. `15m`, `2h`, `1d`, `1h30m`.
pub(super) fn format_duration_ms(ms: i64) -> String {
    if ms <= 0 {
        return "0m".to_string();
    }
    let days = ms / DAY_MS;
    let hours = (ms % DAY_MS) / HOUR_MS;
    let minutes = (ms % HOUR_MS) / MINUTE_MS;

    let mut out = String::new();
    if days > 0 {
        let _ = write!(out, "{days}d");
    }
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if minutes > 0 || out.is_empty() {
        let _ = write!(out, "{minutes}m");
    }
    out
}

pub(super) fn format_scales() -> String {
    let mut out = String::from("scale  window    ticks\n");
    for row in &TIME_SCALES {
        let window = row
            .duration_ms
            .map_or_else(|| "journey".to_string(), format_duration_ms);
        let ticks = row
            .tick_interval_ms
            .map_or_else(|| "auto".to_string(), format_duration_ms);
        let _ = writeln!(out, "{:<6} {window:<9} {ticks}", row.name.as_str());
    }
    out
}

pub(super) fn format_timestamp(at: Timestamp) -> String {
    at.strftime("%Y-%m-%d %H:%M").to_string()
}

pub(super) fn format_viewport(viewport: &Viewport) -> String {
    format!(
        "[{}] {:.3}  {} .. {}",
        viewport.scale,
        viewport.position,
        format_timestamp(viewport.start_time),
        format_timestamp(viewport.end_time),
    )
}

/// Tick labels, with the date dropped for sub-day scales.
pub(super) fn format_ticks(ticks: &[Timestamp], scale: Scale) -> String {
    if ticks.is_empty() {
        return "none".to_string();
    }
    let pattern = match scale {
        Scale::QuarterHour | Scale::Hour | Scale::SixHours | Scale::Day => "%H:%M",
        Scale::Week | Scale::Full => "%m-%d",
    };
    ticks
        .iter()
        .map(|t| t.strftime(pattern).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One marker line. The selected event is flagged with `*`.
pub(super) fn format_item(item: &VisibleItem<'_>, viewport: &Viewport, selected: Option<&str>) -> String {
    let position = item.position(viewport);
    match item {
        VisibleItem::Event(event) => {
            let mark = if selected == Some(event.id.as_str()) { '*' } else { ' ' };
            format!(
                "{mark} {position:.3}  {}  {:<14} {:<12} {}  {}",
                format_timestamp(event.timestamp),
                event.kind.as_str(),
                event.project,
                event.id,
                event.content,
            )
        }
        VisibleItem::Cluster(cluster) => format!(
            "  {position:.3}  {}  cluster of {} ({:.1}/h), top: {} {}",
            format_timestamp(cluster.bucket_start),
            cluster.members.len(),
            cluster.density,
            cluster.representative.kind.as_str(),
            cluster.representative.id,
        ),
    }
}

pub(super) fn format_projects(projects: &[ProjectSummary]) -> String {
    if projects.is_empty() {
        return "No projects\n".to_string();
    }
    let mut out = String::new();
    for p in projects {
        let _ = writeln!(
            out,
            "{:<16} {:>5} events  {}  {} .. {}",
            p.name,
            p.event_count,
            p.color,
            format_timestamp(p.start_date),
            format_timestamp(p.last_active),
        );
    }
    out
}

pub(super) fn format_milestones(milestones: &[JourneyEvent]) -> String {
    if milestones.is_empty() {
        return "No milestones\n".to_string();
    }
    let mut out = String::from("milestones:\n");
    for event in milestones {
        let _ = writeln!(
            out,
            "  {}  {:<14} {:<12} {}  {}",
            format_timestamp(event.timestamp),
            event.kind.as_str(),
            event.project,
            event.id,
            event.content,
        );
    }
    out
}

pub(super) fn format_stats(stats: &JourneyStats) -> String {
    format!(
        "events:       {}\n\
         projects:     {}\n\
         milestones:   {}\n\
         learning:     {}\n\
         productivity: {:.2}\n",
        stats.total_events,
        stats.project_count,
        stats.milestone_count,
        stats.learning_moments,
        stats.productivity_score,
    )
}
