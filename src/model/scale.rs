//! The zoom levels a timeline can be viewed at.
//!
//! Scales form a fixed six-step ladder. Every scale but `full` has a fixed
//! window duration; `full` always spans the whole journey.

use std::fmt;
use std::str::FromStr;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Roughly how many ticks the `full` scale aims for.
const FULL_SCALE_TICKS: f64 = 10.0;

/// A named zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    #[serde(rename = "15m")]
    QuarterHour,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "full")]
    Full,
}

/// One row of the scale table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScale {
    pub name: Scale,
    /// Window length in milliseconds. `None` only for [`Scale::Full`].
    pub duration_ms: Option<i64>,
    /// Spacing between ticks. `None` for [`Scale::Full`], which picks one from the span.
    pub tick_interval_ms: Option<i64>,
}

/// The process-wide scale table, finest first.
pub const TIME_SCALES: [TimeScale; 6] = [
    TimeScale {
        name: Scale::QuarterHour,
        duration_ms: Some(15 * MINUTE_MS),
        tick_interval_ms: Some(MINUTE_MS),
    },
    TimeScale {
        name: Scale::Hour,
        duration_ms: Some(HOUR_MS),
        tick_interval_ms: Some(5 * MINUTE_MS),
    },
    TimeScale {
        name: Scale::SixHours,
        duration_ms: Some(6 * HOUR_MS),
        tick_interval_ms: Some(30 * MINUTE_MS),
    },
    TimeScale {
        name: Scale::Day,
        duration_ms: Some(DAY_MS),
        tick_interval_ms: Some(2 * HOUR_MS),
    },
    TimeScale {
        name: Scale::Week,
        duration_ms: Some(7 * DAY_MS),
        tick_interval_ms: Some(DAY_MS),
    },
    TimeScale {
        name: Scale::Full,
        duration_ms: None,
        tick_interval_ms: None,
    },
];

impl Scale {
    /// All scales, finest to coarsest.
    pub const ALL: [Scale; 6] = [
        Scale::QuarterHour,
        Scale::Hour,
        Scale::SixHours,
        Scale::Day,
        Scale::Week,
        Scale::Full,
    ];

    /// Zoom-in order. `full` is not part of it: zooming in from `full` lands on its first step.
    const ZOOM_IN: [Scale; 5] = [
        Scale::Week,
        Scale::Day,
        Scale::SixHours,
        Scale::Hour,
        Scale::QuarterHour,
    ];

    /// Zoom-out order.
    const ZOOM_OUT: [Scale; 6] = Scale::ALL;

    pub fn table(self) -> &'static TimeScale {
        &TIME_SCALES[self as usize]
    }

    pub fn duration_ms(self) -> Option<i64> {
        self.table().duration_ms
    }

    pub fn duration(self) -> Option<SignedDuration> {
        self.duration_ms().map(SignedDuration::from_millis)
    }

    pub fn is_full(self) -> bool {
        self == Scale::Full
    }

    /// The next finer scale, or `None` when already at the finest.
    pub fn finer(self) -> Option<Scale> {
        match Self::ZOOM_IN.iter().position(|s| *s == self) {
            Some(i) => Self::ZOOM_IN.get(i + 1).copied(),
            None => Some(Self::ZOOM_IN[0]),
        }
    }

    /// The next coarser scale, or `None` when already at `full`.
    pub fn coarser(self) -> Option<Scale> {
        let i = Self::ZOOM_OUT.iter().position(|s| *s == self)?;
        Self::ZOOM_OUT.get(i + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuarterHour => "15m",
            Self::Hour => "1h",
            Self::SixHours => "6h",
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scale| scale.as_str() == s)
            .ok_or_else(|| format!("unknown scale '{s}' (expected one of 15m, 1h, 6h, 24h, 7d, full)"))
    }
}

/// Choose a "nice" interval (1, 2 or 5 times a power of ten) at or above `ms`.
pub fn nice_interval_ms(ms: f64) -> i64 {
    if !ms.is_finite() || ms <= 1.0 {
        return 1;
    }

    let base = 10.0f64.powf(ms.log10().floor());
    let ratio = ms / base;
    let nice = if ratio <= 1.0 {
        base
    } else if ratio <= 2.0 {
        base * 2.0
    } else if ratio <= 5.0 {
        base * 5.0
    } else {
        base * 10.0
    };
    #[allow(clippy::cast_possible_truncation)]
    let nice = nice.round() as i64;
    nice
}

/// Tick instants inside `[start, end]`, aligned to multiples of the interval.
pub fn ticks(scale: Scale, start: Timestamp, end: Timestamp) -> Vec<Timestamp> {
    let start_ms = start.as_millisecond();
    let end_ms = end.as_millisecond();
    if end_ms <= start_ms {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let interval = scale
        .table()
        .tick_interval_ms
        .unwrap_or_else(|| nice_interval_ms((end_ms - start_ms) as f64 / FULL_SCALE_TICKS));

    let mut tick = start_ms.div_euclid(interval) * interval;
    if tick < start_ms {
        tick += interval;
    }

    let mut out = Vec::new();
    while tick <= end_ms {
        if let Ok(ts) = Timestamp::from_millisecond(tick) {
            out.push(ts);
        }
        tick += interval;
    }
    out
}
