//! Core types for the goodhours pipeline
//!
//! This module defines the data structures that flow through each stage:
//! hourly samples and the comfort policy going in, windows coming out, plus the
//! daily aggregates used for day-level classification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Precipitation probability (percent) at or above which an hour fails when
/// the policy does not allow precipitation. Strict: 19.999 passes, 20 fails.
pub const PRECIPITATION_THRESHOLD_PERCENT: f64 = 20.0;

/// Two windows whose bounds both differ by less than this are the same window.
pub const NEAR_EQUAL_TOLERANCE_SECONDS: i64 = 60;

/// One hourly observation or forecast point, in canonical units (Celsius).
///
/// Missing upstream values are normalized to 0; `null` in JSON input is read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub time: DateTime<Utc>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub temperature_c: f64,
    /// Relative humidity (0-100, not clamped)
    #[serde(default, deserialize_with = "zero_if_null")]
    pub humidity_percent: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub precipitation_probability_percent: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub uv_index: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub cloud_cover_percent: f64,
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// User-configurable comfort thresholds. All bounds are inclusive.
///
/// Values are assumed to be validated upstream (`min <= max`); an inverted
/// temperature range simply makes every hour fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComfortPolicy {
    #[serde(default = "default_min_temperature")]
    pub min_temperature_c: f64,
    #[serde(default = "default_max_temperature")]
    pub max_temperature_c: f64,
    #[serde(default = "default_max_humidity")]
    pub max_humidity_percent: f64,
    #[serde(default = "default_max_uv")]
    pub max_uv_index: f64,
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover_percent: f64,
    /// When false, an hour fails unless precipitation probability is below 20%
    #[serde(default)]
    pub allow_precipitation: bool,
}

fn default_min_temperature() -> f64 {
    15.0
}
fn default_max_temperature() -> f64 {
    27.0
}
fn default_max_humidity() -> f64 {
    70.0
}
fn default_max_uv() -> f64 {
    6.0
}
fn default_max_cloud_cover() -> f64 {
    60.0
}

impl Default for ComfortPolicy {
    fn default() -> Self {
        Self {
            min_temperature_c: default_min_temperature(),
            max_temperature_c: default_max_temperature(),
            max_humidity_percent: default_max_humidity(),
            max_uv_index: default_max_uv(),
            max_cloud_cover_percent: default_max_cloud_cover(),
            allow_precipitation: false,
        }
    }
}

/// Daily work-hours band, `[start_hour, end_hour)` in local time.
///
/// `end_hour == 24` means the following local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl WorkHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }
}

/// Opaque window identifier, minted once when a window is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(Uuid);

impl WindowId {
    /// Mint a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contiguous run of good hours with aggregated statistics and an optional
/// user annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    /// Time of the first good hour (inclusive)
    pub from: DateTime<Utc>,
    /// Time of the last good hour (inclusive)
    pub to: DateTime<Utc>,
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub max_humidity_percent: f64,
    pub max_uv_index: f64,
    pub max_cloud_cover_percent: f64,
    /// Free-text plan attached by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// User chose to skip this window
    #[serde(default)]
    pub skipped: bool,
}

impl Window {
    /// Build a window over a non-empty run of samples.
    ///
    /// Returns `None` for an empty run. Bounds come from the first and last
    /// sample, statistics from every sample in the run.
    pub fn from_run(run: &[HourlySample]) -> Option<Self> {
        let first = run.first()?;
        let last = run.last()?;

        let mut window = Self {
            id: WindowId::new(),
            from: first.time,
            to: last.time,
            min_temperature_c: first.temperature_c,
            max_temperature_c: first.temperature_c,
            max_humidity_percent: first.humidity_percent,
            max_uv_index: first.uv_index,
            max_cloud_cover_percent: first.cloud_cover_percent,
            plan: None,
            skipped: false,
        };

        for sample in &run[1..] {
            window.min_temperature_c = window.min_temperature_c.min(sample.temperature_c);
            window.max_temperature_c = window.max_temperature_c.max(sample.temperature_c);
            window.max_humidity_percent = window.max_humidity_percent.max(sample.humidity_percent);
            window.max_uv_index = window.max_uv_index.max(sample.uv_index);
            window.max_cloud_cover_percent =
                window.max_cloud_cover_percent.max(sample.cloud_cover_percent);
        }

        Some(window)
    }

    /// Copy of this window narrowed to `[from, to]` under a new id.
    ///
    /// Statistics are inherited verbatim, not recomputed for the narrower range.
    pub fn slice(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            id: WindowId::new(),
            from,
            to,
            ..self.clone()
        }
    }

    /// True if `other`'s range lies entirely inside this window's range (inclusive)
    pub fn contains(&self, other: &Window) -> bool {
        other.from >= self.from && other.to <= self.to
    }

    /// True if both bounds differ from `other`'s by less than a minute
    pub fn nearly_equals(&self, other: &Window) -> bool {
        let tolerance_ms = NEAR_EQUAL_TOLERANCE_SECONDS * 1000;
        (self.from - other.from).num_milliseconds().abs() < tolerance_ms
            && (self.to - other.to).num_milliseconds().abs() < tolerance_ms
    }

    /// Whether a previously computed window describes the same period as this one
    pub fn matches_previous(&self, previous: &Window) -> bool {
        self.contains(previous) || self.nearly_equals(previous)
    }

    /// Whether the user attached a plan or skipped this window
    pub fn has_annotation(&self) -> bool {
        self.plan.is_some() || self.skipped
    }

    /// Window is over once its last hour is in the past
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.to < now
    }

    /// Key used to schedule and later cancel a reminder for this window
    pub fn reminder_key(&self, location_id: &str) -> String {
        format!("{location_id}-{}", self.id)
    }
}

/// One day's aggregate forecast, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySample {
    /// Local calendar date
    pub date: NaiveDate,
    pub temperature_max_c: f64,
    pub temperature_min_c: f64,
    pub humidity_percent: f64,
    pub precipitation_probability_percent: f64,
    pub uv_index_max: f64,
}

/// A classified day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_max_c: f64,
    pub temperature_min_c: f64,
    /// Mean of the daily max and min
    pub average_temperature_c: f64,
    pub humidity_percent: f64,
    pub precipitation_probability_percent: f64,
    pub uv_index_max: f64,
    pub is_good_day: bool,
}
