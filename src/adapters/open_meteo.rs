//! Open-Meteo forecast adapter
//!
//! Parses the columnar Open-Meteo forecast response. Times in the payload are
//! local wall-clock times; `utc_offset_seconds` pins them to UTC.

use crate::error::ForecastError;
use crate::types::{DailySample, HourlySample};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use super::ForecastPayloadAdapter;

/// Open-Meteo payload adapter
pub struct OpenMeteoAdapter;

impl ForecastPayloadAdapter for OpenMeteoAdapter {
    fn parse_hourly(&self, raw: &str) -> Result<Vec<HourlySample>, ForecastError> {
        let payload: OpenMeteoPayload = serde_json::from_str(raw)?;
        let offset = payload_offset(payload.utc_offset_seconds)?;

        let hourly = payload
            .hourly
            .ok_or_else(|| ForecastError::MissingField("hourly".to_string()))?;
        let times = hourly
            .time
            .ok_or_else(|| ForecastError::MissingField("hourly.time".to_string()))?;

        let mut missing = 0usize;
        let mut samples = Vec::with_capacity(times.len());

        for (i, time) in times.iter().enumerate() {
            samples.push(HourlySample {
                time: parse_local_time(time, &offset)?,
                temperature_c: value_at(&hourly.temperature_2m, i, &mut missing),
                humidity_percent: value_at(&hourly.relative_humidity_2m, i, &mut missing),
                precipitation_probability_percent: value_at(
                    &hourly.precipitation_probability,
                    i,
                    &mut missing,
                ),
                uv_index: value_at(&hourly.uv_index, i, &mut missing),
                cloud_cover_percent: value_at(&hourly.cloud_cover, i, &mut missing),
            });
        }

        if missing > 0 {
            log::warn!("normalized {missing} missing hourly values to 0");
        }

        samples.sort_by_key(|s| s.time);
        Ok(samples)
    }

    fn parse_daily(&self, raw: &str) -> Result<Vec<DailySample>, ForecastError> {
        let payload: OpenMeteoPayload = serde_json::from_str(raw)?;

        let Some(daily) = payload.daily else {
            return Ok(Vec::new());
        };
        let dates = daily
            .time
            .ok_or_else(|| ForecastError::MissingField("daily.time".to_string()))?;

        let mut missing = 0usize;
        let mut days = Vec::with_capacity(dates.len());

        for (i, date) in dates.iter().enumerate() {
            days.push(DailySample {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|e| ForecastError::DateParseError(format!("{date}: {e}")))?,
                temperature_max_c: value_at(&daily.temperature_2m_max, i, &mut missing),
                temperature_min_c: value_at(&daily.temperature_2m_min, i, &mut missing),
                humidity_percent: value_at(&daily.relative_humidity_2m_mean, i, &mut missing),
                precipitation_probability_percent: value_at(
                    &daily.precipitation_probability_max,
                    i,
                    &mut missing,
                ),
                uv_index_max: value_at(&daily.uv_index_max, i, &mut missing),
            });
        }

        if missing > 0 {
            log::warn!("normalized {missing} missing daily values to 0");
        }

        days.sort_by_key(|d| d.date);
        Ok(days)
    }
}

fn payload_offset(seconds: i32) -> Result<FixedOffset, ForecastError> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| ForecastError::InvalidTimezone(format!("utc_offset_seconds {seconds}")))
}

/// Parse an Open-Meteo local time ("2024-06-01T14:00") at the given offset
fn parse_local_time(value: &str, offset: &FixedOffset) -> Result<DateTime<Utc>, ForecastError> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| ForecastError::DateParseError(format!("{value}: {e}")))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| ForecastError::DateParseError(value.to_string()))
}

/// Column value at `index`, with null or absent entries read as 0
fn value_at(column: &[Option<f64>], index: usize, missing: &mut usize) -> f64 {
    match column.get(index).copied().flatten() {
        Some(v) => v,
        None => {
            *missing += 1;
            0.0
        }
    }
}

// Open-Meteo API response structures

#[derive(Debug, Deserialize)]
struct OpenMeteoPayload {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: Option<OpenMeteoHourly>,
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Option<Vec<String>>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    uv_index: Vec<Option<f64>>,
    #[serde(default)]
    cloud_cover: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    time: Option<Vec<String>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    uv_index_max: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> &'static str {
        r#"{
            "latitude": 52.52,
            "longitude": 13.41,
            "timezone": "Europe/Berlin",
            "utc_offset_seconds": 7200,
            "hourly": {
                "time": ["2024-06-01T09:00", "2024-06-01T10:00", "2024-06-01T11:00"],
                "temperature_2m": [18.5, 20.1, null],
                "relative_humidity_2m": [60, 55, 50],
                "precipitation_probability": [10, 0, 5],
                "uv_index": [2.1, 3.4, 4.0],
                "cloud_cover": [20, 15]
            },
            "daily": {
                "time": ["2024-06-01"],
                "temperature_2m_max": [24.0],
                "temperature_2m_min": [13.0],
                "relative_humidity_2m_mean": [58],
                "precipitation_probability_max": [15],
                "uv_index_max": [5.5]
            }
        }"#
    }

    #[test]
    fn test_parse_hourly() {
        let samples = OpenMeteoAdapter.parse_hourly(sample_payload()).unwrap();

        assert_eq!(samples.len(), 3);
        // 09:00 at UTC+2
        assert_eq!(samples[0].time, Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap());
        assert_eq!(samples[0].temperature_c, 18.5);
        assert_eq!(samples[1].humidity_percent, 55.0);
        assert_eq!(samples[1].uv_index, 3.4);
    }

    #[test]
    fn test_missing_values_become_zero() {
        let samples = OpenMeteoAdapter.parse_hourly(sample_payload()).unwrap();

        // null temperature and a cloud_cover column one entry short
        assert_eq!(samples[2].temperature_c, 0.0);
        assert_eq!(samples[2].cloud_cover_percent, 0.0);
        assert_eq!(samples[2].precipitation_probability_percent, 5.0);
    }

    #[test]
    fn test_parse_daily() {
        let days = OpenMeteoAdapter.parse_daily(sample_payload()).unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[0].temperature_max_c, 24.0);
        assert_eq!(days[0].humidity_percent, 58.0);
        assert_eq!(days[0].uv_index_max, 5.5);
    }

    #[test]
    fn test_no_daily_section() {
        let days = OpenMeteoAdapter
            .parse_daily(r#"{"hourly": {"time": []}}"#)
            .unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn test_missing_time_column() {
        let result = OpenMeteoAdapter.parse_hourly(r#"{"hourly": {"temperature_2m": [20.0]}}"#);
        assert!(matches!(result, Err(ForecastError::MissingField(_))));
    }

    #[test]
    fn test_bad_time_string() {
        let result = OpenMeteoAdapter.parse_hourly(r#"{"hourly": {"time": ["yesterday"]}}"#);
        assert!(matches!(result, Err(ForecastError::DateParseError(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(OpenMeteoAdapter.parse_hourly("not valid json").is_err());
    }
}
