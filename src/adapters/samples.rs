//! Canonical sample adapter
//!
//! Reads samples that are already in canonical form, either as a JSON array or
//! as newline-delimited JSON (one sample per line).

use crate::error::ForecastError;
use crate::types::{DailySample, HourlySample};

use super::ForecastPayloadAdapter;

/// Adapter for canonical `HourlySample` JSON / NDJSON
pub struct SampleAdapter;

impl SampleAdapter {
    /// Parse newline-delimited samples, skipping blank lines
    pub fn parse_ndjson(raw: &str) -> Result<Vec<HourlySample>, ForecastError> {
        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line.trim()).map_err(|e| {
                    ForecastError::ParseError(format!("line {}: {}", n + 1, e))
                })
            })
            .collect()
    }

    /// Parse a JSON array of samples
    pub fn parse_array(raw: &str) -> Result<Vec<HourlySample>, ForecastError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl ForecastPayloadAdapter for SampleAdapter {
    fn parse_hourly(&self, raw: &str) -> Result<Vec<HourlySample>, ForecastError> {
        let mut samples = if raw.trim_start().starts_with('[') {
            Self::parse_array(raw)?
        } else {
            Self::parse_ndjson(raw)?
        };

        samples.sort_by_key(|s| s.time);
        Ok(samples)
    }

    fn parse_daily(&self, _raw: &str) -> Result<Vec<DailySample>, ForecastError> {
        Ok(Vec::new())
    }
}
