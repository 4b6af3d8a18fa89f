//! Forecast payload adapters
//!
//! This module provides adapters that parse raw forecast payloads and map them
//! to canonical hourly samples (Celsius, missing values as 0, ascending by time).

mod open_meteo;
mod samples;

pub use open_meteo::OpenMeteoAdapter;
pub use samples::SampleAdapter;

use crate::error::ForecastError;
use crate::types::{DailySample, HourlySample};

/// Trait for forecast payload adapters
pub trait ForecastPayloadAdapter {
    /// Parse raw payload into hourly samples, sorted ascending by time
    fn parse_hourly(&self, raw: &str) -> Result<Vec<HourlySample>, ForecastError>;

    /// Parse raw payload into daily aggregates, sorted ascending by date.
    ///
    /// Payloads without a daily section yield an empty list.
    fn parse_daily(&self, raw: &str) -> Result<Vec<DailySample>, ForecastError>;
}
