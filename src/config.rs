//! TOML-based settings.
//!
//! Holds the inputs the pipeline needs from the user:
//! - Comfort policy thresholds (Celsius)
//! - Optional work-hours band
//! - Timezone used to anchor the band and group days
//! - Reminder lead time for the notification layer
//!
//! ```toml
//! timezone = "Europe/Berlin"
//! reminder_lead_minutes = 60
//!
//! [policy]
//! min_temperature_c = 16.0
//! max_temperature_c = 26.0
//! allow_precipitation = false
//!
//! [work_hours]
//! start_hour = 9
//! end_hour = 17
//! ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ForecastError;
use crate::types::{ComfortPolicy, WorkHours};

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// IANA timezone name
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Passed through to the notification layer, which schedules reminders
    /// this many minutes before a window opens. Not read by the pipeline.
    #[serde(default = "default_reminder_lead")]
    pub reminder_lead_minutes: u32,
    #[serde(default)]
    pub policy: ComfortPolicy,
    #[serde(default)]
    pub work_hours: Option<WorkHours>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_reminder_lead() -> u32 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            reminder_lead_minutes: default_reminder_lead(),
            policy: ComfortPolicy::default(),
            work_hours: None,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(raw: &str) -> Result<Self, ForecastError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ForecastError> {
        let raw = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&raw)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize settings to TOML
    pub fn to_toml_string(&self) -> Result<String, ForecastError> {
        toml::to_string_pretty(self).map_err(|e| ForecastError::ParseError(e.to_string()))
    }

    /// Resolve the configured timezone
    pub fn tz(&self) -> Result<Tz, ForecastError> {
        parse_timezone(&self.timezone)
    }

    /// Check the preconditions the window algorithms assume.
    ///
    /// The algorithms never call this; an invalid policy just yields degenerate
    /// results there.
    pub fn validate(&self) -> Result<(), ForecastError> {
        self.tz()?;
        validate_policy(&self.policy)?;
        if let Some(band) = self.work_hours {
            validate_work_hours(band)?;
        }
        Ok(())
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ForecastError> {
    name.parse::<Tz>()
        .map_err(|e| ForecastError::InvalidTimezone(format!("{name}: {e}")))
}

/// `min <= max` for temperature, non-negative ceilings
pub fn validate_policy(policy: &ComfortPolicy) -> Result<(), ForecastError> {
    if policy.min_temperature_c > policy.max_temperature_c {
        return Err(ForecastError::InvalidPolicy(format!(
            "min_temperature_c {} exceeds max_temperature_c {}",
            policy.min_temperature_c, policy.max_temperature_c
        )));
    }
    if policy.max_humidity_percent < 0.0
        || policy.max_uv_index < 0.0
        || policy.max_cloud_cover_percent < 0.0
    {
        return Err(ForecastError::InvalidPolicy(
            "ceilings must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// `start_hour < end_hour <= 24`
pub fn validate_work_hours(band: WorkHours) -> Result<(), ForecastError> {
    if band.start_hour >= band.end_hour || band.end_hour > 24 {
        return Err(ForecastError::InvalidWorkHours(format!(
            "{}-{} is not a valid [start, end) band",
            band.start_hour, band.end_hour
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.policy.max_humidity_percent, 70.0);
        assert!(settings.work_hours.is_none());
    }

    #[test]
    fn test_partial_policy_keeps_other_defaults() {
        let raw = r#"
            timezone = "Europe/Berlin"

            [policy]
            min_temperature_c = 18.0
            allow_precipitation = true

            [work_hours]
            start_hour = 9
            end_hour = 17
        "#;
        let settings = Settings::from_toml_str(raw).unwrap();

        assert_eq!(settings.policy.min_temperature_c, 18.0);
        assert_eq!(settings.policy.max_temperature_c, 27.0);
        assert!(settings.policy.allow_precipitation);
        assert_eq!(settings.work_hours, Some(WorkHours::new(9, 17)));
        assert_eq!(settings.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings {
            work_hours: Some(WorkHours::new(8, 16)),
            ..Settings::default()
        };
        let raw = settings.to_toml_string().unwrap();

        assert_eq!(Settings::from_toml_str(&raw).unwrap(), settings);
    }

    #[test]
    fn test_reminder_lead_passes_through() {
        let settings = Settings::from_toml_str("reminder_lead_minutes = 15").unwrap();

        assert_eq!(settings.reminder_lead_minutes, 15);
        assert!(settings.to_toml_string().unwrap().contains("reminder_lead_minutes = 15"));
    }

    #[test]
    fn test_invalid_timezone() {
        let settings = Settings {
            timezone: "Mars/Olympus".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ForecastError::InvalidTimezone(_))));
    }

    #[test]
    fn test_inverted_policy_rejected() {
        let mut settings = Settings::default();
        settings.policy.min_temperature_c = 30.0;
        settings.policy.max_temperature_c = 20.0;

        assert!(matches!(settings.validate(), Err(ForecastError::InvalidPolicy(_))));
    }

    #[test]
    fn test_work_hours_bounds() {
        assert!(validate_work_hours(WorkHours::new(0, 24)).is_ok());
        assert!(validate_work_hours(WorkHours::new(17, 9)).is_err());
        assert!(validate_work_hours(WorkHours::new(9, 9)).is_err());
        assert!(validate_work_hours(WorkHours::new(9, 25)).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Settings::from_toml_str("policy = 3"),
            Err(ForecastError::TomlError(_))
        ));
    }
}
