//! Pipeline orchestration
//!
//! This module provides the public API for goodhours. It chains the stages:
//! hourly samples → extraction → work-hours split → reconciliation with the
//! windows persisted for the location.

use chrono::{DateTime, TimeZone, Utc};

use crate::adapters::ForecastPayloadAdapter;
use crate::config::Settings;
use crate::daily::{aggregate_daily, classify_days};
use crate::error::ForecastError;
use crate::extractor::WindowExtractor;
use crate::reconciler::WindowReconciler;
use crate::splitter::WindowSplitter;
use crate::store::WindowStore;
use crate::types::{ComfortPolicy, DailyForecast, HourlySample, Window, WorkHours};

/// Compute windows for one location without any persistent state.
///
/// # Arguments
/// * `samples` - Hourly samples, ascending by time
/// * `policy` - Comfort thresholds
/// * `work_hours` - Optional daily band to split windows against
/// * `tz` - Timezone whose calendar days anchor the band
/// * `previous` - Windows persisted from the last run, for annotation carry-over
///
/// # Example
/// ```ignore
/// let windows = compute_windows(&samples, &policy, Some(WorkHours::new(9, 17)), &Utc, &[]);
/// ```
pub fn compute_windows<Tz: TimeZone>(
    samples: &[HourlySample],
    policy: &ComfortPolicy,
    work_hours: Option<WorkHours>,
    tz: &Tz,
    previous: &[Window],
) -> Vec<Window> {
    let extracted = WindowExtractor::extract(samples, policy);
    let split = WindowSplitter::split(extracted, work_hours, tz);
    WindowReconciler::reconcile(split, previous)
}

/// Classify days from a payload.
///
/// Uses the payload's own daily section when it has one, otherwise aggregates
/// the hourly samples by local date.
pub fn classify_payload(
    adapter: &dyn ForecastPayloadAdapter,
    raw: &str,
    settings: &Settings,
) -> Result<Vec<DailyForecast>, ForecastError> {
    let mut days = adapter.parse_daily(raw)?;

    if days.is_empty() {
        let samples = adapter.parse_hourly(raw)?;
        days = aggregate_daily(&samples, &settings.tz()?);
    }

    Ok(classify_days(&days, &settings.policy))
}

/// Stateful processor that keeps persisted windows per location.
///
/// Use this when annotations must survive across fetches.
#[derive(Debug, Default)]
pub struct WindowProcessor {
    store: WindowStore,
}

impl WindowProcessor {
    /// Create a processor with an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor around an existing store
    pub fn with_store(store: WindowStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    /// Mutable access, e.g. for the display layer to write a plan onto a window
    pub fn store_mut(&mut self) -> &mut WindowStore {
        &mut self.store
    }

    /// Load persisted windows from JSON
    pub fn load_store(&mut self, json: &str) -> Result<(), ForecastError> {
        self.store =
            WindowStore::from_json(json).map_err(|e| ForecastError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Save persisted windows to JSON
    pub fn save_store(&self) -> Result<String, ForecastError> {
        Ok(self.store.to_json()?)
    }

    /// Recompute windows for a location and persist the result.
    pub fn process<Tz: TimeZone>(
        &mut self,
        location_id: &str,
        samples: &[HourlySample],
        policy: &ComfortPolicy,
        work_hours: Option<WorkHours>,
        tz: &Tz,
    ) -> Vec<Window> {
        let windows = compute_windows(
            samples,
            policy,
            work_hours,
            tz,
            self.store.get(location_id),
        );
        self.store.put(location_id, windows.clone());
        windows
    }

    /// Recompute windows for a location from a raw payload using settings.
    pub fn process_payload(
        &mut self,
        adapter: &dyn ForecastPayloadAdapter,
        location_id: &str,
        raw: &str,
        settings: &Settings,
    ) -> Result<Vec<Window>, ForecastError> {
        let samples = adapter.parse_hourly(raw)?;
        let tz = settings.tz()?;
        Ok(self.process(
            location_id,
            &samples,
            &settings.policy,
            settings.work_hours,
            &tz,
        ))
    }

    /// Set or clear the plan on a stored window. Returns false if no such window.
    pub fn annotate(
        &mut self,
        location_id: &str,
        window_id: &str,
        plan: Option<String>,
        skipped: bool,
    ) -> bool {
        let mut windows = self.store.get(location_id).to_vec();
        let Some(window) = windows.iter_mut().find(|w| w.id.to_string() == window_id) else {
            return false;
        };
        window.plan = plan;
        window.skipped = skipped;
        self.store.put(location_id, windows);
        true
    }

    /// Drop stored windows that ended before `now`
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        self.store.purge_expired(now)
    }
}
