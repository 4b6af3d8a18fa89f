//! Window persistence
//!
//! This module keeps the last computed windows per location so annotations can
//! be reconciled on the next fetch. The store is plain serde data; where it
//! lives (file, key-value store, app preferences) is up to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Window;

/// Windows keyed by location identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStore {
    #[serde(default)]
    locations: BTreeMap<String, Vec<Window>>,
}

impl WindowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Windows previously stored for a location (empty if none)
    pub fn get(&self, location_id: &str) -> &[Window] {
        self.locations
            .get(location_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace the windows stored for a location
    pub fn put(&mut self, location_id: &str, windows: Vec<Window>) {
        log::info!("storing {} windows for {}", windows.len(), location_id);
        self.locations.insert(location_id.to_string(), windows);
    }

    /// Forget a location entirely
    pub fn remove(&mut self, location_id: &str) -> Option<Vec<Window>> {
        self.locations.remove(location_id)
    }

    /// Known location identifiers, in sorted order
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    /// Total number of stored windows across all locations
    pub fn window_count(&self) -> usize {
        self.locations.values().map(Vec::len).sum()
    }

    /// Drop every window whose last hour is before `now`. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;

        for windows in self.locations.values_mut() {
            let before = windows.len();
            windows.retain(|w| !w.is_expired(now));
            purged += before - windows.len();
        }

        if purged > 0 {
            log::info!("purged {purged} expired windows");
        }

        purged
    }

    /// Load a store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
