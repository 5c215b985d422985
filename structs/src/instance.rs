//! Persisted problem instance: household and hospital site identifiers,
//! populations, pairwise travel distances, and distance-feasibility
//! indicators, stored as a single JSON document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A facility-location problem instance in its wire form.
///
/// `all_hospitals` is always `existing_hospitals` followed by
/// `candidate_hospitals`, order preserved. Maps are `BTreeMap` so that
/// serialization is deterministic and round-trips byte-identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub households: Vec<String>,
    pub existing_hospitals: Vec<String>,
    pub candidate_hospitals: Vec<String>,
    pub all_hospitals: Vec<String>,
    pub population: BTreeMap<String, u32>,
    pub travel_distances: BTreeMap<String, BTreeMap<String, f64>>,
    pub distance_indicators: BTreeMap<String, BTreeMap<String, u8>>,
    pub max_travel_distance: f64,
    pub max_new_hospitals: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Instance {
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let text = serde_json::to_string(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Recomputes the distance indicators from the stored travel distances
    /// and `max_travel_distance`. For a consistent instance this reproduces
    /// `distance_indicators` exactly.
    pub fn derived_indicators(&self) -> BTreeMap<String, BTreeMap<String, u8>> {
        self.travel_distances
            .iter()
            .map(|(h, row)| {
                let derived = row
                    .iter()
                    .map(|(j, d)| (j.clone(), u8::from(*d <= self.max_travel_distance)))
                    .collect();
                (h.clone(), derived)
            })
            .collect()
    }
}
