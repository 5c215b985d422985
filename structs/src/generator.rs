//! Synthetic instance generation.
//!
//! Produces a fully populated [`Instance`] from a seed and size parameters.
//! The same seed and parameters always produce the same instance, so a
//! generated dataset can be cached to disk and regenerated bit-identically.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::instance::Instance;
use crate::Point;

#[derive(Debug, Clone)]
pub struct GenParams {
    pub seed: u64,
    pub households: usize,
    pub existing: usize,
    pub candidates: usize,
    /// Range the max travel distance is drawn from (km).
    pub dist_range: (f64, f64),
    /// Symmetric bound on the routing-deviation noise added to each
    /// straight-line distance (km).
    pub noise: f64,
    /// Coordinates are drawn uniformly from [0, area)^2.
    pub area: f64,
    /// Household population is drawn from [pop_range.0, pop_range.1).
    pub pop_range: (u32, u32),
    /// Lower end of the open-budget draw; the draw is clamped to the
    /// candidate count.
    pub budget_floor: usize,
}

impl Default for GenParams {
    fn default() -> Self {
        GenParams {
            seed: 42,
            households: 20_000,
            existing: 15,
            candidates: 100,
            dist_range: (8.0, 15.0),
            noise: 10.0,
            area: 100.0,
            pop_range: (50, 500),
            budget_floor: 5,
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn generate(params: &GenParams) -> Instance {
    let mut rng = StdRng::seed_from_u64(params.seed);

    let max_travel_distance = round2(rng.random_range(params.dist_range.0..params.dist_range.1));
    let floor = params.budget_floor.min(params.candidates);
    let max_new_hospitals = rng.random_range(floor..=params.candidates);

    let households: Vec<String> = (0..params.households).map(|i| format!("H{}", i + 1)).collect();
    let existing_hospitals: Vec<String> =
        (0..params.existing).map(|j| format!("EJ{}", j + 1)).collect();
    let candidate_hospitals: Vec<String> =
        (0..params.candidates).map(|j| format!("CJ{}", j + 1)).collect();
    let all_hospitals: Vec<String> = existing_hospitals
        .iter()
        .chain(candidate_hospitals.iter())
        .cloned()
        .collect();

    let household_coords: Vec<Point> = (0..params.households)
        .map(|_| Point {
            x: rng.random_range(0.0..params.area),
            y: rng.random_range(0.0..params.area),
        })
        .collect();
    let hospital_coords: Vec<Point> = (0..all_hospitals.len())
        .map(|_| Point {
            x: rng.random_range(0.0..params.area),
            y: rng.random_range(0.0..params.area),
        })
        .collect();

    let population: BTreeMap<String, u32> = households
        .iter()
        .map(|h| (h.clone(), rng.random_range(params.pop_range.0..params.pop_range.1)))
        .collect();

    let mut travel_distances: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut distance_indicators: BTreeMap<String, BTreeMap<String, u8>> = BTreeMap::new();
    for (i, h) in households.iter().enumerate() {
        let mut dist_row = BTreeMap::new();
        let mut ind_row = BTreeMap::new();
        for (j, hosp) in all_hospitals.iter().enumerate() {
            let noise = if params.noise > 0.0 {
                rng.random_range(-params.noise..params.noise)
            } else {
                0.0
            };
            // Perturbed straight-line distance, clipped at zero: a negative
            // travel distance has no physical meaning.
            let dist = round2((household_coords[i].dist(&hospital_coords[j]) + noise).max(0.0));
            ind_row.insert(hosp.clone(), u8::from(dist <= max_travel_distance));
            dist_row.insert(hosp.clone(), dist);
        }
        travel_distances.insert(h.clone(), dist_row);
        distance_indicators.insert(h.clone(), ind_row);
    }

    log::info!(
        "generated instance: {} households, {} existing + {} candidate sites, S={}, p={}",
        households.len(),
        existing_hospitals.len(),
        candidate_hospitals.len(),
        max_travel_distance,
        max_new_hospitals
    );

    Instance {
        households,
        existing_hospitals,
        candidate_hospitals,
        all_hospitals,
        population,
        travel_distances,
        distance_indicators,
        max_travel_distance,
        max_new_hospitals,
    }
}
