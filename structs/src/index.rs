//! Index-addressed view of an [`Instance`].
//!
//! The wire form keys everything by string id, which is far too slow at
//! 20,000 households × 115 sites (2.3M pairs). This view flattens
//! populations, distances and indicators into dense row-major arrays keyed
//! by (household index, site index), validating the instance's
//! data-consistency contract in the process.

use crate::instance::Instance;

#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    // Data-consistency group: the instance's own id lists reference an id
    // that is missing from a required mapping. Fatal before formulation.
    #[error("household {household} has no population entry")]
    MissingPopulation { household: String },
    #[error("household {household} has no travel-distance row")]
    MissingDistances { household: String },
    #[error("no travel distance for household {household} to site {site}")]
    MissingDistance { household: String, site: String },
    #[error("household {household} has no distance-indicator row")]
    MissingIndicators { household: String },
    #[error("no distance indicator for household {household} to site {site}")]
    MissingIndicator { household: String, site: String },
    #[error("all_hospitals is not existing_hospitals followed by candidate_hospitals")]
    SiteListMismatch,

    // Configuration group.
    #[error("max travel distance must be positive, got {value}")]
    NonPositiveMaxDistance { value: f64 },
}

/// Validated, index-addressed problem instance.
///
/// Sites are ordered existing first, then candidates, matching
/// `Instance::all_hospitals`. Pair data is household-major:
/// entry `(i, j)` lives at `i * num_sites + j`.
#[derive(Debug, Clone)]
pub struct IndexedInstance {
    households: Vec<String>,
    sites: Vec<String>,
    num_existing: usize,
    population: Vec<u32>,
    distances: Vec<f64>,
    within_range: Vec<u8>,
    max_travel_distance: f64,
    max_new: usize,
}

impl IndexedInstance {
    pub fn from_instance(inst: &Instance) -> Result<Self, InstanceError> {
        if inst.max_travel_distance <= 0.0 {
            return Err(InstanceError::NonPositiveMaxDistance {
                value: inst.max_travel_distance,
            });
        }

        let split = inst.existing_hospitals.len();
        let ordered = inst.all_hospitals.len() == split + inst.candidate_hospitals.len()
            && inst.all_hospitals[..split] == inst.existing_hospitals[..]
            && inst.all_hospitals[split..] == inst.candidate_hospitals[..];
        if !ordered {
            return Err(InstanceError::SiteListMismatch);
        }

        let mut max_new = inst.max_new_hospitals;
        if max_new > inst.candidate_hospitals.len() {
            log::warn!(
                "open budget {} exceeds candidate count {}, clamping",
                max_new,
                inst.candidate_hospitals.len()
            );
            max_new = inst.candidate_hospitals.len();
        }

        let n = inst.households.len();
        let num_sites = inst.all_hospitals.len();
        let mut population = Vec::with_capacity(n);
        let mut distances = Vec::with_capacity(n * num_sites);
        let mut within_range = Vec::with_capacity(n * num_sites);

        for h in &inst.households {
            let pop = *inst
                .population
                .get(h)
                .ok_or_else(|| InstanceError::MissingPopulation {
                    household: h.clone(),
                })?;
            population.push(pop);

            let dist_row =
                inst.travel_distances
                    .get(h)
                    .ok_or_else(|| InstanceError::MissingDistances {
                        household: h.clone(),
                    })?;
            let ind_row =
                inst.distance_indicators
                    .get(h)
                    .ok_or_else(|| InstanceError::MissingIndicators {
                        household: h.clone(),
                    })?;

            for site in &inst.all_hospitals {
                let d = *dist_row
                    .get(site)
                    .ok_or_else(|| InstanceError::MissingDistance {
                        household: h.clone(),
                        site: site.clone(),
                    })?;
                let w = *ind_row
                    .get(site)
                    .ok_or_else(|| InstanceError::MissingIndicator {
                        household: h.clone(),
                        site: site.clone(),
                    })?;
                distances.push(d);
                within_range.push(w);
            }
        }

        Ok(IndexedInstance {
            households: inst.households.clone(),
            sites: inst.all_hospitals.clone(),
            num_existing: split,
            population,
            distances,
            within_range,
            max_travel_distance: inst.max_travel_distance,
            max_new,
        })
    }

    pub fn num_households(&self) -> usize {
        self.households.len()
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn num_existing(&self) -> usize {
        self.num_existing
    }

    pub fn num_candidates(&self) -> usize {
        self.sites.len() - self.num_existing
    }

    /// Open budget, already clamped to the candidate count.
    pub fn max_new(&self) -> usize {
        self.max_new
    }

    pub fn max_travel_distance(&self) -> f64 {
        self.max_travel_distance
    }

    pub fn population(&self, i: usize) -> u32 {
        self.population[i]
    }

    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[i * self.sites.len() + j]
    }

    /// 1 iff the perturbed travel distance for pair `(i, j)` is within the
    /// allowed maximum.
    pub fn within_range(&self, i: usize, j: usize) -> bool {
        self.within_range[i * self.sites.len() + j] != 0
    }

    pub fn is_existing(&self, j: usize) -> bool {
        j < self.num_existing
    }

    pub fn household_id(&self, i: usize) -> &str {
        &self.households[i]
    }

    pub fn site_id(&self, j: usize) -> &str {
        &self.sites[j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, GenParams};

    fn small_instance() -> Instance {
        generate(&GenParams {
            seed: 3,
            households: 10,
            existing: 2,
            candidates: 5,
            ..GenParams::default()
        })
    }

    #[test]
    fn index_view_matches_wire_form() {
        let inst = small_instance();
        let idx = IndexedInstance::from_instance(&inst).unwrap();
        assert_eq!(idx.num_households(), 10);
        assert_eq!(idx.num_sites(), 7);
        assert_eq!(idx.num_existing(), 2);
        assert_eq!(idx.num_candidates(), 5);
        assert!(idx.is_existing(1));
        assert!(!idx.is_existing(2));
        for (i, h) in inst.households.iter().enumerate() {
            assert_eq!(idx.household_id(i), h);
            assert_eq!(idx.population(i), inst.population[h]);
            for (j, s) in inst.all_hospitals.iter().enumerate() {
                assert_eq!(idx.site_id(j), s);
                assert_eq!(idx.distance(i, j), inst.travel_distances[h][s]);
                assert_eq!(
                    idx.within_range(i, j),
                    inst.distance_indicators[h][s] != 0
                );
            }
        }
    }

    #[test]
    fn missing_population_is_rejected() {
        let mut inst = small_instance();
        inst.population.remove("H3");
        let err = IndexedInstance::from_instance(&inst).unwrap_err();
        assert!(matches!(err, InstanceError::MissingPopulation { household } if household == "H3"));
    }

    #[test]
    fn missing_distance_row_is_rejected() {
        let mut inst = small_instance();
        inst.travel_distances.remove("H1");
        let err = IndexedInstance::from_instance(&inst).unwrap_err();
        assert!(matches!(err, InstanceError::MissingDistances { household } if household == "H1"));
    }

    #[test]
    fn missing_distance_entry_is_rejected() {
        let mut inst = small_instance();
        inst.travel_distances.get_mut("H2").unwrap().remove("CJ4");
        let err = IndexedInstance::from_instance(&inst).unwrap_err();
        assert!(matches!(
            err,
            InstanceError::MissingDistance { household, site }
                if household == "H2" && site == "CJ4"
        ));
    }

    #[test]
    fn missing_indicator_entry_is_rejected() {
        let mut inst = small_instance();
        inst.distance_indicators.get_mut("H2").unwrap().remove("EJ1");
        let err = IndexedInstance::from_instance(&inst).unwrap_err();
        assert!(matches!(
            err,
            InstanceError::MissingIndicator { household, site }
                if household == "H2" && site == "EJ1"
        ));
    }

    #[test]
    fn site_list_mismatch_is_rejected() {
        let mut inst = small_instance();
        inst.all_hospitals.swap(0, 3);
        let err = IndexedInstance::from_instance(&inst).unwrap_err();
        assert!(matches!(err, InstanceError::SiteListMismatch));
    }

    #[test]
    fn nonpositive_max_distance_is_rejected() {
        let mut inst = small_instance();
        inst.max_travel_distance = 0.0;
        let err = IndexedInstance::from_instance(&inst).unwrap_err();
        assert!(matches!(err, InstanceError::NonPositiveMaxDistance { .. }));
    }

    #[test]
    fn oversized_budget_is_clamped() {
        let mut inst = small_instance();
        inst.max_new_hospitals = 99;
        let idx = IndexedInstance::from_instance(&inst).unwrap();
        assert_eq!(idx.max_new(), 5);
    }
}
