//! Maximum-coverage facility-location formulation.
//!
//! One binary `open` variable per site, one binary `assign` variable per
//! household-site pair, objective = population covered. The dense and
//! sparse/lazy variants share one assembly routine and differ only in the
//! per-pair distance-row emission policy: dense emits `assign <= indicator`
//! for every pair, sparse emits `assign <= 0` for infeasible pairs only and
//! flags those rows for deferred enforcement. At the reference scale most
//! pairs are infeasible, so the sparse variant's upfront row count is a
//! small fraction of the dense one's.

use coverloc_structs::index::IndexedInstance;

use crate::extsolvers::{ConstraintKind, MilpSolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulationMode {
    /// One distance row per pair, including trivially satisfied ones.
    Dense,
    /// Distance rows only where assignment is infeasible, deferred.
    SparseLazy,
}

impl FormulationMode {
    /// Distance-row emission policy: `(upper bound, kind)` for a pair with
    /// the given feasibility, or `None` for no row. Feasible pairs need no
    /// row in sparse mode since the binary domain already permits
    /// assignment.
    fn distance_row(self, within_range: bool) -> Option<(f64, ConstraintKind)> {
        match self {
            FormulationMode::Dense => {
                let ub = if within_range { 1.0 } else { 0.0 };
                Some((ub, ConstraintKind::Hard))
            }
            FormulationMode::SparseLazy => {
                (!within_range).then_some((0.0, ConstraintKind::Deferred))
            }
        }
    }
}

/// A built formulation: the engine session plus the variable layout.
///
/// Variable creation order is fixed: `open[0..num_sites]` (existing sites
/// first), then `assign[i, j]` household-major, so solution vectors from
/// the engine can be addressed positionally.
pub struct CoverageModel<S: MilpSolver> {
    pub solver: S,
    pub open: Vec<S::Var>,
    pub assign: Vec<S::Var>,
    num_households: usize,
    num_sites: usize,
}

impl<S: MilpSolver> CoverageModel<S> {
    pub fn num_vars(&self) -> usize {
        self.solver.num_vars()
    }

    pub fn num_constraints(&self) -> usize {
        self.solver.num_constraints()
    }

    /// Value of `open[site]` in an engine solution vector.
    pub fn open_value(&self, solution: &[f64], j: usize) -> f64 {
        solution[j]
    }

    /// Value of `assign[household, site]` in an engine solution vector.
    pub fn assign_value(&self, solution: &[f64], i: usize, j: usize) -> f64 {
        solution[self.num_sites + i * self.num_sites + j]
    }

    pub fn num_households(&self) -> usize {
        self.num_households
    }

    pub fn num_sites(&self) -> usize {
        self.num_sites
    }
}

/// Builds the coverage MILP for `inst` into a fresh engine session.
///
/// Rows are streamed into the engine through two reused buffers; nothing
/// pair-sized is materialized beyond the assignment variable handles the
/// engine interface requires.
pub fn build_formulation<S: MilpSolver>(
    inst: &IndexedInstance,
    mode: FormulationMode,
) -> CoverageModel<S> {
    #[cfg(feature = "prof")]
    let _p = hprof::enter("build formulation");

    let n = inst.num_households();
    let num_sites = inst.num_sites();
    let num_existing = inst.num_existing();

    let mut lp = S::new();
    lp.set_maximize();
    let inf = lp.inf();

    // Variables. Objective: maximize sum of population[i] * assign[i, j];
    // open variables carry no objective weight.
    let open: Vec<S::Var> = (0..num_sites).map(|_| lp.add_binary_var(0.0)).collect();
    let mut assign: Vec<S::Var> = Vec::with_capacity(n * num_sites);
    for i in 0..n {
        let pop = f64::from(inst.population(i));
        for _ in 0..num_sites {
            assign.push(lp.add_binary_var(pop));
        }
    }

    let mut idxs: Vec<S::Var> = Vec::with_capacity(n + 1);
    let mut coeffs: Vec<f64> = Vec::with_capacity(n + 1);

    // Existing sites are open by fiat, not by decision.
    for &var in &open[..num_existing] {
        lp.add_constraint(1.0, 1.0, &[var], &[1.0], ConstraintKind::Hard);
    }

    // Budget: at most max_new candidate sites may open.
    idxs.extend_from_slice(&open[num_existing..]);
    coeffs.resize(idxs.len(), 1.0);
    lp.add_constraint(-inf, inst.max_new() as f64, &idxs, &coeffs, ConstraintKind::Hard);

    // Linking: assignments to a closed site are impossible. The bound n is
    // the tightest valid big-M, since at most every household can assign
    // to one site.
    for (j, &open_var) in open.iter().enumerate() {
        idxs.clear();
        coeffs.clear();
        for i in 0..n {
            idxs.push(assign[i * num_sites + j]);
            coeffs.push(1.0);
        }
        idxs.push(open_var);
        coeffs.push(-(n as f64));
        lp.add_constraint(-inf, 0.0, &idxs, &coeffs, ConstraintKind::Hard);
    }

    // Single assignment: each household is served by at most one site.
    // At most, not exactly: leaving a household uncovered is always
    // feasible.
    for i in 0..n {
        idxs.clear();
        coeffs.clear();
        idxs.extend_from_slice(&assign[i * num_sites..(i + 1) * num_sites]);
        coeffs.resize(num_sites, 1.0);
        lp.add_constraint(-inf, 1.0, &idxs, &coeffs, ConstraintKind::Hard);
    }

    // Distance feasibility, per the mode's emission policy.
    let mut distance_rows = 0usize;
    let mut deferred_rows = 0usize;
    for i in 0..n {
        for j in 0..num_sites {
            if let Some((ub, kind)) = mode.distance_row(inst.within_range(i, j)) {
                lp.add_constraint(-inf, ub, &[assign[i * num_sites + j]], &[1.0], kind);
                distance_rows += 1;
                if kind == ConstraintKind::Deferred {
                    deferred_rows += 1;
                }
            }
        }
    }

    log::info!(
        "built {:?} formulation: {} vars, {} rows ({} distance rows, {} deferred)",
        mode,
        lp.num_vars(),
        lp.num_constraints(),
        distance_rows,
        deferred_rows
    );

    CoverageModel {
        solver: lp,
        open,
        assign,
        num_households: n,
        num_sites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extsolvers::recording::RecordingSolver;
    use coverloc_structs::generator::{generate, GenParams};
    use coverloc_structs::index::IndexedInstance;

    fn small_indexed() -> IndexedInstance {
        let inst = generate(&GenParams {
            seed: 11,
            households: 20,
            existing: 2,
            candidates: 6,
            ..GenParams::default()
        });
        IndexedInstance::from_instance(&inst).unwrap()
    }

    fn infeasible_pairs(inst: &IndexedInstance) -> usize {
        let mut count = 0;
        for i in 0..inst.num_households() {
            for j in 0..inst.num_sites() {
                if !inst.within_range(i, j) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn variable_layout() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::Dense);
        assert_eq!(model.open.len(), 8);
        assert_eq!(model.assign.len(), 20 * 8);
        assert_eq!(model.num_vars(), 8 + 20 * 8);
        assert!(model.solver.maximize);
        // Objective: open vars free, assign vars weighted by population.
        for j in 0..8 {
            assert_eq!(model.solver.obj_coeffs[model.open[j]], 0.0);
        }
        for i in 0..20 {
            for j in 0..8 {
                assert_eq!(
                    model.solver.obj_coeffs[model.assign[i * 8 + j]],
                    f64::from(inst.population(i))
                );
            }
        }
    }

    #[test]
    fn dense_row_count() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::Dense);
        let (n, s, m) = (20, 8, 2);
        assert_eq!(model.num_constraints(), m + 1 + s + n + n * s);
        assert!(model
            .solver
            .rows
            .iter()
            .all(|r| r.kind == ConstraintKind::Hard));
    }

    #[test]
    fn sparse_row_count_and_deferral() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::SparseLazy);
        let (n, s, m) = (20, 8, 2);
        let infeasible = infeasible_pairs(&inst);
        assert!(infeasible > 0, "test instance should have infeasible pairs");
        assert_eq!(model.num_constraints(), m + 1 + s + n + infeasible);
        let deferred: Vec<_> = model
            .solver
            .rows
            .iter()
            .filter(|r| r.kind == ConstraintKind::Deferred)
            .collect();
        assert_eq!(deferred.len(), infeasible);
        // Every deferred row pins a single assignment variable to zero.
        for row in deferred {
            assert_eq!(row.ub, 0.0);
            assert_eq!(row.idxs.len(), 1);
            assert_eq!(row.coeffs, vec![1.0]);
        }
    }

    #[test]
    fn existing_sites_are_fixed_open() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::SparseLazy);
        for j in 0..inst.num_existing() {
            let row = &model.solver.rows[j];
            assert_eq!((row.lb, row.ub), (1.0, 1.0));
            assert_eq!(row.idxs, vec![model.open[j]]);
        }
    }

    #[test]
    fn budget_row_covers_candidates_only() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::SparseLazy);
        let row = &model.solver.rows[inst.num_existing()];
        assert_eq!(row.ub, inst.max_new() as f64);
        assert_eq!(row.idxs, model.open[inst.num_existing()..].to_vec());
        assert!(row.coeffs.iter().all(|&c| c == 1.0));
    }

    #[test]
    fn linking_rows_use_household_count_bound() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::SparseLazy);
        let first_linking = inst.num_existing() + 1;
        for j in 0..inst.num_sites() {
            let row = &model.solver.rows[first_linking + j];
            assert_eq!(row.ub, 0.0);
            assert_eq!(row.idxs.len(), inst.num_households() + 1);
            assert_eq!(*row.idxs.last().unwrap(), model.open[j]);
            assert_eq!(*row.coeffs.last().unwrap(), -(inst.num_households() as f64));
            // A fully loaded open site satisfies the row: n * 1 - n <= 0.
            let slack: f64 = row.coeffs.iter().sum::<f64>();
            assert_eq!(slack, 0.0);
        }
    }

    #[test]
    fn single_assignment_rows() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::SparseLazy);
        let first = inst.num_existing() + 1 + inst.num_sites();
        for i in 0..inst.num_households() {
            let row = &model.solver.rows[first + i];
            assert_eq!(row.ub, 1.0);
            assert_eq!(row.idxs.len(), inst.num_sites());
        }
    }

    #[test]
    fn dense_distance_rows_carry_indicator_bound() {
        let inst = small_indexed();
        let model = build_formulation::<RecordingSolver>(&inst, FormulationMode::Dense);
        let first = inst.num_existing() + 1 + inst.num_sites() + inst.num_households();
        let mut k = first;
        for i in 0..inst.num_households() {
            for j in 0..inst.num_sites() {
                let row = &model.solver.rows[k];
                let expect = if inst.within_range(i, j) { 1.0 } else { 0.0 };
                assert_eq!(row.ub, expect);
                assert_eq!(row.idxs, vec![model.assign[i * inst.num_sites() + j]]);
                k += 1;
            }
        }
    }
}
