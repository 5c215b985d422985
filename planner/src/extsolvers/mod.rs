//! Narrow interface to an external MILP engine.
//!
//! Any engine that can create binary variables, add linear constraints
//! (optionally flagged for deferred enforcement), maximize a linear
//! objective and report a terminal status is substitutable here.

pub mod gurobi;
pub mod highs;

/// How a constraint should be handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Part of the model from the start.
    Hard,
    /// Hint that the engine may defer enforcement until a candidate
    /// solution violates the constraint. Engines without a lazy-constraint
    /// pool add the row upfront instead; correctness is unaffected.
    Deferred,
}

/// Terminal status reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Proved optimal.
    Optimal,
    /// Stopped at a limit (time, nodes, ...) with an incumbent solution.
    Feasible,
    /// The constraints admit no feasible point.
    Infeasible,
    Unbounded,
    /// Terminated without a usable solution or a proof.
    Unknown,
}

/// Result of one search run. `solution[k]` is the value of the `k`-th
/// created variable; empty when the engine found no incumbent.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub status: EngineStatus,
    pub objective: Option<f64>,
    pub node_count: Option<u64>,
    pub solution: Vec<f64>,
}

/// An engine error unrelated to infeasibility (licensing, resource
/// exhaustion, API failure). Never conflated with [`EngineStatus::Infeasible`].
#[derive(Debug, thiserror::Error)]
#[error("{backend}: {message}")]
pub struct EngineError {
    pub backend: &'static str,
    pub message: String,
}

pub trait MilpSolver {
    type Var: Copy;

    fn new() -> Self;

    /// Adds a binary variable with the given objective coefficient.
    fn add_binary_var(&mut self, obj: f64) -> Self::Var;

    /// Adds the linear constraint `lb <= sum coeffs[k] * idxs[k] <= ub`.
    /// Use `-inf()`/`inf()` for one-sided rows, `lb == ub` for equalities.
    fn add_constraint(
        &mut self,
        lb: f64,
        ub: f64,
        idxs: &[Self::Var],
        coeffs: &[f64],
        kind: ConstraintKind,
    );

    fn set_maximize(&mut self);

    fn set_time_limit(&mut self, seconds: f64);

    /// Runs the search once, blocking until the engine terminates.
    fn solve(&mut self) -> Result<EngineOutcome, EngineError>;

    fn inf(&self) -> f64;

    fn num_vars(&self) -> usize;

    fn num_constraints(&self) -> usize;
}

/// Recording fake engine for formulation tests: keeps every row verbatim
/// and returns a scripted outcome from [`MilpSolver::solve`].
#[cfg(test)]
pub mod recording {
    use super::*;

    #[derive(Debug, Clone)]
    pub struct Row {
        pub lb: f64,
        pub ub: f64,
        pub idxs: Vec<usize>,
        pub coeffs: Vec<f64>,
        pub kind: ConstraintKind,
    }

    pub struct RecordingSolver {
        pub obj_coeffs: Vec<f64>,
        pub rows: Vec<Row>,
        pub maximize: bool,
        pub time_limit: Option<f64>,
        pub scripted: Option<Result<EngineOutcome, EngineError>>,
    }

    impl MilpSolver for RecordingSolver {
        type Var = usize;

        fn new() -> Self {
            RecordingSolver {
                obj_coeffs: Vec::new(),
                rows: Vec::new(),
                maximize: false,
                time_limit: None,
                scripted: None,
            }
        }

        fn add_binary_var(&mut self, obj: f64) -> usize {
            self.obj_coeffs.push(obj);
            self.obj_coeffs.len() - 1
        }

        fn add_constraint(
            &mut self,
            lb: f64,
            ub: f64,
            idxs: &[usize],
            coeffs: &[f64],
            kind: ConstraintKind,
        ) {
            assert_eq!(idxs.len(), coeffs.len());
            self.rows.push(Row {
                lb,
                ub,
                idxs: idxs.to_vec(),
                coeffs: coeffs.to_vec(),
                kind,
            });
        }

        fn set_maximize(&mut self) {
            self.maximize = true;
        }

        fn set_time_limit(&mut self, seconds: f64) {
            self.time_limit = Some(seconds);
        }

        fn solve(&mut self) -> Result<EngineOutcome, EngineError> {
            self.scripted.take().unwrap_or(Ok(EngineOutcome {
                status: EngineStatus::Unknown,
                objective: None,
                node_count: None,
                solution: vec![],
            }))
        }

        fn inf(&self) -> f64 {
            f64::INFINITY
        }

        fn num_vars(&self) -> usize {
            self.obj_coeffs.len()
        }

        fn num_constraints(&self) -> usize {
            self.rows.len()
        }
    }
}
