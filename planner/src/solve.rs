//! Solve orchestration: one blocking engine run per invocation, wall-clock
//! timed, with the engine's terminal status mapped into a small result
//! taxonomy. Infeasibility is a reported outcome, not an error; engine
//! failures are reported distinctly and never conflated with it.

use std::time::{Duration, Instant};

use crate::extsolvers::{EngineStatus, MilpSolver};
use crate::milp::CoverageModel;

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// Proved optimal.
    Optimal,
    /// Feasible incumbent, stopped at an engine limit.
    Feasible,
    /// No feasible point exists. For this model that can only happen when
    /// the fixed-open set conflicts with the other constraints, since the
    /// empty assignment is otherwise always feasible.
    Infeasible,
    /// Engine failure (licensing, resources, numerics) or a terminal
    /// status with neither a solution nor a proof.
    Error(String),
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Feasible => write!(f, "Feasible (limit reached)"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Summary of one solve attempt.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    pub status: SolveStatus,
    /// Population covered; `None` unless an incumbent exists.
    pub objective: Option<f64>,
    pub solve_time: Duration,
    pub nodes: Option<u64>,
}

/// Runs the engine once on a built formulation.
///
/// Returns the summary together with the incumbent solution vector in
/// variable-creation order (empty when there is none). Any time limit must
/// be set here, before the call; the engine enforces it internally.
pub fn solve_formulation<S: MilpSolver>(
    model: &mut CoverageModel<S>,
    time_limit: Option<f64>,
) -> (SolveSummary, Vec<f64>) {
    #[cfg(feature = "prof")]
    let _p = hprof::enter("solve");

    if let Some(seconds) = time_limit {
        model.solver.set_time_limit(seconds);
    }

    let start = Instant::now();
    let result = model.solver.solve();
    let solve_time = start.elapsed();

    match result {
        Ok(outcome) => {
            let status = match outcome.status {
                EngineStatus::Optimal => SolveStatus::Optimal,
                EngineStatus::Feasible => SolveStatus::Feasible,
                EngineStatus::Infeasible => SolveStatus::Infeasible,
                EngineStatus::Unbounded => {
                    SolveStatus::Error("engine reported unbounded".to_string())
                }
                EngineStatus::Unknown => {
                    SolveStatus::Error("engine terminated without a solution".to_string())
                }
            };
            log::info!(
                "solve finished: {} in {:.2}s, {:?} nodes",
                status,
                solve_time.as_secs_f64(),
                outcome.node_count
            );
            (
                SolveSummary {
                    status,
                    objective: outcome.objective,
                    solve_time,
                    nodes: outcome.node_count,
                },
                outcome.solution,
            )
        }
        Err(err) => {
            log::error!("engine failure: {err}");
            (
                SolveSummary {
                    status: SolveStatus::Error(err.to_string()),
                    objective: None,
                    solve_time,
                    nodes: None,
                },
                vec![],
            )
        }
    }
}
