//! HiGHS backend, talking to the raw C API through `highs-sys`.
//!
//! The session owns the `Highs` pointer for one build-and-solve pass and
//! destroys it on drop, on every exit path. HiGHS has no lazy-constraint
//! pool, so [`ConstraintKind::Deferred`] rows are added upfront; the hint
//! only changes work distribution, never the feasible set.

#![cfg(feature = "highs")]

use std::convert::TryFrom;
use std::ffi::c_void;
use std::fmt::{Debug, Formatter};
use std::os::raw::c_int;

use highs_sys::*;

use super::{ConstraintKind, EngineError, EngineOutcome, EngineStatus, MilpSolver};

const BACKEND: &str = "highs";

pub struct HighsSolver {
    ptr: *mut c_void,
}

impl Drop for HighsSolver {
    fn drop(&mut self) {
        unsafe {
            Highs_destroy(self.ptr);
        }
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HighsSolver {
    fn int_info(&self, name: &std::ffi::CStr) -> HighsInt {
        let mut value: HighsInt = 0;
        unsafe { Highs_getIntInfoValue(self.ptr, name.as_ptr(), &mut value) };
        value
    }

    fn double_info(&self, name: &std::ffi::CStr) -> f64 {
        let mut value = 0.0f64;
        unsafe { Highs_getDoubleInfoValue(self.ptr, name.as_ptr(), &mut value) };
        value
    }

    fn node_count(&self) -> Option<u64> {
        let mut nodes: i64 = 0;
        let ret = unsafe { Highs_getInt64InfoValue(self.ptr, c"mip_node_count".as_ptr(), &mut nodes) };
        (ret == STATUS_OK && nodes >= 0).then_some(nodes as u64)
    }

    fn primal_feasible(&self) -> bool {
        // kHighsSolutionStatusFeasible == 2
        self.int_info(c"primal_solution_status") == 2
    }

    fn extract_solution(&self) -> Vec<f64> {
        let num_cols = unsafe { Highs_getNumCol(self.ptr) } as usize;
        let mut values = vec![0.0; num_cols];
        let null = std::ptr::null_mut();
        unsafe { Highs_getSolution(self.ptr, values.as_mut_ptr(), null, null, null) };
        values
    }
}

impl MilpSolver for HighsSolver {
    type Var = HighsInt;

    fn new() -> Self {
        let ptr = unsafe { Highs_create() };
        unsafe {
            Highs_setStringOptionValue(ptr, c"presolve".as_ptr(), c"on".as_ptr());
            Highs_setBoolOptionValue(ptr, c"output_flag".as_ptr(), 0);
        }
        HighsSolver { ptr }
    }

    fn add_binary_var(&mut self, obj: f64) -> HighsInt {
        let col = unsafe { Highs_getNumCol(self.ptr) };
        let retval = unsafe {
            Highs_addCol(self.ptr, obj, 0.0, 1.0, 0, std::ptr::null(), std::ptr::null())
        };
        assert!(HighsStatus::try_from(retval) == Ok(HighsStatus::OK));
        unsafe { Highs_changeColIntegrality(self.ptr, col, kHighsVarTypeInteger) };
        col
    }

    fn add_constraint(
        &mut self,
        lb: f64,
        ub: f64,
        idxs: &[HighsInt],
        coeffs: &[f64],
        _kind: ConstraintKind,
    ) {
        assert!(idxs.len() == coeffs.len());
        let retval = unsafe {
            Highs_addRow(
                self.ptr,
                lb,
                ub,
                idxs.len() as HighsInt,
                idxs.as_ptr(),
                coeffs.as_ptr(),
            )
        };
        assert!(HighsStatus::try_from(retval) == Ok(HighsStatus::OK));
    }

    fn set_maximize(&mut self) {
        unsafe { Highs_changeObjectiveSense(self.ptr, kHighsObjSenseMaximize) };
    }

    fn set_time_limit(&mut self, seconds: f64) {
        unsafe { Highs_setDoubleOptionValue(self.ptr, c"time_limit".as_ptr(), seconds) };
    }

    fn solve(&mut self) -> Result<EngineOutcome, EngineError> {
        unsafe { Highs_run(self.ptr) };
        let raw = unsafe { Highs_getModelStatus(self.ptr) };
        let model_status = HighsModelStatus::try_from(raw).map_err(|e| EngineError {
            backend: BACKEND,
            message: format!("{e:?}"),
        })?;

        let status = match model_status {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => EngineStatus::Optimal,
            HighsModelStatus::Infeasible => EngineStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                EngineStatus::Unbounded
            }
            HighsModelStatus::ReachedTimeLimit
            | HighsModelStatus::ReachedIterationLimit
            | HighsModelStatus::ObjectiveBound
            | HighsModelStatus::ObjectiveTarget => {
                if self.primal_feasible() {
                    EngineStatus::Feasible
                } else {
                    EngineStatus::Unknown
                }
            }
            HighsModelStatus::NotSet | HighsModelStatus::Unknown => EngineStatus::Unknown,
            HighsModelStatus::LoadError
            | HighsModelStatus::ModelError
            | HighsModelStatus::PresolveError
            | HighsModelStatus::SolveError
            | HighsModelStatus::PostsolveError => {
                return Err(EngineError {
                    backend: BACKEND,
                    message: format!("solve failed with model status {model_status:?}"),
                });
            }
        };

        let has_incumbent = matches!(status, EngineStatus::Optimal | EngineStatus::Feasible);
        Ok(EngineOutcome {
            status,
            objective: has_incumbent.then(|| self.double_info(c"objective_function_value")),
            node_count: self.node_count(),
            solution: if has_incumbent {
                self.extract_solution()
            } else {
                vec![]
            },
        })
    }

    fn inf(&self) -> f64 {
        unsafe { Highs_getInfinity(self.ptr) }
    }

    fn num_vars(&self) -> usize {
        unsafe { Highs_getNumCol(self.ptr) as usize }
    }

    fn num_constraints(&self) -> usize {
        unsafe { Highs_getNumRow(self.ptr) as usize }
    }
}

/// The terminal states of a HiGHS run.
#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Ord, Eq)]
pub enum HighsModelStatus {
    NotSet = MODEL_STATUS_NOTSET as isize,
    LoadError = MODEL_STATUS_LOAD_ERROR as isize,
    ModelError = MODEL_STATUS_MODEL_ERROR as isize,
    PresolveError = MODEL_STATUS_PRESOLVE_ERROR as isize,
    SolveError = MODEL_STATUS_SOLVE_ERROR as isize,
    PostsolveError = MODEL_STATUS_POSTSOLVE_ERROR as isize,
    ModelEmpty = MODEL_STATUS_MODEL_EMPTY as isize,
    Infeasible = MODEL_STATUS_INFEASIBLE as isize,
    UnboundedOrInfeasible = MODEL_STATUS_UNBOUNDED_OR_INFEASIBLE as isize,
    Unbounded = MODEL_STATUS_UNBOUNDED as isize,
    Optimal = MODEL_STATUS_OPTIMAL as isize,
    ObjectiveBound = MODEL_STATUS_OBJECTIVE_BOUND as isize,
    ObjectiveTarget = MODEL_STATUS_OBJECTIVE_TARGET as isize,
    ReachedTimeLimit = MODEL_STATUS_REACHED_TIME_LIMIT as isize,
    ReachedIterationLimit = MODEL_STATUS_REACHED_ITERATION_LIMIT as isize,
    Unknown = MODEL_STATUS_UNKNOWN as isize,
}

/// An unexpected status code from the C API.
#[derive(PartialEq, Clone, Copy)]
pub struct InvalidStatus(pub c_int);

impl Debug for InvalidStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not a valid HiGHS status code", self.0)
    }
}

impl TryFrom<c_int> for HighsModelStatus {
    type Error = InvalidStatus;

    fn try_from(value: c_int) -> Result<Self, InvalidStatus> {
        match value {
            MODEL_STATUS_NOTSET => Ok(Self::NotSet),
            MODEL_STATUS_LOAD_ERROR => Ok(Self::LoadError),
            MODEL_STATUS_MODEL_ERROR => Ok(Self::ModelError),
            MODEL_STATUS_PRESOLVE_ERROR => Ok(Self::PresolveError),
            MODEL_STATUS_SOLVE_ERROR => Ok(Self::SolveError),
            MODEL_STATUS_POSTSOLVE_ERROR => Ok(Self::PostsolveError),
            MODEL_STATUS_MODEL_EMPTY => Ok(Self::ModelEmpty),
            MODEL_STATUS_INFEASIBLE => Ok(Self::Infeasible),
            MODEL_STATUS_UNBOUNDED => Ok(Self::Unbounded),
            MODEL_STATUS_UNBOUNDED_OR_INFEASIBLE => Ok(Self::UnboundedOrInfeasible),
            MODEL_STATUS_OPTIMAL => Ok(Self::Optimal),
            MODEL_STATUS_OBJECTIVE_BOUND => Ok(Self::ObjectiveBound),
            MODEL_STATUS_OBJECTIVE_TARGET => Ok(Self::ObjectiveTarget),
            MODEL_STATUS_REACHED_TIME_LIMIT => Ok(Self::ReachedTimeLimit),
            MODEL_STATUS_REACHED_ITERATION_LIMIT => Ok(Self::ReachedIterationLimit),
            MODEL_STATUS_UNKNOWN => Ok(Self::Unknown),
            n => Err(InvalidStatus(n)),
        }
    }
}

/// The status of one HiGHS API call.
#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Ord, Eq)]
pub enum HighsStatus {
    OK = 0,
    Warning = 1,
    Error = 2,
}

impl TryFrom<c_int> for HighsStatus {
    type Error = InvalidStatus;

    fn try_from(value: c_int) -> Result<Self, InvalidStatus> {
        match value {
            STATUS_OK => Ok(HighsStatus::OK),
            STATUS_WARNING => Ok(HighsStatus::Warning),
            STATUS_ERROR => Ok(HighsStatus::Error),
            n => Err(InvalidStatus(n)),
        }
    }
}
