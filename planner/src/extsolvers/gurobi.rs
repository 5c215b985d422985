//! Gurobi backend via `grb`. Requires a licensed Gurobi installation, so
//! this stays behind the non-default `gurobi` feature.
//!
//! Deferred rows get the `Lazy` constraint attribute, which moves them to
//! Gurobi's lazy-constraint pool: they are only pulled into the active
//! model when an incumbent violates them.

#![cfg(feature = "gurobi")]

use std::cell::RefCell;

use grb::{expr::LinExpr, prelude::*};

use super::{ConstraintKind, EngineError, EngineOutcome, EngineStatus, MilpSolver};

const BACKEND: &str = "gurobi";

thread_local! {
    static GLOBAL_GUROBI_ENV: RefCell<Option<grb::Env>> = const { RefCell::new(None) };
}

pub struct GurobiSolver {
    grb: grb::Model,
    added_vars: Vec<grb::Var>,
    num_constrs: usize,
}

impl MilpSolver for GurobiSolver {
    type Var = grb::Var;

    fn new() -> Self {
        let mut grb = GLOBAL_GUROBI_ENV.with_borrow_mut(|e| {
            if e.is_none() {
                *e = Some(grb::Env::new("").unwrap());
            }
            let env = e.as_ref().unwrap();
            grb::Model::with_env("coverloc", env).unwrap()
        });
        grb.set_param(grb::param::OutputFlag, 0).unwrap();
        GurobiSolver {
            grb,
            added_vars: Vec::new(),
            num_constrs: 0,
        }
    }

    fn add_binary_var(&mut self, obj: f64) -> grb::Var {
        let model = &mut self.grb;
        let var = add_binvar!(model, obj: obj).unwrap();
        self.added_vars.push(var);
        var
    }

    fn add_constraint(
        &mut self,
        lb: f64,
        ub: f64,
        idxs: &[grb::Var],
        coeffs: &[f64],
        kind: ConstraintKind,
    ) {
        let mut expr = LinExpr::new();
        for (v, c) in idxs.iter().zip(coeffs.iter()) {
            expr.add_term(*c, *v);
        }
        let constr = if lb == ub {
            self.grb.add_constr("", c!(expr == lb)).unwrap()
        } else if lb == -self.inf() {
            self.grb.add_constr("", c!(expr <= ub)).unwrap()
        } else if ub == self.inf() {
            self.grb.add_constr("", c!(expr >= lb)).unwrap()
        } else {
            panic!("range constraints not supported");
        };
        if kind == ConstraintKind::Deferred {
            self.grb.set_obj_attr(grb::attr::Lazy, &constr, 1).unwrap();
        }
        self.num_constrs += 1;
    }

    fn set_maximize(&mut self) {
        self.grb
            .set_attr(grb::attr::ModelSense, ModelSense::Maximize)
            .unwrap();
    }

    fn set_time_limit(&mut self, seconds: f64) {
        self.grb.set_param(grb::param::TimeLimit, seconds).unwrap();
    }

    fn solve(&mut self) -> Result<EngineOutcome, EngineError> {
        let api = |e: grb::Error| EngineError {
            backend: BACKEND,
            message: e.to_string(),
        };

        self.grb.optimize().map_err(api)?;
        let grb_status = self.grb.status().map_err(api)?;
        let sol_count: i32 = self.grb.get_attr(grb::attr::SolCount).map_err(api)?;

        let status = match grb_status {
            Status::Optimal => EngineStatus::Optimal,
            Status::Infeasible => EngineStatus::Infeasible,
            Status::Unbounded | Status::InfOrUnbd => EngineStatus::Unbounded,
            Status::CutOff
            | Status::IterationLimit
            | Status::NodeLimit
            | Status::TimeLimit
            | Status::SolutionLimit
            | Status::Interrupted => {
                if sol_count > 0 {
                    EngineStatus::Feasible
                } else {
                    EngineStatus::Unknown
                }
            }
            other => {
                return Err(EngineError {
                    backend: BACKEND,
                    message: format!("solve failed with status {other:?}"),
                });
            }
        };

        let has_incumbent = matches!(status, EngineStatus::Optimal | EngineStatus::Feasible);
        let objective = if has_incumbent {
            Some(self.grb.get_attr(grb::attr::ObjVal).map_err(api)?)
        } else {
            None
        };
        let solution = if has_incumbent {
            self.grb
                .get_obj_attr_batch(grb::attr::X, self.added_vars.iter().cloned())
                .map_err(api)?
        } else {
            vec![]
        };
        let node_count: f64 = self.grb.get_attr(grb::attr::NodeCount).map_err(api)?;

        Ok(EngineOutcome {
            status,
            objective,
            node_count: Some(node_count as u64),
            solution,
        })
    }

    fn inf(&self) -> f64 {
        f64::INFINITY
    }

    fn num_vars(&self) -> usize {
        self.added_vars.len()
    }

    fn num_constraints(&self) -> usize {
        self.num_constrs
    }
}
