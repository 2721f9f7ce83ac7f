//! L-BFGS minimization of a scalar objective via argmin.

use std::cell::Cell;
use std::fmt;

use abcd_core::{Error, Result};
use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;

/// Relative step of the central-difference gradient.
const FD_STEP: f64 = 1e-7;

/// Stopping rules and memory of [`LbfgsOptimizer`].
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Iteration cap.
    pub max_iter: u64,
    /// Stop once the gradient norm falls below this.
    pub grad_tol: f64,
    /// Correction pairs kept for the inverse Hessian.
    pub memory: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_iter: 1000, grad_tol: 1e-8, memory: 10 }
    }
}

/// Best point found by [`LbfgsOptimizer::minimize`].
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best parameters.
    pub params: Vec<f64>,
    /// Objective at `params`.
    pub value: f64,
    /// Solver iterations taken.
    pub iterations: u64,
    /// Objective plus gradient calls.
    pub evaluations: usize,
    /// Whether the gradient or cost tolerance was met.
    pub converged: bool,
    /// argmin termination status, for logs.
    pub status: String,
}

impl fmt::Display for Minimum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "f={:.6} after {} iterations ({} evaluations, {})",
            self.value, self.iterations, self.evaluations, self.status
        )
    }
}

/// Scalar function of a parameter vector.
pub trait Objective {
    /// Objective at `params`.
    fn value(&self, params: &[f64]) -> Result<f64>;

    /// Central differences unless overridden.
    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let mut shifted = params.to_vec();
        (0..params.len())
            .map(|i| {
                let h = FD_STEP * params[i].abs().max(1.0);
                shifted[i] = params[i] + h;
                let up = self.value(&shifted)?;
                shifted[i] = params[i] - h;
                let down = self.value(&shifted)?;
                shifted[i] = params[i];
                Ok((up - down) / (2.0 * h))
            })
            .collect()
    }
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|g| g * g).sum::<f64>().sqrt()
}

/// Bridges an [`Objective`] to argmin, counting calls.
struct Problem<'a> {
    objective: &'a dyn Objective,
    calls: Cell<usize>,
}

impl Problem<'_> {
    fn count(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

fn solver_error(e: Error) -> argmin::core::Error {
    argmin::core::Error::msg(e.to_string())
}

impl CostFunction for Problem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Vec<f64>) -> std::result::Result<f64, argmin::core::Error> {
        self.count();
        self.objective.value(params).map_err(solver_error)
    }
}

impl Gradient for Problem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Vec<f64>) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        self.count();
        self.objective.gradient(params).map_err(solver_error)
    }
}

/// Limited-memory BFGS with a More-Thuente line search.
#[derive(Debug, Clone, Default)]
pub struct LbfgsOptimizer {
    config: OptimizerConfig,
}

impl LbfgsOptimizer {
    /// Optimizer with the given settings.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimizes `objective` from `start`.
    ///
    /// A run that hits `max_iter` still returns its best point with
    /// `converged` false; only solver failures are errors.
    pub fn minimize(&self, objective: &dyn Objective, start: &[f64]) -> Result<Minimum> {
        if start.is_empty() {
            return Err(Error::Validation("cannot minimize over zero parameters".into()));
        }
        let OptimizerConfig { max_iter, grad_tol, memory } = self.config;

        // The line search fails on a zero direction, so a stationary start returns as is.
        if norm(&objective.gradient(start)?) <= grad_tol {
            return Ok(Minimum {
                params: start.to_vec(),
                value: objective.value(start)?,
                iterations: 0,
                evaluations: 2,
                converged: true,
                status: "start is stationary".into(),
            });
        }

        // argmin's default cost tolerance is machine epsilon, too tight for chi-square values.
        let cost_tol = if grad_tol > 0.0 { (0.1 * grad_tol).max(1e-12) } else { 0.0 };
        let invalid = |e: argmin::core::Error| Error::Validation(format!("optimizer settings: {e}"));
        let solver = LBFGS::new(MoreThuenteLineSearch::new(), memory)
            .with_tolerance_grad(grad_tol)
            .map_err(invalid)?
            .with_tolerance_cost(cost_tol)
            .map_err(invalid)?;

        let problem = Problem { objective, calls: Cell::new(0) };
        let result = Executor::new(problem, solver)
            .configure(|state| state.param(start.to_vec()).max_iters(max_iter))
            .run()
            .map_err(|e| Error::Computation(format!("L-BFGS failed: {e}")))?;

        let state = result.state();
        let params = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| Error::Computation("L-BFGS returned no parameters".into()))?;
        let status = state.get_termination_status();
        let converged = matches!(
            status,
            TerminationStatus::Terminated(TerminationReason::SolverConverged | TerminationReason::TargetCostReached)
        );

        Ok(Minimum {
            params,
            value: state.get_best_cost(),
            iterations: state.get_iter(),
            evaluations: result.problem.problem.as_ref().map_or(0, |p| p.calls.get()),
            converged,
            status: status.to_string(),
        })
    }
}
