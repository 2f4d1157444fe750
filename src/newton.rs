//! Newton-Raphson solver for square systems of nonlinear equations.
//!
//! Solves `F(x) = 0` for `x ∈ ℝⁿ` given the n component equations, an
//! n×n grid of partial-derivative callables, and an initial guess. Each
//! iteration linearizes the system at the current iterate and steps by
//! `Δx = J⁻¹ F(x)` via explicit matrix inversion.

use log::info;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::config::{self, Snapshot};
use crate::process_log::{LogError, ProcessLog, Record};
use crate::solver::Solver;

/// A component equation or partial derivative of the system.
pub type SystemFn = Box<dyn Fn(&DVector<f64>) -> f64>;

/// Errors from constructing or running a Newton-Raphson solver.
#[derive(Debug, Error)]
pub enum NewtonError {
    #[error("system must contain at least one equation")]
    InvalidEquations,

    #[error("jacobian shape {rows}x{cols} does not match system dimension {expected}")]
    InvalidJacobian {
        rows: usize,
        cols: usize,
        expected: usize,
    },

    #[error("initial guess has length {found}, expected {expected}")]
    InvalidGuess { expected: usize, found: usize },

    #[error("jacobian is singular at iteration {iteration}")]
    SingularJacobian { iteration: usize },

    #[error(transparent)]
    Log(#[from] LogError),
}

/// Indicates whether the solver met its tolerance or ran out of budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The step norm dropped below the tolerance.
    Converged,
    /// Reached the iteration limit; the estimate is the last iterate.
    MaxIters,
}

/// The result of a Newton-Raphson solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Final estimate of the system solution.
    pub x: DVector<f64>,
    /// Whether the estimate satisfied the convergence test.
    pub status: Status,
    /// Iterations performed when the solver finished.
    pub iterations: usize,
}

/// Iteration controls for the Newton-Raphson solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    /// Iteration budget; exhausting it is reported via [`Status::MaxIters`].
    pub max_iter: usize,
    /// Step-norm tolerance; `None` uses the configured absolute tolerance.
    pub tol: Option<f64>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: None,
        }
    }
}

/// Multivariate Newton-Raphson solver with an explicit Jacobian.
pub struct NewtonRaphson {
    equations: Vec<SystemFn>,
    jacobian: Vec<Vec<SystemFn>>,
    guess: DVector<f64>,
    config: Snapshot,
    log: ProcessLog,
}

impl NewtonRaphson {
    /// Creates a solver with iteration logging enabled and verbosity taken
    /// from the process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system is empty, the Jacobian grid is not
    /// n×n, or the guess length does not match the system dimension.
    pub fn new(
        equations: Vec<SystemFn>,
        jacobian: Vec<Vec<SystemFn>>,
        initial_guess: Vec<f64>,
    ) -> Result<Self, NewtonError> {
        let verbose = config::verbose();
        Self::with_flags(equations, jacobian, initial_guess, verbose, true)
    }

    /// Creates a solver with explicit verbosity and logging flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the system is empty, the Jacobian grid is not
    /// n×n, or the guess length does not match the system dimension.
    pub fn with_flags(
        equations: Vec<SystemFn>,
        jacobian: Vec<Vec<SystemFn>>,
        initial_guess: Vec<f64>,
        verbose: bool,
        logging: bool,
    ) -> Result<Self, NewtonError> {
        let n = equations.len();
        if n == 0 {
            return Err(NewtonError::InvalidEquations);
        }

        if jacobian.len() != n {
            return Err(NewtonError::InvalidJacobian {
                rows: jacobian.len(),
                cols: jacobian.first().map_or(0, Vec::len),
                expected: n,
            });
        }
        for row in &jacobian {
            if row.len() != n {
                return Err(NewtonError::InvalidJacobian {
                    rows: jacobian.len(),
                    cols: row.len(),
                    expected: n,
                });
            }
        }

        if initial_guess.len() != n {
            return Err(NewtonError::InvalidGuess {
                expected: n,
                found: initial_guess.len(),
            });
        }

        let mut config = config::snapshot();
        config.verbose = verbose;

        if config.verbose {
            info!("[newton] initialized with {n} equations and a {n}x{n} jacobian");
        }

        Ok(Self {
            equations,
            jacobian,
            guess: DVector::from_vec(initial_guess),
            config,
            log: ProcessLog::new(logging),
        })
    }

    /// Evaluates the Jacobian matrix at `x`, at the configured precision.
    #[must_use]
    pub fn evaluate_jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let n = self.equations.len();
        DMatrix::from_fn(n, n, |i, j| self.config.quantize((self.jacobian[i][j])(x)))
    }

    fn evaluate_residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.equations.len(),
            self.equations.iter().map(|f| self.config.quantize(f(x))),
        )
    }

    /// Runs Newton's iteration with explicit controls.
    ///
    /// Budget exhaustion is not an error: the last iterate is returned with
    /// [`Status::MaxIters`] and the caller decides how to proceed.
    ///
    /// # Errors
    ///
    /// Returns [`NewtonError::SingularJacobian`] if the Jacobian
    /// determinant is exactly zero at any iterate.
    #[allow(clippy::float_cmp)]
    pub fn solve_with(&mut self, controls: &Controls) -> Result<Solution, NewtonError> {
        let tol = controls.tol.unwrap_or(self.config.abs_tol);
        let config = self.config;

        if config.verbose {
            info!(
                "[newton] starting (max_iter={}, tol={tol:.1e})",
                controls.max_iter
            );
        }

        let mut x = self.guess.map(|v| config.quantize(v));

        for iteration in 1..=controls.max_iter {
            let residuals = self.evaluate_residuals(&x);
            let jac = self.evaluate_jacobian(&x);

            if jac.determinant() == 0.0 {
                return Err(NewtonError::SingularJacobian { iteration });
            }
            let inverse = jac
                .try_inverse()
                .ok_or(NewtonError::SingularJacobian { iteration })?;

            let delta = &inverse * &residuals;
            let delta_norm = delta.norm();
            let next = &x - &delta;

            if self.log.is_enabled() {
                self.log.append(
                    Record::new()
                        .with("iteration", iteration)
                        .with("args", x.clone())
                        .with("f(x)", residuals)
                        .with("delta", delta)
                        .with("delta_norm", delta_norm)
                        .with("new_args", next.clone()),
                )?;
            }

            if delta_norm < tol {
                if config.verbose {
                    info!("[newton] converged after {iteration} iterations");
                }
                return Ok(Solution {
                    x: next,
                    status: Status::Converged,
                    iterations: iteration,
                });
            }

            x = next;
        }

        if config.verbose {
            info!("[newton] iteration budget exhausted without convergence");
        }
        Ok(Solution {
            x,
            status: Status::MaxIters,
            iterations: controls.max_iter,
        })
    }
}

impl Solver for NewtonRaphson {
    type Estimate = Solution;
    type Error = NewtonError;

    fn solve(&mut self) -> Result<Solution, NewtonError> {
        self.solve_with(&Controls::default())
    }

    fn process_log(&self) -> &ProcessLog {
        &self.log
    }

    fn config(&self) -> &Snapshot {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::process_log::Value;

    /// Circle/line system with the analytic solution `(√2, √2)`.
    fn circle_line() -> (Vec<SystemFn>, Vec<Vec<SystemFn>>) {
        let equations: Vec<SystemFn> = vec![
            Box::new(|x: &DVector<f64>| x[0] * x[0] + x[1] * x[1] - 4.0),
            Box::new(|x: &DVector<f64>| x[0] - x[1]),
        ];
        let jacobian: Vec<Vec<SystemFn>> = vec![
            vec![
                Box::new(|x: &DVector<f64>| 2.0 * x[0]),
                Box::new(|x: &DVector<f64>| 2.0 * x[1]),
            ],
            vec![Box::new(|_: &DVector<f64>| 1.0), Box::new(|_: &DVector<f64>| -1.0)],
        ];
        (equations, jacobian)
    }

    #[test]
    fn converges_on_circle_line_system() {
        let (equations, jacobian) = circle_line();
        let mut solver =
            NewtonRaphson::new(equations, jacobian, vec![1.0, 1.0]).expect("valid system");

        let solution = solver.solve().expect("should converge");

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.x[0], std::f64::consts::SQRT_2, epsilon = 1e-7);
        assert_relative_eq!(solution.x[1], std::f64::consts::SQRT_2, epsilon = 1e-7);
        assert_eq!(solver.process_log().len(), solution.iterations);
    }

    #[test]
    fn step_norms_shrink_quadratically() {
        let (equations, jacobian) = circle_line();
        let mut solver =
            NewtonRaphson::new(equations, jacobian, vec![1.0, 1.0]).expect("valid system");
        solver.solve().expect("should converge");

        let norms: Vec<f64> = solver
            .process_log()
            .rows()
            .iter()
            .map(|row| {
                row.get("delta_norm")
                    .and_then(Value::as_scalar)
                    .expect("scalar step norm")
            })
            .collect();

        assert!(norms.len() >= 3, "expected several iterations");
        for pair in norms.windows(2) {
            // Quadratic convergence: each step norm is bounded by the
            // square of the previous one. Skip steps already at rounding
            // scale.
            if pair[0] > 1e-5 {
                assert!(
                    pair[1] < 0.5 * pair[0] * pair[0],
                    "step {} after {} is not quadratic",
                    pair[1],
                    pair[0]
                );
            }
        }
    }

    #[test]
    fn singular_jacobian_aborts_before_logging() {
        let equations: Vec<SystemFn> = vec![
            Box::new(|x: &DVector<f64>| x[0] + x[1]),
            Box::new(|x: &DVector<f64>| x[0] - x[1]),
        ];
        let jacobian: Vec<Vec<SystemFn>> = vec![
            vec![Box::new(|_: &DVector<f64>| 1.0), Box::new(|_: &DVector<f64>| 1.0)],
            vec![Box::new(|_: &DVector<f64>| 1.0), Box::new(|_: &DVector<f64>| 1.0)],
        ];
        let mut solver =
            NewtonRaphson::new(equations, jacobian, vec![1.0, 1.0]).expect("valid system");

        let err = solver.solve().expect_err("rows are identical");
        assert!(matches!(err, NewtonError::SingularJacobian { iteration: 1 }));
        assert!(solver.process_log().is_empty());
    }

    #[test]
    fn budget_exhaustion_returns_last_iterate() {
        let (equations, jacobian) = circle_line();
        let mut solver =
            NewtonRaphson::new(equations, jacobian, vec![100.0, 1.0]).expect("valid system");

        let solution = solver
            .solve_with(&Controls {
                max_iter: 1,
                tol: Some(1e-12),
            })
            .expect("budget exhaustion is not fatal");

        assert_eq!(solution.status, Status::MaxIters);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solver.process_log().len(), 1);
    }

    #[test]
    fn rejects_empty_system() {
        let result = NewtonRaphson::new(Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(NewtonError::InvalidEquations)));
    }

    #[test]
    fn rejects_misshapen_jacobian() {
        let (equations, mut jacobian) = circle_line();
        jacobian[1].pop();

        let result = NewtonRaphson::new(equations, jacobian, vec![1.0, 1.0]);
        assert!(matches!(
            result,
            Err(NewtonError::InvalidJacobian {
                rows: 2,
                cols: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn rejects_wrong_guess_length() {
        let (equations, jacobian) = circle_line();

        let result = NewtonRaphson::new(equations, jacobian, vec![1.0]);
        assert!(matches!(
            result,
            Err(NewtonError::InvalidGuess {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn evaluates_jacobian_entries_at_a_point() {
        let (equations, jacobian) = circle_line();
        let solver =
            NewtonRaphson::new(equations, jacobian, vec![1.0, 1.0]).expect("valid system");

        let jac = solver.evaluate_jacobian(&DVector::from_vec(vec![3.0, 4.0]));

        assert_relative_eq!(jac[(0, 0)], 6.0);
        assert_relative_eq!(jac[(0, 1)], 8.0);
        assert_relative_eq!(jac[(1, 0)], 1.0);
        assert_relative_eq!(jac[(1, 1)], -1.0);
    }

    #[test]
    fn log_schema_matches_documented_fields() {
        let (equations, jacobian) = circle_line();
        let mut solver =
            NewtonRaphson::new(equations, jacobian, vec![1.0, 1.0]).expect("valid system");
        solver.solve().expect("should converge");

        let schema: Vec<&str> = solver
            .process_log()
            .schema()
            .expect("iterations were logged")
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(
            schema,
            ["iteration", "args", "f(x)", "delta", "delta_norm", "new_args"]
        );
    }
}
