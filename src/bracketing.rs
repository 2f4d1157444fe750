//! Bracketing root finders for scalar equations.
//!
//! Both solvers operate on an interval `[lower, upper]` across which the
//! function changes sign, shrinking it toward a root:
//!
//! - [`Bisection`] — splits the bracket at its midpoint.
//! - [`RegulaFalsi`] — splits at the secant-weighted point.
//!
//! The sign-change precondition is re-checked at the start of every solve,
//! not assumed from construction.

mod bisection;
mod regula_falsi;

pub use bisection::Bisection;
pub use regula_falsi::RegulaFalsi;

use thiserror::Error;

use crate::process_log::LogError;

/// Errors from constructing or running a bracketing solver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BracketingError {
    #[error("bound is not finite: {value}")]
    NonFiniteBound { value: f64 },

    #[error("lower bound {lower} must be less than upper bound {upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error(
        "no sign change across [{lower}, {upper}]: f(lower)={f_lower}, f(upper)={f_upper}"
    )]
    NoSignChange {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error(transparent)]
    Log(#[from] LogError),
}

/// A validated search interval with `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    /// Validates the interval endpoints.
    ///
    /// Endpoints are kept as given; a reversed interval is an error, not
    /// reordered.
    ///
    /// # Errors
    ///
    /// Returns [`BracketingError::NonFiniteBound`] for NaN or infinite
    /// endpoints and [`BracketingError::InvalidBounds`] when
    /// `lower >= upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, BracketingError> {
        for value in [lower, upper] {
            if !value.is_finite() {
                return Err(BracketingError::NonFiniteBound { value });
            }
        }

        if lower >= upper {
            return Err(BracketingError::InvalidBounds { lower, upper });
        }

        Ok(Self { lower, upper })
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }
}

/// Iteration controls shared by the bracketing solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    /// Absolute convergence tolerance.
    pub tol: f64,
    /// Iteration budget; exhausting it is fatal for bracketing solvers.
    pub max_iter: usize,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 1000,
        }
    }
}
