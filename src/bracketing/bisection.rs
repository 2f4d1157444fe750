use log::info;

use crate::config::{self, Snapshot};
use crate::process_log::{ProcessLog, Record};
use crate::solver::Solver;

use super::{Bounds, BracketingError, Controls};

/// Bisection root finder for a continuous single-variable function.
///
/// Each iteration evaluates the bracket midpoint and keeps the half whose
/// endpoints still straddle the sign change, halving the bracket width
/// every step.
#[derive(Debug)]
pub struct Bisection<F> {
    function: F,
    bounds: Bounds,
    config: Snapshot,
    log: ProcessLog,
}

impl<F> Bisection<F>
where
    F: Fn(f64) -> f64,
{
    /// Creates a solver with logging disabled and verbosity taken from the
    /// process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is malformed.
    pub fn new(function: F, lower: f64, upper: f64) -> Result<Self, BracketingError> {
        let verbose = config::verbose();
        Self::with_flags(function, lower, upper, verbose, false)
    }

    /// Creates a solver with explicit verbosity and logging flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is malformed.
    pub fn with_flags(
        function: F,
        lower: f64,
        upper: f64,
        verbose: bool,
        logging: bool,
    ) -> Result<Self, BracketingError> {
        let bounds = Bounds::new(lower, upper)?;
        let mut config = config::snapshot();
        config.verbose = verbose;

        if config.verbose {
            info!("[bisection] initialized on [{lower}, {upper}]");
        }

        Ok(Self {
            function,
            bounds,
            config,
            log: ProcessLog::new(logging),
        })
    }

    fn eval(&self, x: f64) -> f64 {
        self.config.quantize((self.function)(x))
    }

    /// Finds a root with explicit iteration controls.
    ///
    /// The sign-change precondition is checked on every call.
    ///
    /// # Errors
    ///
    /// Returns [`BracketingError::NoSignChange`] if `f(lower) * f(upper)`
    /// is not negative, and [`BracketingError::NotConverged`] if the
    /// iteration budget runs out.
    pub fn solve_with(&mut self, controls: &Controls) -> Result<f64, BracketingError> {
        let Controls { tol, max_iter } = *controls;
        let (mut a, mut b) = (self.bounds.lower(), self.bounds.upper());
        let mut fa = self.eval(a);
        let fb = self.eval(b);

        if fa * fb >= 0.0 {
            return Err(BracketingError::NoSignChange {
                lower: a,
                upper: b,
                f_lower: fa,
                f_upper: fb,
            });
        }

        for iter in 1..=max_iter {
            let c = self.config.quantize(0.5 * (a + b));
            let fc = self.eval(c);

            if self.log.is_enabled() {
                self.log.append(
                    Record::new()
                        .with("iter", iter)
                        .with("lower", a)
                        .with("upper", b)
                        .with("mid", c)
                        .with("f(mid)", fc),
                )?;
            }

            if fc.abs() < tol || (b - a).abs() / 2.0 < tol {
                if self.config.verbose {
                    info!("[bisection] converged after {iter} iterations");
                }
                return Ok(c);
            }

            if fa * fc < 0.0 {
                b = c;
            } else {
                a = c;
                fa = fc;
            }
        }

        Err(BracketingError::NotConverged {
            iterations: max_iter,
        })
    }
}

impl<F> Solver for Bisection<F>
where
    F: Fn(f64) -> f64,
{
    type Estimate = f64;
    type Error = BracketingError;

    fn solve(&mut self) -> Result<f64, BracketingError> {
        self.solve_with(&Controls::default())
    }

    fn process_log(&self) -> &ProcessLog {
        &self.log
    }

    fn config(&self) -> &Snapshot {
        &self.config
    }
}
