//! Process-wide solver configuration.
//!
//! A single configuration value lives behind a process-wide lock. Solvers
//! read it exactly once, at construction, as an owned [`Snapshot`]; the
//! setters replace the stored value wholesale, so solvers constructed
//! earlier are unaffected by later changes.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use log::{info, warn};
use thiserror::Error;

/// Floating-point width used for all numeric evaluation in a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// 32-bit evaluation.
    Single,
    /// 64-bit evaluation.
    Double,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "float32"),
            Self::Double => write!(f, "float64"),
        }
    }
}

/// Numeric backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The portable pure-Rust implementation.
    Reference,
    /// An accelerated implementation, when one is available.
    Accelerated,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Accelerated => write!(f, "accelerated"),
        }
    }
}

/// Errors from configuration setters.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("tolerances must be positive: abs={abs}, rel={rel}")]
    NonPositiveTolerance { abs: f64, rel: f64 },
}

/// An owned copy of the process-wide configuration.
///
/// Captured once per solver at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub dtype: Precision,
    pub backend: Backend,
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub verbose: bool,
}

impl Snapshot {
    pub const DEFAULT: Self = Self {
        dtype: Precision::Double,
        backend: Backend::Reference,
        abs_tol: 1e-8,
        rel_tol: 1e-6,
        verbose: false,
    };

    /// Rounds a value through the configured floating-point width.
    ///
    /// Under [`Precision::Single`] the value is truncated to `f32` and
    /// widened back, reproducing 32-bit evaluation results.
    #[must_use]
    pub fn quantize(&self, value: f64) -> f64 {
        match self.dtype {
            Precision::Single => f64::from(value as f32),
            Precision::Double => value,
        }
    }

    /// Renders the captured configuration as a small report block.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "precision: {}\nbackend:   {}\nabs_tol:   {:.2e}\nrel_tol:   {:.2e}\nverbose:   {}",
            self.dtype, self.backend, self.abs_tol, self.rel_tol, self.verbose
        )
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static CONFIG: RwLock<Snapshot> = RwLock::new(Snapshot::DEFAULT);

fn read() -> Snapshot {
    *CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

fn replace(next: Snapshot) {
    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = next;
}

/// Returns an owned copy of the current process-wide configuration.
#[must_use]
pub fn snapshot() -> Snapshot {
    read()
}

/// Returns the configured floating-point width.
#[must_use]
pub fn dtype() -> Precision {
    read().dtype
}

/// Returns the configured backend.
#[must_use]
pub fn backend() -> Backend {
    read().backend
}

/// Returns the configured `(abs_tol, rel_tol)` pair.
#[must_use]
pub fn tolerances() -> (f64, f64) {
    let cfg = read();
    (cfg.abs_tol, cfg.rel_tol)
}

/// Returns whether verbose reporting is enabled.
#[must_use]
pub fn verbose() -> bool {
    read().verbose
}

/// Sets the floating-point width for solvers constructed from now on.
pub fn set_precision(precision: Precision) {
    let mut cfg = read();
    cfg.dtype = precision;
    replace(cfg);
    if cfg.verbose {
        info!("precision set to {precision}");
    }
}

/// Sets the backend for solvers constructed from now on.
pub fn set_backend(backend: Backend) {
    let mut cfg = read();
    cfg.backend = backend;
    replace(cfg);
    if cfg.verbose {
        info!("backend set to {backend}");
    }
}

/// Enables or disables verbose reporting.
pub fn set_verbose(flag: bool) {
    let mut cfg = read();
    cfg.verbose = flag;
    replace(cfg);
    info!(
        "verbose mode {}",
        if flag { "enabled" } else { "disabled" }
    );
}

/// Sets the default tolerances for solvers constructed from now on.
///
/// # Errors
///
/// Returns [`ConfigError::NonPositiveTolerance`] if either value is not
/// strictly positive; the stored configuration is left unchanged.
pub fn set_tolerances(abs_tol: f64, rel_tol: f64) -> Result<(), ConfigError> {
    if abs_tol <= 0.0 || rel_tol <= 0.0 {
        return Err(ConfigError::NonPositiveTolerance {
            abs: abs_tol,
            rel: rel_tol,
        });
    }

    let mut cfg = read();
    cfg.abs_tol = abs_tol;
    cfg.rel_tol = rel_tol;
    replace(cfg);
    if cfg.verbose {
        info!("tolerances set to abs={abs_tol:.2e}, rel={rel_tol:.2e}");
    }
    Ok(())
}

/// Checks that the selected backend is usable, falling back when it is not.
///
/// No accelerated backend is currently compiled in, so selecting
/// [`Backend::Accelerated`] always falls back to the reference backend
/// with a warning.
pub fn validate_environment() {
    let cfg = read();
    if cfg.backend == Backend::Accelerated {
        warn!("accelerated backend selected but not available; falling back to reference");
        set_backend(Backend::Reference);
    }
    if cfg.verbose {
        info!("environment validated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn quantize_rounds_through_f32_under_single_precision() {
        let single = Snapshot {
            dtype: Precision::Single,
            ..Snapshot::DEFAULT
        };
        let double = Snapshot::DEFAULT;

        let x = 0.1_f64;
        assert_relative_eq!(single.quantize(x), f64::from(0.1_f32));
        assert_relative_eq!(double.quantize(x), x);
    }

    #[test]
    fn rejects_non_positive_tolerances() {
        assert!(matches!(
            set_tolerances(0.0, 1e-6),
            Err(ConfigError::NonPositiveTolerance { .. })
        ));
        assert!(matches!(
            set_tolerances(1e-8, -1.0),
            Err(ConfigError::NonPositiveTolerance { .. })
        ));
    }

    #[test]
    fn default_snapshot_matches_documented_values() {
        let cfg = Snapshot::default();
        assert_eq!(cfg.dtype, Precision::Double);
        assert_eq!(cfg.backend, Backend::Reference);
        assert_relative_eq!(cfg.abs_tol, 1e-8);
        assert_relative_eq!(cfg.rel_tol, 1e-6);
        assert!(!cfg.verbose);
    }

    #[test]
    fn summary_names_every_field() {
        let text = Snapshot::DEFAULT.summary();
        for label in ["precision", "backend", "abs_tol", "rel_tol", "verbose"] {
            assert!(text.contains(label), "summary is missing {label}");
        }
    }

    // Exercises the global store in one test to keep mutations of the
    // process-wide value from interleaving across test threads.
    #[test]
    fn global_store_replaces_and_isolates() {
        let captured = snapshot();

        set_backend(Backend::Accelerated);
        assert_eq!(backend(), Backend::Accelerated);

        // A snapshot taken before the change is unaffected.
        assert_eq!(captured.backend, Backend::Reference);

        // Environment validation falls back to the reference backend.
        validate_environment();
        assert_eq!(backend(), Backend::Reference);

        set_tolerances(1e-10, 1e-8).expect("positive tolerances");
        assert_eq!(tolerances(), (1e-10, 1e-8));
        assert_relative_eq!(captured.abs_tol, 1e-8);

        // Restore defaults for the rest of the suite.
        set_tolerances(Snapshot::DEFAULT.abs_tol, Snapshot::DEFAULT.rel_tol)
            .expect("defaults are positive");
        set_backend(Backend::Reference);
        assert_eq!(snapshot(), Snapshot::DEFAULT);
    }
}
