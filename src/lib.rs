//! Iterative numerical solvers for scalar and vector-valued nonlinear
//! equations.
//!
//! Three solvers share one contract ([`Solver`]): construction captures an
//! owned snapshot of the process-wide [`config`] and an empty
//! [`ProcessLog`]; solving runs to convergence, failure, or budget
//! exhaustion on the calling thread.
//!
//! - [`Bisection`] and [`RegulaFalsi`] find a root of a scalar function on
//!   an interval that brackets a sign change.
//! - [`NewtonRaphson`] solves a square nonlinear system from an initial
//!   guess using an explicit Jacobian.
//!
//! ```
//! use numerix::{Bisection, bracketing::Controls};
//!
//! let mut solver = Bisection::new(|x| x * x - 2.0, 0.0, 2.0)?;
//! let root = solver.solve_with(&Controls::default())?;
//! assert!((root - 2.0_f64.sqrt()).abs() < 1e-5);
//! # Ok::<(), numerix::bracketing::BracketingError>(())
//! ```

pub mod bracketing;
pub mod config;
pub mod newton;
pub mod process_log;
pub mod solver;

pub use bracketing::{Bisection, RegulaFalsi};
pub use config::{Backend, Precision, Snapshot};
pub use newton::NewtonRaphson;
pub use process_log::{ProcessLog, Record, Value};
pub use solver::Solver;
