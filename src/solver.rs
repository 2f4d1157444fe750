//! The shared contract implemented by every solver.

use crate::config::Snapshot;
use crate::process_log::ProcessLog;

/// An iterative solver with a process log and a captured configuration.
///
/// Implementations run with their default iteration controls here; each
/// concrete type also exposes a `solve_with` taking explicit tolerance and
/// iteration-budget parameters.
pub trait Solver {
    /// The final estimate produced on success.
    type Estimate;
    type Error: std::error::Error;

    /// Runs the solver to completion with its default controls.
    ///
    /// # Errors
    ///
    /// Returns an error if a solve precondition fails or, for solvers that
    /// treat budget exhaustion as fatal, if the iteration budget runs out.
    fn solve(&mut self) -> Result<Self::Estimate, Self::Error>;

    /// Returns the accumulated iteration log.
    ///
    /// Empty if logging was disabled at construction or no iterations ran.
    fn process_log(&self) -> &ProcessLog;

    /// Returns the configuration captured at construction.
    fn config(&self) -> &Snapshot;
}
