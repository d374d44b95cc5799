//! Fatal error kinds raised by the core data-plane.
//!
//! The core never retries and never catches: every variant here aborts the
//! coupling step it was raised in. `DroppedParticle` (ξ reaching zero) is
//! deliberately not a variant of this enum — it is recovered locally by
//! marking the particle out-of-bounds and never surfaces as an error.

use thiserror::Error;

/// Fatal error raised by the particle-domain data-plane.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Coupling-step or dimension mismatch between collaborators, detected
    /// at construction time.
    #[error("config mismatch: {0}")]
    ConfigMismatch(String),

    /// Framed-binary length/metadata inconsistency detected during load.
    #[error("malformed input: {0}")]
    InputMalformed(String),

    /// Newton-Raphson iteration cap exceeded in condensation or equilibrium
    /// radius solving.
    #[error("convergence failure after {iterations} iterations: {context}")]
    ConvergenceFailure { iterations: u32, context: String },

    /// A motion displacement exceeded the local gridbox extent on at least
    /// one axis.
    #[error("CFL violation: |delta_{axis}| = {delta} exceeds cell size {cell_size}")]
    CFLViolation {
        axis: &'static str,
        delta: f64,
        cell_size: f64,
    },

    /// The particle store would have to grow past its static capacity.
    #[error("capacity overflow: store holds {capacity}, attempted to reach {attempted}")]
    CapacityOverflow { capacity: usize, attempted: usize },

    /// An invariant the core relies on was found broken, typically by the
    /// optional audit kernel.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
