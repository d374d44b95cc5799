//! Initial wet-radius root finder from the Kohler cubic.
//!
//! Used only at initialization, never in a hot path (spec §4.7). Grounded
//! on the same Newton-Raphson iteration-limit shape as
//! `original_source/libs/superdrop_solver/impliciteuler.{hpp,cpp}`, applied
//! here to the equilibrium (`dr/dt = 0`) form of the Kohler equation
//! instead of the transient ODE.

use crate::error::{CoreError, CoreResult};

/// `(S - 1) r^3 - A r^2 + B = 0`.
fn kohler_residual(r: f64, s_ratio: f64, akoh: f64, bkoh: f64) -> f64 {
    (s_ratio - 1.0) * r.powi(3) - akoh * r.powi(2) + bkoh
}

fn kohler_derivative(r: f64, s_ratio: f64, akoh: f64) -> f64 {
    3.0 * (s_ratio - 1.0) * r.powi(2) - 2.0 * akoh * r
}

/// Solves the equilibrium Kohler cubic for the wet radius, given an initial
/// guess (typically the dry radius).
pub fn equilibrium_radius(
    s_ratio: f64,
    akoh: f64,
    bkoh: f64,
    initial_guess: f64,
    max_iters: u32,
    rtol: f64,
    atol: f64,
) -> CoreResult<f64> {
    let mut r = initial_guess;
    let mut f_prev = kohler_residual(r, s_ratio, akoh, bkoh);

    for _ in 0..max_iters {
        let deriv = kohler_derivative(r, s_ratio, akoh);
        if deriv.abs() < f64::EPSILON {
            break;
        }
        r -= f_prev / deriv;
        let f_new = kohler_residual(r, s_ratio, akoh, bkoh);
        if f_new.abs() < rtol * f_prev.abs() + atol {
            return Ok(r);
        }
        f_prev = f_new;
    }

    Err(CoreError::ConvergenceFailure {
        iterations: max_iters,
        context: "equilibrium radius Kohler root-find".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_for_a_subsaturated_droplet() {
        let r = equilibrium_radius(0.98, 1e-9, 1e-24, 1e-7, 100, 1e-9, 1e-15).unwrap();
        let residual = kohler_residual(r, 0.98, 1e-9, 1e-24);
        assert!(residual.abs() < 1e-15, "residual {residual} too large");
    }

    #[test]
    fn zero_iteration_budget_is_fatal() {
        let err = equilibrium_radius(0.98, 1e-9, 1e-24, 1e-7, 0, 1e-9, 1e-15).unwrap_err();
        assert!(matches!(err, CoreError::ConvergenceFailure { .. }));
    }
}
