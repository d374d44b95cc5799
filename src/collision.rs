//! Monte-Carlo collision-coalescence kernel (Shima et al. 2009).
//!
//! Grounded on `original_source/libs/superdrop_solver/collisionsmethod.hpp`:
//! random pairing within a gridbox, a scaled pair probability, the
//! floor/fractional-part gamma draw capped by the multiplicity ratio, and
//! twin- vs different-superdroplet coalescence enactment.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::particle::Particle;

/// Collision kernel `K(a, b)`, units of volume per time (m^3/s).
pub trait CollisionKernel: Sync {
    fn rate(&self, a: &Particle, b: &Particle) -> f64;
}

/// The Golovin additive kernel `K = b * (v_a + v_b)`.
pub struct GolovinKernel {
    pub b: f64,
}

impl CollisionKernel for GolovinKernel {
    fn rate(&self, a: &Particle, b: &Particle) -> f64 {
        let vol = |r: f64| (4.0 / 3.0) * std::f64::consts::PI * r.powi(3);
        self.b * (vol(a.radius) + vol(b.radius))
    }
}

/// How a `gamma > 0` draw is enacted on a pair. The spec fixes the gamma
/// draw but leaves the post-enactment update open between coalescence and
/// breakup variants; this trait is the seam between them.
pub trait EnactmentRule: Sync {
    /// `big` has the larger multiplicity (or equal), `small` the smaller.
    /// Returns `true` if `small` became dead (multiplicity reached zero)
    /// and should be marked out-of-bounds by the caller.
    fn enact(&self, gamma: u64, big: &mut Particle, small: &mut Particle) -> bool;
}

/// The canonical Shima (2009) coalescence enactment (spec §4.6, scenarios
/// 2-3).
pub struct Coalescence;

impl EnactmentRule for Coalescence {
    fn enact(&self, gamma: u64, big: &mut Particle, small: &mut Particle) -> bool {
        let gamma_small_xi = gamma * small.multiplicity;

        if big.multiplicity > gamma_small_xi {
            big.multiplicity -= gamma_small_xi;
            grow_into(small, big, gamma);
            false
        } else {
            // Twin coalescence: xi_big == gamma * xi_small (never <, since
            // gamma is capped at floor(xi_big/xi_small)). Both particles
            // end up with the same new radius and solute mass; the
            // multiplicity splits across them.
            let new_radius = (small.radius.powi(3) + gamma as f64 * big.radius.powi(3)).cbrt();
            let new_solute_mass = small.solute_mass + gamma as f64 * big.solute_mass;
            let new_xi_big = small.multiplicity / 2;
            let new_xi_small = small.multiplicity - new_xi_big;

            big.multiplicity = new_xi_big;
            small.multiplicity = new_xi_small;
            big.radius = new_radius;
            small.radius = new_radius;
            big.solute_mass = new_solute_mass;
            small.solute_mass = new_solute_mass;

            let mut died = false;
            if big.multiplicity == 0 {
                big.mark_oob();
                died = true;
            }
            if small.multiplicity == 0 {
                small.mark_oob();
                died = true;
            }
            died
        }
    }
}

/// Grows `target` by absorbing `gamma` copies of `source`'s mass/volume,
/// leaving `source` untouched (the Shima coalescence radius/solute update).
fn grow_into(target: &mut Particle, source: &Particle, gamma: u64) {
    let new_volume = target.radius.powi(3) + gamma as f64 * source.radius.powi(3);
    target.radius = new_volume.cbrt();
    target.solute_mass += gamma as f64 * source.solute_mass;
}

/// Documents the breakup seam without asserting a canonical breakup
/// physics (spec §9 Open Questions: "the spec ... leaves the enactment
/// rule to the chosen variant without asserting a single canonical form").
pub struct LosslessBreakup;

impl EnactmentRule for LosslessBreakup {
    fn enact(&self, _gamma: u64, _big: &mut Particle, _small: &mut Particle) -> bool {
        false
    }
}

/// Draws the gamma factor for one pair given the scaled probability.
fn monte_carlo_gamma(prob: f64, gamma_max: u64, phi: f64) -> u64 {
    let floor_prob = prob.floor();
    let gamma = if phi < prob - floor_prob {
        floor_prob as u64 + 1
    } else {
        floor_prob as u64
    };
    gamma.min(gamma_max)
}

pub struct CollisionEngine<K: CollisionKernel, E: EnactmentRule> {
    pub kernel: K,
    pub enactment: E,
}

impl<K: CollisionKernel, E: EnactmentRule> CollisionEngine<K, E> {
    pub fn new(kernel: K, enactment: E) -> Self {
        Self { kernel, enactment }
    }

    /// Runs one collision step over the alive particles of a single
    /// gridbox, shuffling, pairing, and enacting collisions in place.
    pub fn step_gridbox(&self, dt: f64, volume: f64, particles: &mut [Particle], rng: &mut impl Rng) {
        let n = particles.len();
        if n < 2 {
            return;
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let nhalf = n / 2;
        let scale = (n * (n - 1)) as f64 / (2.0 * nhalf as f64);

        for pair_idx in 0..nhalf {
            let i = order[2 * pair_idx];
            let j = order[2 * pair_idx + 1];
            // Safety of the split: i != j always, both < n.
            let (lo, hi) = if i < j { (i, j) } else { (j, i) };
            let (left, right) = particles.split_at_mut(hi);
            let (p_lo, p_hi) = (&mut left[lo], &mut right[0]);

            let (big, small) = if p_lo.multiplicity >= p_hi.multiplicity {
                (p_lo, p_hi)
            } else {
                (p_hi, p_lo)
            };
            if !big.is_alive() || !small.is_alive() || small.multiplicity == 0 {
                continue;
            }

            let p_jk = self.kernel.rate(big, small) * dt / volume;
            let prob = scale * (big.multiplicity.max(small.multiplicity)) as f64 * p_jk;
            let phi: f64 = rng.random();
            let gamma_max = big.multiplicity / small.multiplicity;
            let gamma = monte_carlo_gamma(prob, gamma_max, phi);

            if gamma > 0 {
                self.enactment.enact(gamma, big, small);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::SoluteProperties;
    use rand::SeedableRng;

    fn particle(xi: u64, radius: f64) -> Particle {
        Particle::new(
            0,
            0.0,
            0.0,
            0.0,
            SoluteProperties::new(1000.0, 0.05844, 2.0),
            xi,
            radius,
            1e-18,
            None,
        )
    }

    #[test]
    fn gamma_draw_matches_worked_example() {
        // xi_a = 10, xi_b = 3, prob = 1.4, phi = 0.3 -> gamma = 2.
        let gamma = monte_carlo_gamma(1.4, 10 / 3, 0.3);
        assert_eq!(gamma, 2);
    }

    #[test]
    fn gamma_is_capped_at_multiplicity_ratio() {
        let gamma = monte_carlo_gamma(50.0, 3, 0.9);
        assert_eq!(gamma, 3);
    }

    #[test]
    fn non_twin_coalescence_matches_worked_example() {
        let mut big = particle(10, 2e-6);
        let mut small = particle(3, 1e-6);
        let r_a_cubed = big.radius.powi(3);
        let m_a = big.solute_mass;
        Coalescence.enact(2, &mut big, &mut small);
        assert_eq!(big.multiplicity, 4);
        let expected = (1e-6f64.powi(3) + 2.0 * r_a_cubed).cbrt();
        assert!((small.radius - expected).abs() / expected < 1e-9);
        assert!((small.solute_mass - (1e-18 + 2.0 * m_a)).abs() / small.solute_mass < 1e-9);
    }

    #[test]
    fn twin_coalescence_splits_multiplicity() {
        // xi_a = xi_b = 5, prob = 0.9, phi = 0.1 -> gamma = 1.
        let gamma = monte_carlo_gamma(0.9, 5 / 5, 0.1);
        assert_eq!(gamma, 1);

        let mut big = particle(5, 1e-6);
        let mut small = particle(5, 1e-6);
        let died = Coalescence.enact(gamma, &mut big, &mut small);
        assert!(!died);
        assert_eq!(big.multiplicity + small.multiplicity, 5);
    }

    #[test]
    fn twin_coalescence_to_zero_marks_particle_oob() {
        let mut big = particle(1, 1e-6);
        let mut small = particle(1, 1e-6);
        let died = Coalescence.enact(1, &mut big, &mut small);
        assert!(died);
        assert!(!big.is_alive() || !small.is_alive());
    }

    #[test]
    fn fewer_than_two_particles_is_a_no_op() {
        let kernel = GolovinKernel { b: 1e3 };
        let engine = CollisionEngine::new(kernel, Coalescence);
        let mut particles = vec![particle(10, 1e-6)];
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        engine.step_gridbox(1.0, 1e6, &mut particles, &mut rng);
        assert_eq!(particles[0].multiplicity, 10);
    }
}
