//! Per-stream RNG pool.
//!
//! Each kernel instance (one per gridbox, for the collision engine) draws
//! from its own stream, seeded deterministically from a root seed plus the
//! stream index and the current step, following spec §5: "RNG pool:
//! partitioned into per-stream generators ... reproducible per
//! (stream, step) but not across differing thread counts."

use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct RngPool {
    root_seed: u64,
}

impl RngPool {
    pub fn new(root_seed: u64) -> Self {
        Self { root_seed }
    }

    /// Deterministic generator for a given stream at a given step. Calling
    /// this twice with the same `(stream, step)` always yields generators
    /// with identical future output.
    pub fn stream(&self, stream: usize, step: u64) -> StdRng {
        let mixed = self
            .root_seed
            .wrapping_mul(0x9E3779B97F4A7C15)
            .wrapping_add(stream as u64)
            .wrapping_mul(0xBF58476D1CE4E5B9)
            .wrapping_add(step)
            .wrapping_mul(0x94D049BB133111EB);
        StdRng::seed_from_u64(mixed ^ (mixed >> 31))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_stream_and_step_reproduce_identical_draws() {
        let pool = RngPool::new(42);
        let mut a = pool.stream(3, 10);
        let mut b = pool.stream(3, 10);
        let draws_a: Vec<f64> = (0..5).map(|_| a.random::<f64>()).collect();
        let draws_b: Vec<f64> = (0..5).map(|_| b.random::<f64>()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn different_streams_diverge() {
        let pool = RngPool::new(42);
        let mut a = pool.stream(0, 10);
        let mut b = pool.stream(1, 10);
        assert_ne!(a.random::<u64>(), b.random::<u64>());
    }

    #[test]
    fn different_steps_diverge() {
        let pool = RngPool::new(42);
        let mut a = pool.stream(0, 10);
        let mut b = pool.stream(0, 11);
        assert_ne!(a.random::<u64>(), b.random::<u64>());
    }
}
