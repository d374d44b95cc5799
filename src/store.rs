//! Owned contiguous particle storage.
//!
//! The store exclusively owns all particles; gridboxes hold only `(lo, hi)`
//! ref pairs into it (Design Notes: no shared ownership). The domain prefix
//! `[0, size_domain())` holds alive, sorted particles; the remainder holds
//! out-of-bounds particles and free slots reused by source injection.

use crate::error::{CoreError, CoreResult};
use crate::particle::Particle;

/// Contiguous storage of all particles, in-domain and out-of-bounds.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    capacity: usize,
    domain_len: usize,
}

impl ParticleStore {
    /// Creates an empty store with a fixed static capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity,
            domain_len: 0,
        }
    }

    /// Total number of particles (domain + out-of-bounds).
    pub fn get_total(&self) -> usize {
        self.particles.len()
    }

    /// Number of alive, in-domain particles (the sorted prefix).
    pub fn size_domain(&self) -> usize {
        self.domain_len
    }

    /// Read-only view of the alive, sorted prefix.
    pub fn get_domain(&self) -> &[Particle] {
        &self.particles[..self.domain_len]
    }

    /// Mutable view of the alive, sorted prefix.
    pub fn get_domain_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.domain_len]
    }

    /// Read-only view of every particle, domain and out-of-bounds.
    pub fn get_all(&self) -> &[Particle] {
        &self.particles
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends new particles, failing if that would exceed the static
    /// capacity.
    pub fn append(&mut self, new_particles: &[Particle]) -> CoreResult<()> {
        let attempted = self.particles.len() + new_particles.len();
        if attempted > self.capacity {
            return Err(CoreError::CapacityOverflow {
                capacity: self.capacity,
                attempted,
            });
        }
        self.particles.extend_from_slice(new_particles);
        Ok(())
    }

    /// Replaces the domain-length marker after an external sort has
    /// rearranged `self.particles` in place. Internal to [`crate::sort`].
    pub(crate) fn set_domain_len(&mut self, domain_len: usize) {
        debug_assert!(domain_len <= self.particles.len());
        self.domain_len = domain_len;
    }

    pub(crate) fn particles_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.particles
    }

    pub(crate) fn particles(&self) -> &[Particle] {
        &self.particles
    }
}
