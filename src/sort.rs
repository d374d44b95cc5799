//! Stable counting/bucket sort that keeps particles clustered by gridbox
//! index and refreshes each gridbox's `(lo, hi)` ref pair.
//!
//! Grounded on `original_source/libs/gridboxes/sortsupers.hpp`: a count
//! pass, an exclusive prefix sum, and a scatter pass that marks the source
//! slot of every moved particle out-of-bounds as a fail-safe. The count
//! pass uses atomic fetch-add, the spec's one permitted cross-thread
//! synchronization primitive for this kernel; the scatter advances
//! per-bucket cursors sequentially, which already gives a stable ordering
//! because particles are scanned in their original order.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::gridbox::Gridbox;
use crate::particle::{Particle, OOB_GBXINDEX};
use crate::store::ParticleStore;

/// Maps a gridbox index to its bucket: `0..num_gridboxes` for in-domain
/// particles, `num_gridboxes` for anything out-of-bounds or beyond the
/// known gridboxes.
#[inline]
fn bucket_for(sdgbxindex: u32, num_gridboxes: usize) -> usize {
    if sdgbxindex == OOB_GBXINDEX || sdgbxindex as usize >= num_gridboxes {
        num_gridboxes
    } else {
        sdgbxindex as usize
    }
}

pub struct CountingSort;

impl CountingSort {
    /// Sorts the store's particles by gridbox index and refreshes every
    /// gridbox's `refs`. `gridboxes[i].index` must equal `i` for all `i`.
    pub fn sort(store: &mut ParticleStore, gridboxes: &mut [Gridbox]) {
        let num_gridboxes = gridboxes.len();
        let num_buckets = num_gridboxes + 1;
        let total = store.get_total();

        let counts: Vec<AtomicUsize> = (0..num_buckets).map(|_| AtomicUsize::new(0)).collect();
        store.particles().par_iter().for_each(|p| {
            counts[bucket_for(p.sdgbxindex, num_gridboxes)].fetch_add(1, Ordering::Relaxed);
        });

        let mut cumlcounts = vec![0usize; num_buckets + 1];
        for bucket in 0..num_buckets {
            cumlcounts[bucket + 1] = cumlcounts[bucket] + counts[bucket].load(Ordering::Relaxed);
        }

        let mut cursors: Vec<usize> = cumlcounts[..num_buckets].to_vec();
        let mut scratch: Vec<Particle> = vec![Particle::default_oob(); total];
        for particle in store.particles() {
            let bucket = bucket_for(particle.sdgbxindex, num_gridboxes);
            let dest = cursors[bucket];
            cursors[bucket] += 1;
            scratch[dest] = *particle;
        }

        let domain_len = cumlcounts[num_gridboxes];
        *store.particles_mut() = scratch;
        store.set_domain_len(domain_len);

        for (i, gbx) in gridboxes.iter_mut().enumerate() {
            gbx.refs = (cumlcounts[i], cumlcounts[i + 1]);
        }
    }
}
