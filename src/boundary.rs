//! Boundary conditions: the finite/periodic edge handling lives in
//! [`crate::motion`]; this module provides the domain-top source/sink that
//! removes exiting particles and injects fresh ones.
//!
//! Grounded on
//! `original_source/libs/cartesiandomain/add_supers_at_domain_top.hpp`'s
//! `AddSupersAtDomainTop`/`CreateSuperdrop`.

use rand::Rng;

use crate::distributions::{Log10RadiusBins, NumConcDistribution};
use crate::error::CoreResult;
use crate::gridbox::Gridbox;
use crate::gridboxmap::GridboxMap;
use crate::idgen::SuperdropletIdGen;
use crate::particle::{Particle, SoluteProperties};
use crate::sort::CountingSort;
use crate::store::ParticleStore;

/// A boundary condition applied after motion and before the next sort.
pub trait BoundaryConditions {
    fn apply(
        &self,
        gbxmap: &GridboxMap,
        gridboxes: &mut [Gridbox],
        store: &mut ParticleStore,
        idgen: &mut SuperdropletIdGen,
        rng: &mut impl Rng,
    ) -> CoreResult<()>;
}

/// No-op boundary condition.
pub struct NullBoundaryConditions;

impl BoundaryConditions for NullBoundaryConditions {
    fn apply(
        &self,
        _gbxmap: &GridboxMap,
        _gridboxes: &mut [Gridbox],
        _store: &mut ParticleStore,
        _idgen: &mut SuperdropletIdGen,
        _rng: &mut impl Rng,
    ) -> CoreResult<()> {
        Ok(())
    }
}

/// Removes particles above `z_lim` and injects `new_per_gbx` fresh ones into
/// every gridbox that just lost particles.
pub struct DomainTopSource {
    pub new_per_gbx: usize,
    pub z_lim: f64,
    pub dry_radius: f64,
    pub solute: SoluteProperties,
    pub bins: Log10RadiusBins,
    pub distribution: NumConcDistribution,
}

impl DomainTopSource {
    fn solute_mass_at_dry_radius(&self) -> f64 {
        (4.0 / 3.0) * std::f64::consts::PI * self.dry_radius.powi(3) * self.solute.density
    }
}

impl BoundaryConditions for DomainTopSource {
    fn apply(
        &self,
        gbxmap: &GridboxMap,
        gridboxes: &mut [Gridbox],
        store: &mut ParticleStore,
        idgen: &mut SuperdropletIdGen,
        rng: &mut impl Rng,
    ) -> CoreResult<()> {
        let mut removed_from = Vec::new();
        for p in store.get_domain_mut() {
            if !p.is_alive() {
                continue;
            }
            let owner = p.sdgbxindex;
            let z_hi = gbxmap.bounds_z(owner).1;
            if z_hi > self.z_lim && p.coord3 > self.z_lim {
                p.mark_oob();
                removed_from.push(owner);
            }
        }
        removed_from.sort_unstable();
        removed_from.dedup();

        let solute_mass = self.solute_mass_at_dry_radius();
        for gbx in removed_from {
            let (z_lo, z_hi) = gbxmap.bounds_z(gbx);
            let volume = gridboxes[gbx as usize].volume;
            let mut fresh = Vec::with_capacity(self.new_per_gbx);
            for _ in 0..self.new_per_gbx {
                let bin = rng.random_range(0..self.bins.nbins());
                let (r_lo, r_hi) = self.bins.bin_bounds(bin);
                let radius = self.distribution.sample_radius_in_bin(r_lo, r_hi, rng);
                let numconc = self.distribution.bin_numconc(r_lo, r_hi);
                let multiplicity = (numconc * volume).round().max(1.0) as u64;
                let coord3 = rng.random_range(z_lo..z_hi);
                let id = idgen.next_id();
                fresh.push(Particle::new(
                    gbx,
                    coord3,
                    0.0,
                    0.0,
                    self.solute,
                    multiplicity,
                    radius,
                    solute_mass,
                    Some(id),
                ));
            }
            store.append(&fresh)?;
        }

        CountingSort::sort(store, gridboxes);
        Ok(())
    }
}
