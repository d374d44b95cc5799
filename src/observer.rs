//! The observer interface (spec §6): an external collaborator invoked at
//! observation ticks with a read-only view of gridboxes and particles.
//!
//! A full Zarr-compatible store is out of scope; the bincode/JSON adapters
//! here follow the teacher crate's `io::bin`/`io::json` persistence style
//! (serde-derived snapshot structs, written whole to a file per tick) and
//! exist so the driver and its tests have something concrete to call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gridbox::Gridbox;
use crate::particle::Particle;

/// A const view of the domain handed to the observer at each tick.
pub trait Observer {
    fn snapshot_time(&mut self, t: f64);
    fn snapshot_state(&mut self, gridboxes: &[Gridbox]);
    fn snapshot_particles(&mut self, domain_particles: &[Particle]);

    /// The n-th mass moment of the particle size distribution, per
    /// gridbox: `sum(xi * r^n)` over each gridbox's particles.
    fn snapshot_nth_mass_moment(&mut self, gridboxes: &[Gridbox], particles: &[Particle], n: i32) {
        let moments: Vec<f64> = gridboxes
            .iter()
            .map(|gbx| {
                particles[gbx.refs.0..gbx.refs.1]
                    .iter()
                    .map(|p| p.multiplicity as f64 * p.radius.powi(n))
                    .sum::<f64>()
            })
            .collect();
        self.record_mass_moment(n, &moments);
    }

    /// Hook the default `snapshot_nth_mass_moment` delegates to; override
    /// to capture the computed per-gridbox moments.
    fn record_mass_moment(&mut self, _n: i32, _per_gridbox: &[f64]) {}
}

/// An observer that discards every snapshot; useful for tests and for runs
/// where only the final state matters.
#[derive(Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn snapshot_time(&mut self, _t: f64) {}
    fn snapshot_state(&mut self, _gridboxes: &[Gridbox]) {}
    fn snapshot_particles(&mut self, _domain_particles: &[Particle]) {}
}

/// One recorded tick, serialized as a unit by [`BincodeObserver`] or
/// [`JsonObserver`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f64,
    pub gridboxes: Vec<Gridbox>,
    pub particles: Vec<Particle>,
    pub mass_moments: Vec<(i32, Vec<f64>)>,
}

/// Accumulates snapshots in memory and flushes each completed tick to a
/// bincode file under `output_dir`, named by tick index.
pub struct BincodeObserver {
    output_dir: PathBuf,
    current: Snapshot,
    tick: usize,
}

impl BincodeObserver {
    pub fn new(output_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            current: Snapshot::default(),
            tick: 0,
        })
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.output_dir.join(format!("tick_{:06}.bin", self.tick));
        let bytes = bincode::serialize(&self.current)?;
        std::fs::write(path, bytes)?;
        self.tick += 1;
        self.current = Snapshot::default();
        Ok(())
    }
}

impl Observer for BincodeObserver {
    fn snapshot_time(&mut self, t: f64) {
        self.current.time = t;
    }

    fn snapshot_state(&mut self, gridboxes: &[Gridbox]) {
        self.current.gridboxes = gridboxes.to_vec();
    }

    fn snapshot_particles(&mut self, domain_particles: &[Particle]) {
        self.current.particles = domain_particles.to_vec();
        log::debug!(
            "observer: recorded {} particles at t={}",
            domain_particles.len(),
            self.current.time
        );
        if let Err(err) = self.flush() {
            log::error!("observer: failed to flush snapshot: {err}");
        }
    }

    fn record_mass_moment(&mut self, n: i32, per_gridbox: &[f64]) {
        self.current.mass_moments.push((n, per_gridbox.to_vec()));
    }
}

/// Same contract as [`BincodeObserver`] but writes pretty-printed JSON,
/// matching the teacher crate's `io::json::export_json`.
pub struct JsonObserver {
    output_dir: PathBuf,
    current: Snapshot,
    tick: usize,
}

impl JsonObserver {
    pub fn new(output_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            current: Snapshot::default(),
            tick: 0,
        })
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.output_dir.join(format!("tick_{:06}.json", self.tick));
        let json = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(path, json)?;
        self.tick += 1;
        self.current = Snapshot::default();
        Ok(())
    }
}

impl Observer for JsonObserver {
    fn snapshot_time(&mut self, t: f64) {
        self.current.time = t;
    }

    fn snapshot_state(&mut self, gridboxes: &[Gridbox]) {
        self.current.gridboxes = gridboxes.to_vec();
    }

    fn snapshot_particles(&mut self, domain_particles: &[Particle]) {
        self.current.particles = domain_particles.to_vec();
        if let Err(err) = self.flush() {
            log::error!("observer: failed to flush snapshot: {err}");
        }
    }

    fn record_mass_moment(&mut self, n: i32, per_gridbox: &[f64]) {
        self.current.mass_moments.push((n, per_gridbox.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridbox::ThermoState;
    use crate::particle::SoluteProperties;
    use tempfile::tempdir;

    fn sample_particles() -> Vec<Particle> {
        vec![Particle::new(
            0,
            0.0,
            0.0,
            0.0,
            SoluteProperties::new(1000.0, 0.05844, 2.0),
            10,
            1e-6,
            1e-18,
            None,
        )]
    }

    #[test]
    fn mass_moment_zero_is_total_multiplicity() {
        let mut gbx = Gridbox::new(0, ThermoState::new(1e5, 290.0, 0.01, 0.0), 1.0);
        gbx.refs = (0, 1);
        let particles = sample_particles();
        let mut observer = NullObserver;
        let mut captured = Vec::new();
        struct Capture<'a>(&'a mut Vec<f64>);
        impl Observer for Capture<'_> {
            fn snapshot_time(&mut self, _t: f64) {}
            fn snapshot_state(&mut self, _gridboxes: &[Gridbox]) {}
            fn snapshot_particles(&mut self, _domain_particles: &[Particle]) {}
            fn record_mass_moment(&mut self, _n: i32, per_gridbox: &[f64]) {
                self.0.extend_from_slice(per_gridbox);
            }
        }
        let mut capture = Capture(&mut captured);
        capture.snapshot_nth_mass_moment(std::slice::from_ref(&gbx), &particles, 0);
        assert_eq!(captured, vec![10.0]);
        observer.snapshot_time(0.0);
    }

    #[test]
    fn bincode_observer_writes_one_file_per_tick() {
        let dir = tempdir().unwrap();
        let mut observer = BincodeObserver::new(dir.path()).unwrap();
        let gbx = Gridbox::new(0, ThermoState::new(1e5, 290.0, 0.01, 0.0), 1.0);
        observer.snapshot_time(1.0);
        observer.snapshot_state(&[gbx]);
        observer.snapshot_particles(&sample_particles());
        assert!(dir.path().join("tick_000000.bin").exists());
    }
}
