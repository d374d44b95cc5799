//! End-to-end test driving the full coupling-step pipeline (motion,
//! transport, boundary conditions, condensation, collision) over a small
//! periodic column, verifying the domain stays internally consistent
//! across several steps.

use superdrop_core::boundary::NullBoundaryConditions;
use superdrop_core::collision::{Coalescence, GolovinKernel};
use superdrop_core::condensation::{CondensationSolver, SolverTolerances};
use superdrop_core::config::Constants;
use superdrop_core::driver::DataPlaneDriver;
use superdrop_core::gridbox::{Gridbox, ThermoState};
use superdrop_core::gridboxmap::{AxisLayout, BoundaryPolicy, GridboxGeometry, GridboxMap};
use superdrop_core::idgen::SuperdropletIdGen;
use superdrop_core::motion::{RogersYauTerminalVelocity, SedimentationPlusWind};
use superdrop_core::observer::NullObserver;
use superdrop_core::particle::{Particle, SoluteProperties};
use superdrop_core::rng_pool::RngPool;
use superdrop_core::scheduler::{FixedIntervalProcess, ProcessScheduler};
use superdrop_core::sort::CountingSort;
use superdrop_core::store::ParticleStore;
use superdrop_core::thermo::saturation_mixing_ratio;

fn sample_constants() -> Constants {
    Constants {
        rho_l: 1000.0,
        rho_dry: 1.2,
        latent_heat_vapor: 2.5e6,
        specific_heat: 1005.0,
        solute_density: 2160.0,
        solute_molecular_weight: 0.05844,
        solute_ionic_factor: 2.0,
        surface_tension: 0.0728,
        thermal_conductivity: 0.024,
        vapor_diffusivity: 2.4e-5,
    }
}

fn column_map(n: u32, policy: BoundaryPolicy) -> GridboxMap {
    let geometries: Vec<GridboxGeometry> = (0..n)
        .map(|i| GridboxGeometry {
            z: (i as f64, (i + 1) as f64),
            x: (0.0, 1.0),
            y: (0.0, 1.0),
            volume: 1.0,
            area: 1.0,
        })
        .collect();
    let axis = |ndim, stride| AxisLayout { ndim, stride, policy };
    GridboxMap::new(geometries, axis(n, 1), axis(1, n), axis(1, n))
}

#[test]
fn multi_step_run_keeps_domain_and_refs_consistent() {
    let n = 8;
    let gbxmap = column_map(n, BoundaryPolicy::Periodic);
    let qv_near_saturation = saturation_mixing_ratio(1e5, 290.0);
    let gridboxes: Vec<Gridbox> = (0..n)
        .map(|i| Gridbox::new(i, ThermoState::new(1e5, 290.0, qv_near_saturation, 1e-5), 1e6))
        .collect();

    let mut store = ParticleStore::with_capacity(256);
    let particles: Vec<Particle> = (0..40)
        .map(|i| {
            Particle::new(
                (i % n as u64) as u32,
                0.5,
                0.0,
                0.0,
                SoluteProperties::new(2160.0, 0.05844, 2.0),
                1_000_000,
                1e-6 + (i as f64) * 1e-8,
                1e-18,
                Some(i),
            )
        })
        .collect();
    store.append(&particles).unwrap();

    let mut gridboxes = gridboxes;
    CountingSort::sort(&mut store, &mut gridboxes);

    let scheduler = ProcessScheduler::new(vec![
        Box::new(FixedIntervalProcess { dt: 1.0, phase: 0.0 }),
        Box::new(FixedIntervalProcess { dt: 1.0, phase: 0.0 }),
        Box::new(FixedIntervalProcess { dt: 2.0, phase: 0.0 }),
    ]);

    let mut driver = DataPlaneDriver::new(
        gbxmap,
        gridboxes,
        store,
        SuperdropletIdGen::new(100),
        RngPool::new(11),
        scheduler,
        sample_constants(),
        SedimentationPlusWind {
            terminal_velocity: RogersYauTerminalVelocity,
        },
        NullBoundaryConditions,
        GolovinKernel { b: 1.5e3 },
        Coalescence,
        CondensationSolver {
            tolerances: SolverTolerances::default(),
            rho_l: 1000.0,
            rho_dry: 1.2,
            latent_heat_vapor: 2.5e6,
            specific_heat: 1005.0,
            apply_back_reaction: true,
        },
    );

    let mut observer = NullObserver;
    let mut t = 0.0;
    for step in 0..5u64 {
        t = driver.step(t, step, &mut observer).unwrap();

        let total_multiplicity_before: u64 = driver
            .store
            .get_domain()
            .iter()
            .map(|p| p.multiplicity)
            .sum();
        assert!(total_multiplicity_before > 0);

        for gbx in &driver.gridboxes {
            for p in &driver.store.get_domain()[gbx.refs.0..gbx.refs.1] {
                assert_eq!(p.sdgbxindex, gbx.index);
                assert!(p.satisfies_radius_invariant());
            }
        }
    }
    assert_eq!(t, 5.0);
}
