use clap::Parser;

use superdrop_core::binio::{decode_grid_frame, decode_particle_frame};
use superdrop_core::boundary::NullBoundaryConditions;
use superdrop_core::cli::Cli;
use superdrop_core::collision::{Coalescence, GolovinKernel};
use superdrop_core::condensation::{CondensationSolver, SolverTolerances};
use superdrop_core::config::{load_config, load_constants};
use superdrop_core::driver::DataPlaneDriver;
use superdrop_core::gridbox::{Gridbox, ThermoState};
use superdrop_core::gridboxmap::{AxisLayout, BoundaryPolicy, GridboxMap};
use superdrop_core::idgen::SuperdropletIdGen;
use superdrop_core::motion::{RogersYauTerminalVelocity, SedimentationPlusWind};
use superdrop_core::observer::{BincodeObserver, JsonObserver, Observer};
use superdrop_core::rng_pool::RngPool;
use superdrop_core::scheduler::{FixedIntervalProcess, ProcessScheduler};
use superdrop_core::store::ParticleStore;

fn policy(periodic: bool) -> BoundaryPolicy {
    if periodic {
        BoundaryPolicy::Periodic
    } else {
        BoundaryPolicy::Finite
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config_path)?;
    let constants = load_constants(&cli.constants_path)?;
    config.reconcile(config.coupling_step_seconds)?;

    let grid_bytes = std::fs::read(&config.grid_input_path)?;
    let geometries = decode_grid_frame(&grid_bytes)?;
    let nz = geometries.len() as u32;

    let solute = superdrop_core::particle::SoluteProperties::new(
        constants.solute_density,
        constants.solute_molecular_weight,
        constants.solute_ionic_factor,
    );
    let particle_bytes = std::fs::read(&config.particle_input_path)?;
    let initial_particles = decode_particle_frame(&particle_bytes, solute)?;

    let gbxmap = GridboxMap::new(
        geometries.clone(),
        AxisLayout {
            ndim: nz,
            stride: 1,
            policy: policy(config.periodic_z),
        },
        AxisLayout {
            ndim: 1,
            stride: nz,
            policy: policy(config.periodic_x),
        },
        AxisLayout {
            ndim: 1,
            stride: nz,
            policy: policy(config.periodic_y),
        },
    );
    let gridboxes: Vec<Gridbox> = geometries
        .iter()
        .enumerate()
        .map(|(i, g)| Gridbox::new(i as u32, ThermoState::new(1e5, 290.0, 0.01, 0.0), g.volume))
        .collect();

    let mut store = ParticleStore::with_capacity(initial_particles.len() * 4);
    store.append(&initial_particles)?;

    let scheduler = ProcessScheduler::new(vec![
        Box::new(FixedIntervalProcess {
            dt: config.motion_step_seconds,
            phase: 0.0,
        }),
        Box::new(FixedIntervalProcess {
            dt: config.condensation_step_seconds,
            phase: 0.0,
        }),
        Box::new(FixedIntervalProcess {
            dt: config.collision_step_seconds,
            phase: 0.0,
        }),
    ]);

    let mut driver = DataPlaneDriver::new(
        gbxmap,
        gridboxes,
        store,
        SuperdropletIdGen::new(0),
        RngPool::new(config.rng_seed),
        scheduler,
        constants,
        SedimentationPlusWind {
            terminal_velocity: RogersYauTerminalVelocity,
        },
        NullBoundaryConditions,
        GolovinKernel { b: 1.5e3 },
        Coalescence,
        CondensationSolver {
            tolerances: SolverTolerances::default(),
            rho_l: constants.rho_l,
            rho_dry: constants.rho_dry,
            latent_heat_vapor: constants.latent_heat_vapor,
            specific_heat: constants.specific_heat,
            apply_back_reaction: config.enable_condensation_back_reaction,
        },
    );

    let mut observer: Box<dyn Observer> = if config.output_json {
        Box::new(JsonObserver::new(&config.output_dir)?)
    } else {
        Box::new(BincodeObserver::new(&config.output_dir)?)
    };

    let mut t = 0.0;
    let mut step_index = 0u64;
    while t < config.end_time_seconds {
        t = driver.step(t, step_index, observer.as_mut())?;

        step_index += 1;
    }

    log::info!("run complete: {step_index} coupling steps, final time {t}");
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("fatal: {err}");
        std::process::exit(1);
    }
}
