//! Orchestrates one coupling step across the whole data-plane pipeline:
//! motion, transport, boundary conditions, condensation, and collision, in
//! the order spec §5 fixes.
//!
//! Grounded on the teacher crate's `simulation::Simulation::step` (owns all
//! mutable state, drives one tick end to end) generalized from a flocking
//! update to the superdroplet coupling step, and on spec §5's per-step
//! ordering: motion -> transport -> boundary conditions -> condensation ->
//! collision -> observe.

use crate::boundary::BoundaryConditions;
use crate::collision::{CollisionEngine, CollisionKernel, EnactmentRule};
use crate::condensation::CondensationSolver;
use crate::config::Constants;
use crate::error::CoreResult;
use crate::gridbox::Gridbox;
use crate::gridboxmap::GridboxMap;
use crate::idgen::SuperdropletIdGen;
use crate::motion::{Motion, MotionKernel};
use crate::observer::Observer;
use crate::rng_pool::RngPool;
use crate::scheduler::ProcessScheduler;
use crate::sort::CountingSort;
use crate::store::ParticleStore;
use crate::thermo::{derive_step_params, moist_specific_heat};
use crate::transport::{NullExchangeHook, TransportAcrossDomain};

/// Which sub-processes fire on a given coupling tick, matching the order
/// they were registered with the [`ProcessScheduler`]: motion, condensation,
/// collision.
pub const PROCESS_MOTION: usize = 0;
pub const PROCESS_CONDENSATION: usize = 1;
pub const PROCESS_COLLISION: usize = 2;

/// Owns the whole particle domain and drives it forward one coupling step
/// at a time.
pub struct DataPlaneDriver<M: Motion, B: BoundaryConditions, K: CollisionKernel, E: EnactmentRule> {
    pub gbxmap: GridboxMap,
    pub gridboxes: Vec<Gridbox>,
    pub store: ParticleStore,
    pub idgen: SuperdropletIdGen,
    pub rng_pool: RngPool,
    pub scheduler: ProcessScheduler,
    pub constants: Constants,

    motion_kernel: MotionKernel<M>,
    boundary: B,
    collision_engine: CollisionEngine<K, E>,
    condensation_solver: CondensationSolver,
    exchange: TransportAcrossDomain<NullExchangeHook>,
}

impl<M: Motion, B: BoundaryConditions, K: CollisionKernel, E: EnactmentRule>
    DataPlaneDriver<M, B, K, E>
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gbxmap: GridboxMap,
        mut gridboxes: Vec<Gridbox>,
        mut store: ParticleStore,
        idgen: SuperdropletIdGen,
        rng_pool: RngPool,
        scheduler: ProcessScheduler,
        constants: Constants,
        motion: M,
        boundary: B,
        collision_kernel: K,
        enactment: E,
        condensation_solver: CondensationSolver,
    ) -> Self {
        CountingSort::sort(&mut store, &mut gridboxes);
        Self {
            gbxmap,
            gridboxes,
            store,
            idgen,
            rng_pool,
            scheduler,
            constants,
            motion_kernel: MotionKernel::new(motion),
            boundary,
            collision_engine: CollisionEngine::new(collision_kernel, enactment),
            condensation_solver,
            exchange: TransportAcrossDomain::default(),
        }
    }

    /// Advances the domain from `t` to the scheduler's next coupling time,
    /// running exactly the sub-processes that fire there, and reports the
    /// new state to `observer`. Returns the new time.
    pub fn step(&mut self, t: f64, step_index: u64, observer: &mut dyn Observer) -> CoreResult<f64> {
        let (next_t, fired) = self.scheduler.advance(t);
        let dt_of = |process: usize| {
            fired
                .iter()
                .find(|(i, _)| *i == process)
                .map(|(_, dt)| *dt)
        };

        let mut boundary_rng = self.rng_pool.stream(usize::MAX, step_index);

        if let Some(dt) = dt_of(PROCESS_MOTION) {
            self.motion_kernel.advance(
                dt,
                &self.gbxmap,
                &self.gridboxes,
                self.store.get_domain_mut(),
            )?;
            self.exchange.transport(&mut self.gridboxes, &mut self.store);
            self.boundary.apply(
                &self.gbxmap,
                &mut self.gridboxes,
                &mut self.store,
                &mut self.idgen,
                &mut boundary_rng,
            )?;
        }

        if let Some(dt) = dt_of(PROCESS_CONDENSATION) {
            self.step_condensation(dt)?;
        }

        if let Some(dt) = dt_of(PROCESS_COLLISION) {
            self.step_collision(dt, step_index);
        }

        observer.snapshot_time(next_t);
        observer.snapshot_state(&self.gridboxes);
        observer.snapshot_particles(self.store.get_domain());
        observer.snapshot_nth_mass_moment(&self.gridboxes, self.store.get_domain(), 0);
        observer.snapshot_nth_mass_moment(&self.gridboxes, self.store.get_domain(), 3);

        Ok(next_t)
    }

    fn step_condensation(&mut self, dt: f64) -> CoreResult<()> {
        let domain = self.store.get_domain_mut();
        for gbx in self.gridboxes.iter_mut() {
            let (lo, hi) = gbx.refs;
            let particles = &mut domain[lo..hi];
            for p in particles.iter_mut() {
                if !p.is_alive() {
                    continue;
                }
                let params =
                    derive_step_params(&self.constants, &gbx.state, &p.solute, p.solute_mass);
                let r_new = crate::condensation::solve_condensation(
                    p.radius,
                    dt,
                    &params,
                    &self.condensation_solver.tolerances,
                )?;
                let delta_r = r_new - p.radius;
                p.radius = r_new;
                let delta_mass = 4.0 * std::f64::consts::PI
                    * self.condensation_solver.rho_l
                    * p.radius
                    * p.radius
                    * p.multiplicity as f64
                    * delta_r;
                if self.condensation_solver.apply_back_reaction {
                    let delta_qc = delta_mass / (self.condensation_solver.rho_dry * gbx.volume);
                    let cp = moist_specific_heat(gbx.state.qv, gbx.state.qc);
                    gbx.state.qc += delta_qc;
                    gbx.state.qv -= delta_qc;
                    gbx.state.temperature +=
                        (self.condensation_solver.latent_heat_vapor / cp) * delta_qc;
                }
            }
        }
        Ok(())
    }

    fn step_collision(&mut self, dt: f64, step_index: u64) {
        let domain = self.store.get_domain_mut();
        for (i, gbx) in self.gridboxes.iter().enumerate() {
            let (lo, hi) = gbx.refs;
            if hi - lo < 2 {
                continue;
            }
            let mut rng = self.rng_pool.stream(i, step_index);
            self.collision_engine
                .step_gridbox(dt, gbx.volume, &mut domain[lo..hi], &mut rng);
        }
    }
}
