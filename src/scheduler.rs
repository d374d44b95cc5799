//! Per-process sub-timestepping between coupling ticks.
//!
//! Each microphysics/motion process exposes its own cadence; the scheduler
//! advances time in strides equal to the minimum `next_step` across all
//! registered processes, invoking exactly those whose `on_step` fires at
//! that instant (spec §4.8). A fired process is always invoked with its own
//! configured `dt`, not the stride to `next_t` — on a shared multiple of
//! several processes' periods the stride can be shorter than a slower
//! process's actual timestep.

/// One microphysics/motion process with its own timestep.
pub trait Process {
    /// Strict upper bound on the next time this process wants to run.
    fn next_step(&self, t: f64) -> f64;

    /// Whether this process should run at time `t`.
    fn on_step(&self, t: f64) -> bool;

    /// This process's own configured timestep, to invoke it with (spec
    /// §4.8) rather than the coupling stride to the next event.
    fn dt(&self) -> f64;
}

/// A process that fires on a fixed-size tick, e.g. every `dt` starting
/// from `phase`.
pub struct FixedIntervalProcess {
    pub dt: f64,
    pub phase: f64,
}

impl Process for FixedIntervalProcess {
    fn next_step(&self, t: f64) -> f64 {
        let steps_elapsed = ((t - self.phase) / self.dt).floor() + 1.0;
        self.phase + steps_elapsed * self.dt
    }

    fn on_step(&self, t: f64) -> bool {
        let offset = t - self.phase;
        if offset < 0.0 {
            return false;
        }
        let ratio = offset / self.dt;
        (ratio - ratio.round()).abs() < 1e-9
    }

    fn dt(&self) -> f64 {
        self.dt
    }
}

/// Drives time forward in minimum-of-`next_step` strides across a fixed set
/// of named processes, identified by index, so a caller can branch on which
/// process fired without dynamic dispatch in the hot loop.
pub struct ProcessScheduler {
    processes: Vec<Box<dyn Process>>,
}

impl ProcessScheduler {
    pub fn new(processes: Vec<Box<dyn Process>>) -> Self {
        Self { processes }
    }

    /// Returns the next coupling time and, for each process that fires
    /// there, its index paired with its own configured `dt` — not the
    /// stride to `next_t`, since on a shared multiple that stride can be
    /// shorter than a slower process's actual timestep (spec §4.8).
    pub fn advance(&self, t: f64) -> (f64, Vec<(usize, f64)>) {
        let next_t = self
            .processes
            .iter()
            .map(|p| p.next_step(t))
            .fold(f64::INFINITY, f64::min);

        let fired: Vec<(usize, f64)> = self
            .processes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.on_step(next_t))
            .map(|(i, p)| (i, p.dt()))
            .collect();

        (next_t, fired)
    }
}
