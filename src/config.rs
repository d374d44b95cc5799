//! TOML-deserializable configuration and constants, matching the
//! `program <config-path> <constants-path>` CLI surface (spec §6).
//!
//! Parsing itself is ambient glue (the teacher crate reaches for `toml` +
//! `serde` the same way), but the shapes produced here are part of the
//! core's construction contract: [`Config::reconcile`] is where a
//! `ConfigMismatch` gets raised.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Run-time configuration: coupling cadence, input paths, which optional
/// kernels are enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fixed coupling step, seconds. Must equal the coupled-dynamics
    /// driver's own coupling step.
    pub coupling_step_seconds: f64,
    /// Motion sub-step, seconds.
    pub motion_step_seconds: f64,
    /// Condensation sub-step, seconds.
    pub condensation_step_seconds: f64,
    /// Collision sub-step, seconds.
    pub collision_step_seconds: f64,
    pub grid_input_path: String,
    pub particle_input_path: String,
    pub output_dir: String,
    pub rng_seed: u64,
    pub enable_condensation_back_reaction: bool,
    pub periodic_z: bool,
    pub periodic_x: bool,
    pub periodic_y: bool,
    /// Total simulated time, seconds. The run advances in coupling-step
    /// strides until reaching this bound.
    pub end_time_seconds: f64,
    /// Write JSON snapshots instead of bincode.
    pub output_json: bool,
}

impl Config {
    /// Checks this configuration against the coupled-dynamics driver's
    /// coupling step, raising `ConfigMismatch` (fatal, at construction) on
    /// disagreement.
    pub fn reconcile(&self, external_coupling_step_seconds: f64) -> CoreResult<()> {
        if (self.coupling_step_seconds - external_coupling_step_seconds).abs() > 1e-12 {
            return Err(CoreError::ConfigMismatch(format!(
                "core coupling step {} s does not match coupled-dynamics step {} s",
                self.coupling_step_seconds, external_coupling_step_seconds
            )));
        }
        Ok(())
    }
}

/// Physical constants, loaded from a separate file so they can be shared
/// across runs/config variants without duplication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Constants {
    pub rho_l: f64,
    pub rho_dry: f64,
    pub latent_heat_vapor: f64,
    pub specific_heat: f64,
    pub solute_density: f64,
    pub solute_molecular_weight: f64,
    pub solute_ionic_factor: f64,
    /// Surface tension of water, N/m, for the Kohler curvature term.
    pub surface_tension: f64,
    /// Thermal conductivity of air, W/(m K), for the condensation F_k term.
    pub thermal_conductivity: f64,
    /// Vapor diffusivity in air, m^2/s, for the condensation F_d term.
    pub vapor_diffusivity: f64,
}

/// Loads and parses a TOML config file. IO/parse failures are reported
/// with the open-ended `Box<dyn Error>` the teacher crate uses at its
/// external-wrapper boundary, not `CoreError` (the shape is out of scope,
/// only the resulting struct is part of the core's contract).
pub fn load_config(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&text)?;
    Ok(config)
}

pub fn load_constants(path: &str) -> Result<Constants, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let constants: Constants = toml::from_str(&text)?;
    Ok(constants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            coupling_step_seconds: 2.0,
            motion_step_seconds: 1.0,
            condensation_step_seconds: 0.5,
            collision_step_seconds: 1.0,
            grid_input_path: "grid.bin".to_string(),
            particle_input_path: "particles.bin".to_string(),
            output_dir: "./data".to_string(),
            rng_seed: 1,
            enable_condensation_back_reaction: true,
            periodic_z: false,
            periodic_x: true,
            periodic_y: true,
            end_time_seconds: 10.0,
            output_json: false,
        }
    }

    #[test]
    fn reconcile_accepts_matching_coupling_step() {
        let cfg = sample_config();
        assert!(cfg.reconcile(2.0).is_ok());
    }

    #[test]
    fn reconcile_rejects_mismatched_coupling_step() {
        let cfg = sample_config();
        let err = cfg.reconcile(3.0).unwrap_err();
        assert!(matches!(err, CoreError::ConfigMismatch(_)));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = sample_config();
        let text = toml::to_string(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.rng_seed, cfg.rng_seed);
        assert_eq!(parsed.periodic_x, cfg.periodic_x);
    }
}
