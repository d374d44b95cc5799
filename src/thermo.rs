//! Small thermodynamic helpers supporting the condensation solver: moist
//! specific heat, saturation vapor pressure, and the Kohler A/B factors.
//!
//! The moist specific heat follows
//! `original_source/libs/thermo_solver/differential_functions.cpp`'s
//! `moist_specifc_heat`: `cp_dry + cp_v * qv + c_l * qc`. Saturation vapor
//! pressure and the Kohler factors are standard cloud-physics forms not
//! spelled out in the distilled spec; their exact constants are recorded
//! as an Open Question decision in `DESIGN.md`.

use crate::condensation::StepParams;
use crate::config::Constants;
use crate::gridbox::ThermoState;
use crate::particle::SoluteProperties;

pub const CP_DRY: f64 = 1004.6;
pub const CP_VAPOR: f64 = 1870.0;
pub const CL_LIQUID: f64 = 4190.0;
pub const GAS_CONSTANT_UNIVERSAL: f64 = 8.314;
pub const MOLAR_MASS_WATER: f64 = 0.018015;

/// Effective specific heat capacity of moist air: dry air plus vapor plus
/// condensate contributions.
pub fn moist_specific_heat(qv: f64, qc: f64) -> f64 {
    CP_DRY + CP_VAPOR * qv + CL_LIQUID * qc
}

/// Saturation vapor pressure over a plane water surface, Tetens' formula
/// (Pa, T in Kelvin).
pub fn saturation_vapor_pressure(temperature: f64) -> f64 {
    let t_celsius = temperature - 273.15;
    610.94 * (17.625 * t_celsius / (t_celsius + 243.04)).exp()
}

/// Saturation mixing ratio at pressure `p` (Pa) and temperature `t` (K).
pub fn saturation_mixing_ratio(pressure: f64, temperature: f64) -> f64 {
    let es = saturation_vapor_pressure(temperature);
    0.622 * es / (pressure - es)
}

/// Supersaturation ratio `S = qv / qsat`.
pub fn supersaturation_ratio(pressure: f64, temperature: f64, qv: f64) -> f64 {
    qv / saturation_mixing_ratio(pressure, temperature)
}

/// Kohler curvature term `A = 2 sigma Mw / (R T rho_l)`.
pub fn kohler_a(constants: &Constants, temperature: f64) -> f64 {
    2.0 * constants.surface_tension * MOLAR_MASS_WATER
        / (GAS_CONSTANT_UNIVERSAL * temperature * constants.rho_l)
}

/// Kohler solute term `B = 3 i Mw m_sol / (4 pi rho_l Msol)`.
pub fn kohler_b(constants: &Constants, solute: &SoluteProperties, solute_mass: f64) -> f64 {
    3.0 * solute.ionic_factor * MOLAR_MASS_WATER * solute_mass
        / (4.0 * std::f64::consts::PI * constants.rho_l * solute.molecular_weight)
}

/// Combined heat/vapor diffusion factor `rho_l * (F_k + F_d)`, a simplified
/// form increasing with temperature through the exponential dependence of
/// vapor diffusivity and decreasing through thermal conductivity.
pub fn ffactor(constants: &Constants, pressure: f64, temperature: f64) -> f64 {
    let fk = (constants.latent_heat_vapor / (461.5 * temperature) - 1.0) * constants.latent_heat_vapor
        / (constants.thermal_conductivity * temperature);
    let fd = 461.5 * temperature / (constants.vapor_diffusivity * saturation_vapor_pressure(temperature));
    let _ = pressure;
    constants.rho_l * (fk + fd)
}

/// Builds the per-droplet [`StepParams`] the condensation solver needs for
/// one particle, from the gridbox's thermodynamic state and the particle's
/// solute.
pub fn derive_step_params(
    constants: &Constants,
    thermo: &ThermoState,
    solute: &SoluteProperties,
    solute_mass: f64,
) -> StepParams {
    StepParams {
        s_ratio: supersaturation_ratio(thermo.pressure, thermo.temperature, thermo.qv),
        akoh: kohler_a(constants, thermo.temperature),
        bkoh: kohler_b(constants, solute, solute_mass),
        ffactor: ffactor(constants, thermo.pressure, thermo.temperature),
    }
}
