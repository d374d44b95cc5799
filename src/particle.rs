//! Superdroplet attributes.
//!
//! A particle represents a multiplicity of real droplets with identical
//! attributes. Solute properties are embedded by value rather than shared
//! through a pointer, so particles carry no reference-counted state and the
//! store can be freely cloned, sent across threads, or memcpy'd (Design
//! Notes: no cycles, no global mutable state).

use serde::{Deserialize, Serialize};

/// Sentinel gridbox index meaning "no longer in the domain".
pub const OOB_GBXINDEX: u32 = u32::MAX;

/// Immutable, embedded solute properties shared in *value*, not in identity,
/// by every particle created from the same dry aerosol population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoluteProperties {
    /// Solute density, kg/m^3.
    pub density: f64,
    /// Molecular weight, kg/mol.
    pub molecular_weight: f64,
    /// Van't Hoff dissociation factor.
    pub ionic_factor: f64,
}

impl SoluteProperties {
    pub fn new(density: f64, molecular_weight: f64, ionic_factor: f64) -> Self {
        Self {
            density,
            molecular_weight,
            ionic_factor,
        }
    }
}

/// One computational superdroplet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Index of the owning gridbox, or [`OOB_GBXINDEX`] if no longer alive.
    pub sdgbxindex: u32,
    /// Vertical coordinate (conventionally up).
    pub coord3: f64,
    /// Horizontal-x coordinate.
    pub coord1: f64,
    /// Horizontal-y coordinate.
    pub coord2: f64,
    /// Embedded, immutable solute properties.
    pub solute: SoluteProperties,
    /// Multiplicity: number of real droplets this superdroplet stands for.
    pub multiplicity: u64,
    /// Radius, metres.
    pub radius: f64,
    /// Solute mass, kg.
    pub solute_mass: f64,
    /// Optional stable identifier, assigned at creation.
    pub id: Option<u64>,
}

impl Particle {
    pub fn new(
        sdgbxindex: u32,
        coord3: f64,
        coord1: f64,
        coord2: f64,
        solute: SoluteProperties,
        multiplicity: u64,
        radius: f64,
        solute_mass: f64,
        id: Option<u64>,
    ) -> Self {
        Self {
            sdgbxindex,
            coord3,
            coord1,
            coord2,
            solute,
            multiplicity,
            radius,
            solute_mass,
            id,
        }
    }

    /// A placeholder out-of-bounds particle used to pre-size scratch
    /// buffers before scattering real particles into them.
    pub fn default_oob() -> Self {
        Self::new(
            OOB_GBXINDEX,
            0.0,
            0.0,
            0.0,
            SoluteProperties::new(0.0, 0.0, 0.0),
            0,
            0.0,
            0.0,
            None,
        )
    }

    /// A particle is alive iff it still belongs to a real gridbox.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.sdgbxindex != OOB_GBXINDEX
    }

    /// Marks this particle as out-of-bounds, removing it from the domain on
    /// the next sort.
    #[inline]
    pub fn mark_oob(&mut self) {
        self.sdgbxindex = OOB_GBXINDEX;
    }

    /// Minimum radius for a given solute mass: the dry-salt radius assuming
    /// the solute forms a sphere of its own density.
    #[inline]
    pub fn dry_radius(solute_mass: f64, solute_density: f64) -> f64 {
        (3.0 * solute_mass / (4.0 * std::f64::consts::PI * solute_density)).cbrt()
    }

    /// The invariant `r >= dry_radius(m_s, rho_sol)`.
    pub fn satisfies_radius_invariant(&self) -> bool {
        self.radius >= Self::dry_radius(self.solute_mass, self.solute.density)
    }
}
