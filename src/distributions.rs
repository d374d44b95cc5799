//! Number-concentration distributions used to sample new-particle radii
//! when the domain-top source injects superdroplets.
//!
//! Grounded on `original_source/libs/cartesiandomain/add_supers_at_domain_top.hpp`'s
//! `LognormalDistribution`: a lognormal PDF in radius, integrated over a
//! bin on a log10 grid to give that bin's number concentration.

use rand::Rng;
use rand_distr::{Distribution, LogNormal};

/// A lognormal number-concentration distribution in droplet radius.
#[derive(Debug, Clone, Copy)]
pub struct Lognormal {
    /// Total number concentration, m^-3.
    pub numconc: f64,
    /// Geometric mean radius, m.
    pub geomean: f64,
    /// ln of the geometric standard deviation.
    pub lnsigma: f64,
}

impl Lognormal {
    pub fn new(numconc: f64, geomean: f64, lnsigma: f64) -> Self {
        Self {
            numconc,
            geomean,
            lnsigma,
        }
    }

    /// The lognormal probability density at `radius`, normalized so that
    /// integrating `pdf(r) dr` over all positive radii gives 1.
    pub fn pdf(&self, radius: f64) -> f64 {
        if radius <= 0.0 {
            return 0.0;
        }
        let norm = 1.0 / (radius * self.lnsigma * (2.0 * std::f64::consts::PI).sqrt());
        let z = (radius.ln() - self.geomean.ln()) / self.lnsigma;
        norm * (-0.5 * z * z).exp()
    }

    /// Number concentration integrated between `r_lower` and `r_upper` by
    /// Simpson's rule, scaled by `numconc`.
    pub fn bin_numconc(&self, r_lower: f64, r_upper: f64) -> f64 {
        let mid = 0.5 * (r_lower + r_upper);
        let width = r_upper - r_lower;
        let simpson = (width / 6.0) * (self.pdf(r_lower) + 4.0 * self.pdf(mid) + self.pdf(r_upper));
        self.numconc * simpson
    }

    /// Draws a radius from this mode's lognormal shape, rejecting draws
    /// outside `[r_lower, r_upper)` so the sample stays inside the chosen
    /// bin.
    pub fn sample_radius_in_bin(&self, r_lower: f64, r_upper: f64, rng: &mut impl Rng) -> f64 {
        let dist = LogNormal::new(self.geomean.ln(), self.lnsigma)
            .expect("lnsigma must be positive and finite");
        for _ in 0..32 {
            let r: f64 = dist.sample(rng);
            if r >= r_lower && r < r_upper {
                return r;
            }
        }
        0.5 * (r_lower + r_upper)
    }
}

/// A two-mode lognormal number-concentration distribution (e.g. separate
/// aerosol and cloud-droplet modes).
#[derive(Debug, Clone, Copy)]
pub struct TwoLognormal {
    pub mode_a: Lognormal,
    pub mode_b: Lognormal,
}

impl TwoLognormal {
    pub fn bin_numconc(&self, r_lower: f64, r_upper: f64) -> f64 {
        self.mode_a.bin_numconc(r_lower, r_upper) + self.mode_b.bin_numconc(r_lower, r_upper)
    }
}

/// Either a single- or two-mode number-concentration distribution.
#[derive(Debug, Clone, Copy)]
pub enum NumConcDistribution {
    Single(Lognormal),
    Double(TwoLognormal),
}

impl NumConcDistribution {
    pub fn bin_numconc(&self, r_lower: f64, r_upper: f64) -> f64 {
        match self {
            Self::Single(l) => l.bin_numconc(r_lower, r_upper),
            Self::Double(t) => t.bin_numconc(r_lower, r_upper),
        }
    }

    /// Draws a radius within `[r_lower, r_upper)`, from whichever mode
    /// dominates that bin's number concentration for a two-mode
    /// distribution.
    pub fn sample_radius_in_bin(&self, r_lower: f64, r_upper: f64, rng: &mut impl Rng) -> f64 {
        match self {
            Self::Single(l) => l.sample_radius_in_bin(r_lower, r_upper, rng),
            Self::Double(t) => {
                let a = t.mode_a.bin_numconc(r_lower, r_upper);
                let b = t.mode_b.bin_numconc(r_lower, r_upper);
                if a >= b {
                    t.mode_a.sample_radius_in_bin(r_lower, r_upper, rng)
                } else {
                    t.mode_b.sample_radius_in_bin(r_lower, r_upper, rng)
                }
            }
        }
    }
}

/// A log10-spaced radius grid of `nbins` bins between `r_min` and `r_max`,
/// used both to draw the bin for a new superdroplet's radius and to
/// integrate number concentration per bin.
#[derive(Debug, Clone)]
pub struct Log10RadiusBins {
    pub edges: Vec<f64>,
}

impl Log10RadiusBins {
    pub fn new(r_min: f64, r_max: f64, nbins: usize) -> Self {
        let log_lo = r_min.log10();
        let log_hi = r_max.log10();
        let step = (log_hi - log_lo) / nbins as f64;
        let edges = (0..=nbins)
            .map(|i| 10f64.powf(log_lo + step * i as f64))
            .collect();
        Self { edges }
    }

    pub fn nbins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn bin_bounds(&self, i: usize) -> (f64, f64) {
        (self.edges[i], self.edges[i + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lognormal_pdf_is_nonnegative_and_peaks_near_geomean() {
        let dist = Lognormal::new(1e8, 1e-6, 0.3);
        let at_mean = dist.pdf(1e-6);
        let far = dist.pdf(1e-8);
        assert!(at_mean > 0.0);
        assert!(at_mean > far);
    }

    #[test]
    fn bin_numconc_is_positive_for_a_bin_containing_mass() {
        let dist = Lognormal::new(1e8, 1e-6, 0.3);
        let conc = dist.bin_numconc(5e-7, 2e-6);
        assert!(conc > 0.0);
    }

    #[test]
    fn log10_bins_span_requested_range() {
        let bins = Log10RadiusBins::new(1e-7, 1e-3, 10);
        assert_eq!(bins.nbins(), 10);
        assert!((bins.edges[0] - 1e-7).abs() / 1e-7 < 1e-9);
        assert!((bins.edges[10] - 1e-3).abs() / 1e-3 < 1e-9);
    }

    #[test]
    fn sampled_radius_stays_within_bin() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        let dist = Lognormal::new(1e8, 1e-6, 0.3);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let r = dist.sample_radius_in_bin(5e-7, 2e-6, &mut rng);
            assert!((5e-7..2e-6).contains(&r));
        }
    }

    #[test]
    fn two_lognormal_sums_both_modes() {
        let t = TwoLognormal {
            mode_a: Lognormal::new(1e8, 1e-6, 0.3),
            mode_b: Lognormal::new(1e6, 1e-5, 0.4),
        };
        let sum = t.bin_numconc(1e-7, 1e-4);
        let a = t.mode_a.bin_numconc(1e-7, 1e-4);
        let b = t.mode_b.bin_numconc(1e-7, 1e-4);
        assert!((sum - (a + b)).abs() < 1e-6 * sum.max(1.0));
    }
}
