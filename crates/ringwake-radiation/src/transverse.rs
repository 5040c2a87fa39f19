//! Transverse radiation damping.

use rand::Rng;
use ringwake_beam::Particles;

use crate::{Result, damp_and_excite, positive};

/// Damping and excitation of `xp` and `yp` towards the equilibrium
/// emittance. Assumes zero alpha at the observation point.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchrotronRadiationTransverse {
    /// Horizontal damping time (turns).
    pub tau_x: f64,
    /// Vertical damping time (turns).
    pub tau_y: f64,
    /// Normalised horizontal equilibrium emittance (m·rad).
    pub epsn_x: f64,
    /// Normalised vertical equilibrium emittance (m·rad).
    pub epsn_y: f64,
    /// Average horizontal beta function (m).
    pub beta_x: f64,
    /// Average vertical beta function (m).
    pub beta_y: f64,
}

impl SynchrotronRadiationTransverse {
    pub fn new(
        tau_x: f64,
        tau_y: f64,
        epsn_x: f64,
        epsn_y: f64,
        beta_x: f64,
        beta_y: f64,
    ) -> Result<Self> {
        let map = Self {
            tau_x,
            tau_y,
            epsn_x,
            epsn_y,
            beta_x,
            beta_y,
        };
        map.validate()?;
        Ok(map)
    }

    pub fn validate(&self) -> Result<()> {
        positive("tau_x", self.tau_x)?;
        positive("tau_y", self.tau_y)?;
        positive("beta_x", self.beta_x)?;
        positive("beta_y", self.beta_y)?;
        if !(self.epsn_x >= 0.0 && self.epsn_y >= 0.0) {
            return Err(crate::RadiationError::InvalidParameter(format!(
                "equilibrium emittances must be non-negative, got ({}, {})",
                self.epsn_x, self.epsn_y
            )));
        }
        Ok(())
    }

    /// Equilibrium angular spreads `(σ_xp, σ_yp)` for `beam`.
    pub fn equilibrium_spread(&self, beam: &Particles) -> (f64, f64) {
        let bg = beam.beta() * beam.gamma;
        (
            (self.epsn_x / self.beta_x / bg).sqrt(),
            (self.epsn_y / self.beta_y / bg).sqrt(),
        )
    }

    /// Apply one turn.
    pub fn track<R: Rng + ?Sized>(&self, beam: &mut Particles, rng: &mut R) -> Result<()> {
        beam.validate()?;
        let (sigma_xp, sigma_yp) = self.equilibrium_spread(beam);
        damp_and_excite(&mut beam.xp, self.tau_x, sigma_xp, rng);
        damp_and_excite(&mut beam.yp, self.tau_y, sigma_yp, rng);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ringwake_math::{DVec, E_CHARGE, M_ELECTRON};

    fn beam(n: usize, xp: f64) -> Particles {
        let mut beam = Particles::new(n, E_CHARGE, M_ELECTRON, 1e4, 1e8, 100.0).unwrap();
        beam.xp = DVec::from_element(n, xp);
        beam.yp = DVec::from_element(n, -xp);
        beam
    }

    #[test]
    fn test_pure_damping_without_excitation() {
        let map = SynchrotronRadiationTransverse::new(100.0, 50.0, 0.0, 0.0, 10.0, 10.0).unwrap();
        let mut b = beam(4, 1e-3);
        let mut rng = StdRng::seed_from_u64(1);
        map.track(&mut b, &mut rng).unwrap();
        for i in 0..4 {
            assert_relative_eq!(b.xp[i], 1e-3 * 0.98, max_relative = 1e-14);
            assert_relative_eq!(b.yp[i], -1e-3 * 0.96, max_relative = 1e-14);
        }
    }

    #[test]
    fn test_relaxes_to_equilibrium_spread() {
        let tau = 50.0;
        let map = SynchrotronRadiationTransverse::new(tau, tau, 5e-6, 5e-6, 10.0, 10.0).unwrap();
        let mut b = beam(10_000, 0.0);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..400 {
            map.track(&mut b, &mut rng).unwrap();
        }

        let (sigma_xp, _) = map.equilibrium_spread(&b);
        // Discrete map settles at σ²/(1 - 1/τ).
        let expected = sigma_xp / (1.0 - 1.0 / tau).sqrt();
        let n = b.xp.len() as f64;
        let mean = b.xp.sum() / n;
        let std = (b.xp.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert_relative_eq!(std, expected, max_relative = 0.03);
        assert!(mean.abs() < 0.05 * expected);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let map = SynchrotronRadiationTransverse::new(20.0, 20.0, 1e-6, 1e-6, 5.0, 5.0).unwrap();
        let mut a = beam(16, 1e-4);
        let mut b = beam(16, 1e-4);
        map.track(&mut a, &mut StdRng::seed_from_u64(7)).unwrap();
        map.track(&mut b, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.xp, b.xp);
        assert_eq!(a.yp, b.yp);
    }

    #[test]
    fn test_rejects_non_positive_damping_time() {
        assert!(SynchrotronRadiationTransverse::new(0.0, 1.0, 1e-6, 1e-6, 1.0, 1.0).is_err());
        assert!(SynchrotronRadiationTransverse::new(1.0, 1.0, -1e-6, 1e-6, 1.0, 1.0).is_err());
    }
}
