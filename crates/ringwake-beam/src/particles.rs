//! Macroparticle ensemble.

use ringwake_math::{C_LIGHT, DVec, beta_from_gamma};

use crate::{BeamError, Result};

/// A beam (or bunch) of macroparticles.
///
/// Each macroparticle stands for `particlenumber_per_mp` real particles.
/// Coordinates are stored as one array per phase-space variable so that
/// maps act on the whole ensemble at once.
#[derive(Debug, Clone)]
pub struct Particles {
    /// Horizontal offset (m).
    pub x: DVec,
    /// Horizontal angle (rad).
    pub xp: DVec,
    /// Vertical offset (m).
    pub y: DVec,
    /// Vertical angle (rad).
    pub yp: DVec,
    /// Longitudinal position relative to the reference particle (m).
    /// Larger `z` is further towards the head.
    pub z: DVec,
    /// Relative momentum deviation.
    pub dp: DVec,
    /// Charge of one real particle (C).
    pub charge: f64,
    /// Rest mass of one real particle (kg).
    pub mass: f64,
    /// Lorentz factor of the reference particle.
    pub gamma: f64,
    /// Real particles represented by each macroparticle.
    pub particlenumber_per_mp: f64,
    /// Machine circumference (m).
    pub circumference: f64,
}

impl Particles {
    /// Create an ensemble of `n` macroparticles at the reference orbit.
    pub fn new(
        n: usize,
        charge: f64,
        mass: f64,
        gamma: f64,
        particlenumber_per_mp: f64,
        circumference: f64,
    ) -> Result<Self> {
        if !(gamma > 1.0) {
            return Err(BeamError::InvalidParameter(format!(
                "gamma must exceed 1, got {gamma}"
            )));
        }
        if !(mass > 0.0) {
            return Err(BeamError::InvalidParameter(format!(
                "mass must be positive, got {mass}"
            )));
        }
        if !(circumference > 0.0) {
            return Err(BeamError::InvalidParameter(format!(
                "circumference must be positive, got {circumference}"
            )));
        }

        Ok(Self {
            x: DVec::zeros(n),
            xp: DVec::zeros(n),
            y: DVec::zeros(n),
            yp: DVec::zeros(n),
            z: DVec::zeros(n),
            dp: DVec::zeros(n),
            charge,
            mass,
            gamma,
            particlenumber_per_mp,
            circumference,
        })
    }

    /// Replace all six coordinate arrays at once.
    pub fn with_coordinates(
        mut self,
        x: DVec,
        xp: DVec,
        y: DVec,
        yp: DVec,
        z: DVec,
        dp: DVec,
    ) -> Result<Self> {
        self.x = x;
        self.xp = xp;
        self.y = y;
        self.yp = yp;
        self.z = z;
        self.dp = dp;
        self.validate()?;
        Ok(self)
    }

    /// Number of macroparticles.
    pub fn macroparticle_number(&self) -> usize {
        self.z.len()
    }

    /// Total number of real particles.
    pub fn intensity(&self) -> f64 {
        self.macroparticle_number() as f64 * self.particlenumber_per_mp
    }

    /// Relativistic β of the reference particle.
    pub fn beta(&self) -> f64 {
        beta_from_gamma(self.gamma)
    }

    /// Reference momentum p0 = γβmc (kg·m/s).
    pub fn p0(&self) -> f64 {
        self.gamma * self.beta() * self.mass * C_LIGHT
    }

    /// Check that every coordinate array has the same length.
    pub fn validate(&self) -> Result<()> {
        let expected = self.z.len();
        let arrays: [(&'static str, &DVec); 5] = [
            ("x", &self.x),
            ("xp", &self.xp),
            ("y", &self.y),
            ("yp", &self.yp),
            ("dp", &self.dp),
        ];
        for (name, array) in arrays {
            if array.len() != expected {
                return Err(BeamError::LengthMismatch {
                    name,
                    len: array.len(),
                    expected,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ringwake_math::{E_CHARGE, M_PROTON};

    fn lhc_like(n: usize) -> Particles {
        let p0 = 7000e9 * E_CHARGE / C_LIGHT;
        let gamma = (1.0 + (p0 / (M_PROTON * C_LIGHT)).powi(2)).sqrt();
        Particles::new(n, E_CHARGE, M_PROTON, gamma, 2.3e11 / n as f64, 14.96).unwrap()
    }

    #[test]
    fn test_reference_momentum() {
        let beam = lhc_like(10);
        let p0 = 7000e9 * E_CHARGE / C_LIGHT;
        assert_relative_eq!(beam.p0(), p0, max_relative = 1e-12);
        assert!(beam.beta() < 1.0);
    }

    #[test]
    fn test_intensity() {
        let beam = lhc_like(1000);
        assert_relative_eq!(beam.intensity(), 2.3e11, max_relative = 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let beam = lhc_like(4);
        let result = beam.with_coordinates(
            DVec::zeros(4),
            DVec::zeros(3),
            DVec::zeros(4),
            DVec::zeros(4),
            DVec::zeros(4),
            DVec::zeros(4),
        );
        assert!(matches!(
            result,
            Err(BeamError::LengthMismatch { name: "xp", len: 3, expected: 4 })
        ));
    }

    #[test]
    fn test_rejects_subluminal_gamma() {
        assert!(Particles::new(1, E_CHARGE, M_PROTON, 0.5, 1.0, 1.0).is_err());
    }
}
