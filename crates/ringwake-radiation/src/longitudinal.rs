//! Longitudinal radiation damping and energy loss.

use rand::Rng;
use ringwake_beam::Particles;
use ringwake_math::C_LIGHT;

use crate::{Result, damp_and_excite, positive};

/// Dispersion at the observation point.
///
/// With [`Dispersion::On`] the dispersive orbit `D·dp` is removed before the
/// momentum update and restored from the new `dp` afterwards, so damping
/// acts on the betatron part only. [`Dispersion::Off`] skips both steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dispersion {
    #[default]
    Off,
    On { d_x: f64, d_y: f64 },
}

/// Damping, excitation and mean energy loss of `dp`.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchrotronRadiationLongitudinal {
    /// Longitudinal damping time (turns).
    pub tau_z: f64,
    /// Equilibrium relative momentum spread.
    pub sigma_dpp0: f64,
    /// Energy radiated per turn by one particle (eV).
    pub e_loss_ev: f64,
    pub dispersion: Dispersion,
}

impl SynchrotronRadiationLongitudinal {
    pub fn new(tau_z: f64, sigma_dpp0: f64, e_loss_ev: f64) -> Result<Self> {
        positive("tau_z", tau_z)?;
        if !(sigma_dpp0 >= 0.0) {
            return Err(crate::RadiationError::InvalidParameter(format!(
                "sigma_dpp0 must be non-negative, got {sigma_dpp0}"
            )));
        }
        Ok(Self {
            tau_z,
            sigma_dpp0,
            e_loss_ev,
            dispersion: Dispersion::Off,
        })
    }

    pub fn with_dispersion(mut self, d_x: f64, d_y: f64) -> Self {
        self.dispersion = Dispersion::On { d_x, d_y };
        self
    }

    /// Relative momentum lost per turn.
    pub fn energy_loss(&self, beam: &Particles) -> f64 {
        let beta = beam.beta();
        self.e_loss_ev * beam.charge.abs() / (beam.mass * C_LIGHT * C_LIGHT * beam.gamma)
            / (beta * beta)
    }

    /// Apply one turn.
    pub fn track<R: Rng + ?Sized>(&self, beam: &mut Particles, rng: &mut R) -> Result<()> {
        beam.validate()?;
        match self.dispersion {
            Dispersion::Off => self.update_dp(beam, rng),
            Dispersion::On { d_x, d_y } => {
                beam.x.axpy(-d_x, &beam.dp, 1.0);
                beam.y.axpy(-d_y, &beam.dp, 1.0);
                self.update_dp(beam, rng);
                beam.x.axpy(d_x, &beam.dp, 1.0);
                beam.y.axpy(d_y, &beam.dp, 1.0);
            }
        }
        Ok(())
    }

    fn update_dp<R: Rng + ?Sized>(&self, beam: &mut Particles, rng: &mut R) {
        let loss = self.energy_loss(beam);
        damp_and_excite(&mut beam.dp, self.tau_z, self.sigma_dpp0, rng);
        beam.dp.add_scalar_mut(-loss);
    }
}
