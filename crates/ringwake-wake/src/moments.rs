//! Per-slice source moments.

use ringwake_beam::SliceSet;

use crate::function::KickKind;
use crate::series::{HeadTail, Series};

/// What a wake component integrates over the slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMoment {
    /// Particle count `N`.
    Monopole,
    /// `N·⟨x⟩`.
    DipoleX,
    /// `N·⟨y⟩`.
    DipoleY,
}

impl From<KickKind> for SourceMoment {
    fn from(kind: KickKind) -> Self {
        match kind {
            KickKind::DipoleX => SourceMoment::DipoleX,
            KickKind::DipoleY => SourceMoment::DipoleY,
            KickKind::QuadrupoleX | KickKind::QuadrupoleY | KickKind::Longitudinal => {
                SourceMoment::Monopole
            }
        }
    }
}

/// Dipole moment per slice, `N·⟨offset⟩`, head-tail order.
///
/// Empty slices have an undefined mean; their moment is exactly zero.
pub fn dipole_moments(num_charges: &[f64], mean_offset: &[f64]) -> Series<HeadTail> {
    let values = num_charges
        .iter()
        .zip(mean_offset)
        .map(|(&n, &mean)| {
            if n == 0.0 || !mean.is_finite() {
                0.0
            } else {
                n * mean
            }
        })
        .collect();
    Series::new(values)
}

/// Source moment of the requested kind for every slice, head-tail order.
pub fn source_moments(slices: &SliceSet, moment: SourceMoment) -> Series<HeadTail> {
    let num_charges = slices.num_charges_per_slice();
    match moment {
        SourceMoment::Monopole => Series::new(num_charges),
        SourceMoment::DipoleX => dipole_moments(&num_charges, &slices.mean_x),
        SourceMoment::DipoleY => dipole_moments(&num_charges, &slices.mean_y),
    }
}
