//! Uniform longitudinal slicing.
//!
//! A [`UniformBinSlicer`] cuts `[z_min, z_max)` into `n_slices` equal bins
//! and returns a [`SliceSet`] with the population and transverse centroid of
//! every bin. Slices are stored z-ascending (tail first), the layout the
//! wake engine calls head-tail order.

use serde::{Deserialize, Serialize};

use crate::{BeamError, FillingScheme, Particles, Result};

/// Equal-width longitudinal binning over fixed cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformBinSlicer {
    /// Number of slices.
    pub n_slices: usize,
    /// Slicing range `(z_min, z_max)` (m).
    pub z_cuts: (f64, f64),
    /// Machine circumference (m).
    pub circumference: f64,
    /// Number of buckets around the ring available to bunches.
    pub h_bunch: usize,
}

impl UniformBinSlicer {
    /// Create a slicer over explicit cuts.
    pub fn new(
        n_slices: usize,
        z_cuts: (f64, f64),
        circumference: f64,
        h_bunch: usize,
    ) -> Result<Self> {
        let slicer = Self {
            n_slices,
            z_cuts,
            circumference,
            h_bunch,
        };
        slicer.validate()?;
        Ok(slicer)
    }

    /// Slicer covering every bucket from 0 up to the last occupied bucket of
    /// `filling`, with `slices_per_bucket` slices per bucket.
    pub fn full_beam(
        slices_per_bucket: usize,
        filling: &FillingScheme,
        circumference: f64,
        h_bunch: usize,
    ) -> Result<Self> {
        filling.validate()?;
        if h_bunch == 0 {
            return Err(BeamError::InvalidParameter("h_bunch must be positive".into()));
        }
        let n_buckets = filling.last() + 1;
        let bucket_length = circumference / h_bunch as f64;
        Self::new(
            n_buckets * slices_per_bucket,
            (
                (0.5 - n_buckets as f64) * bucket_length,
                0.5 * bucket_length,
            ),
            circumference,
            h_bunch,
        )
    }

    /// Check slice count, cuts and ring geometry.
    pub fn validate(&self) -> Result<()> {
        if self.n_slices == 0 {
            return Err(BeamError::InvalidParameter("n_slices must be positive".into()));
        }
        let (z_min, z_max) = self.z_cuts;
        if !(z_min < z_max) || !z_min.is_finite() || !z_max.is_finite() {
            return Err(BeamError::InvalidParameter(format!(
                "z_cuts must satisfy z_min < z_max, got ({z_min}, {z_max})"
            )));
        }
        if !(self.circumference > 0.0) {
            return Err(BeamError::InvalidParameter(format!(
                "circumference must be positive, got {}",
                self.circumference
            )));
        }
        if self.h_bunch == 0 {
            return Err(BeamError::InvalidParameter("h_bunch must be positive".into()));
        }
        Ok(())
    }

    /// Slice width (m).
    pub fn dz(&self) -> f64 {
        (self.z_cuts.1 - self.z_cuts.0) / self.n_slices as f64
    }

    /// Length of one RF bucket (m).
    pub fn bucket_length(&self) -> f64 {
        self.circumference / self.h_bunch as f64
    }

    /// Bin the beam.
    pub fn slice(&self, beam: &Particles) -> Result<SliceSet> {
        self.validate()?;
        beam.validate()?;

        let n = self.n_slices;
        let (z_min, z_max) = self.z_cuts;
        let dz = self.dz();

        let mut counts = vec![0usize; n];
        let mut sum_x = vec![0.0; n];
        let mut sum_y = vec![0.0; n];
        let mut slice_index_of_particle = Vec::with_capacity(beam.macroparticle_number());

        for (p, &z) in beam.z.iter().enumerate() {
            let index = if z >= z_min && z < z_max {
                // Guard against rounding pushing z just below z_max into bin n.
                Some((((z - z_min) / dz).floor() as usize).min(n - 1))
            } else {
                None
            };
            if let Some(s) = index {
                counts[s] += 1;
                sum_x[s] += beam.x[p];
                sum_y[s] += beam.y[p];
            }
            slice_index_of_particle.push(index);
        }

        // Empty slices yield 0/0 = NaN, left for the consumer to handle.
        let mean_x = sum_x
            .iter()
            .zip(&counts)
            .map(|(s, &c)| s / c as f64)
            .collect();
        let mean_y = sum_y
            .iter()
            .zip(&counts)
            .map(|(s, &c)| s / c as f64)
            .collect();

        Ok(SliceSet {
            z_cuts: self.z_cuts,
            dz,
            z_centers: (0..n).map(|i| z_min + (i as f64 + 0.5) * dz).collect(),
            n_macroparticles_per_slice: counts,
            mean_x,
            mean_y,
            slice_index_of_particle,
            particlenumber_per_mp: beam.particlenumber_per_mp,
            charge: beam.charge,
        })
    }
}

/// One turn's slicing of a beam.
#[derive(Debug, Clone)]
pub struct SliceSet {
    /// Slicing range `(z_min, z_max)` (m).
    pub z_cuts: (f64, f64),
    /// Slice width (m).
    pub dz: f64,
    /// Slice centres, ascending.
    pub z_centers: Vec<f64>,
    /// Macroparticles per slice.
    pub n_macroparticles_per_slice: Vec<usize>,
    /// Mean horizontal offset per slice (NaN for empty slices).
    pub mean_x: Vec<f64>,
    /// Mean vertical offset per slice (NaN for empty slices).
    pub mean_y: Vec<f64>,
    /// Slice of each macroparticle, `None` outside the cuts.
    pub slice_index_of_particle: Vec<Option<usize>>,
    /// Real particles per macroparticle.
    pub particlenumber_per_mp: f64,
    /// Charge of one real particle (C).
    pub charge: f64,
}

impl SliceSet {
    /// Number of slices.
    pub fn n_slices(&self) -> usize {
        self.z_centers.len()
    }

    /// Real particles per slice.
    pub fn num_charges_per_slice(&self) -> Vec<f64> {
        self.n_macroparticles_per_slice
            .iter()
            .map(|&n| n as f64 * self.particlenumber_per_mp)
            .collect()
    }

    /// Charge per slice (C).
    pub fn charge_per_slice(&self) -> Vec<f64> {
        self.num_charges_per_slice()
            .into_iter()
            .map(|n| n * self.charge)
            .collect()
    }

    /// Macroparticles that fell inside the cuts.
    pub fn particles_within_cuts(&self) -> usize {
        self.n_macroparticles_per_slice.iter().sum()
    }
}
