//! Filling schemes: which RF buckets carry a bunch.

use ringwake_math::gcd;
use serde::{Deserialize, Serialize};

use crate::{BeamError, Result};

/// Set of occupied bucket indices.
///
/// Bucket 0 is the head of the beam; larger indices trail behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillingScheme {
    /// Occupied buckets, sorted and unique after [`FillingScheme::new`].
    pub buckets: Vec<usize>,
    /// Explicit bunch spacing in buckets. When absent it is derived as the
    /// gcd of all bucket differences.
    #[serde(default)]
    pub spacing_buckets: Option<usize>,
}

impl FillingScheme {
    /// Build a scheme from occupied bucket indices (any order, duplicates
    /// allowed).
    pub fn new(mut buckets: Vec<usize>) -> Result<Self> {
        buckets.sort_unstable();
        buckets.dedup();
        let scheme = Self {
            buckets,
            spacing_buckets: None,
        };
        scheme.validate()?;
        Ok(scheme)
    }

    /// `n_bunches` bunches every `spacing` buckets, starting at bucket 0.
    pub fn uniform(n_bunches: usize, spacing: usize) -> Result<Self> {
        if spacing == 0 && n_bunches > 1 {
            return Err(BeamError::InvalidParameter(
                "bunch spacing must be at least one bucket".into(),
            ));
        }
        Self::new((0..n_bunches).map(|i| i * spacing).collect())
    }

    /// Single bunch in bucket 0.
    pub fn single() -> Self {
        Self {
            buckets: vec![0],
            spacing_buckets: None,
        }
    }

    /// Override the derived spacing.
    pub fn with_spacing(mut self, spacing_buckets: usize) -> Result<Self> {
        self.spacing_buckets = Some(spacing_buckets);
        self.validate()?;
        Ok(self)
    }

    /// Check the scheme is non-empty, sorted, and that every bucket sits on
    /// the explicit spacing grid if one was given.
    pub fn validate(&self) -> Result<()> {
        let first = *self.buckets.first().ok_or(BeamError::EmptyFilling)?;
        if self.buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(BeamError::InvalidParameter(
                "filling scheme buckets must be strictly increasing".into(),
            ));
        }
        if let Some(spacing) = self.spacing_buckets {
            if spacing == 0 {
                return Err(BeamError::InvalidParameter(
                    "bunch spacing must be at least one bucket".into(),
                ));
            }
            if let Some(b) = self.buckets.iter().find(|&&b| (b - first) % spacing != 0) {
                return Err(BeamError::InvalidParameter(format!(
                    "bucket {b} is off the {spacing}-bucket spacing grid"
                )));
            }
        }
        Ok(())
    }

    /// Number of bunches.
    pub fn n_bunches(&self) -> usize {
        self.buckets.len()
    }

    /// Leading (head) bucket.
    pub fn first(&self) -> usize {
        self.buckets.first().copied().unwrap_or(0)
    }

    /// Trailing (tail) bucket.
    pub fn last(&self) -> usize {
        self.buckets.last().copied().unwrap_or(0)
    }

    /// Bunch spacing in buckets. `None` for a single bunch without an
    /// explicit spacing.
    pub fn spacing(&self) -> Option<usize> {
        if self.spacing_buckets.is_some() {
            return self.spacing_buckets;
        }
        let first = self.first();
        let g = self.buckets.iter().fold(0, |acc, &b| gcd(acc, b - first));
        (g > 0).then_some(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_scheme() {
        let scheme = FillingScheme::uniform(3, 5).unwrap();
        assert_eq!(scheme.buckets, vec![0, 5, 10]);
        assert_eq!(scheme.spacing(), Some(5));
        assert_eq!(scheme.last(), 10);
    }

    #[test]
    fn test_non_uniform_spacing_is_gcd() {
        let scheme = FillingScheme::new(vec![12, 2, 6, 6]).unwrap();
        assert_eq!(scheme.buckets, vec![2, 6, 12]);
        assert_eq!(scheme.spacing(), Some(2));
        assert_eq!(scheme.first(), 2);
    }

    #[test]
    fn test_single_bunch_has_no_spacing() {
        assert_eq!(FillingScheme::single().spacing(), None);
    }

    #[test]
    fn test_explicit_spacing_checked() {
        let scheme = FillingScheme::new(vec![0, 4, 8]).unwrap();
        assert!(scheme.clone().with_spacing(4).is_ok());
        assert!(scheme.with_spacing(3).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            FillingScheme::new(vec![]),
            Err(BeamError::EmptyFilling)
        ));
    }
}
