//! Bunch windows for the chopped and compressed convolutions.
//!
//! Charge only sits inside bunches, and bunches repeat every `P` grid points
//! (bunch spacing within a turn, and the revolution across turns). Each bunch
//! covers a slot of `L` grid points. A kick on one bunch slot can only come
//! from wake offsets within `L - 1` of a multiple of `P`, so every other
//! kernel sample may be zeroed (chopping) or dropped entirely (compression)
//! without changing the kicks on bunch slots.
//!
//! Layout on the time-sorted history grid:
//!
//! ```text
//!   bunch slots:     [o0 + j·P, o0 + j·P + L)
//!   kernel windows:  [j·P - L + 1, j·P + L) ∩ [0, n_wake)
//! ```
//!
//! Compression concatenates the kernel windows and, in the frame shifted by
//! `o0`, the same windows of the source moments. Window `j` then starts
//! `j·Δ` earlier than in the dense array, with `Δ = P - (2L - 1)`. The shift
//! is additive, so a source at compressed index `s` and a kernel sample at
//! compressed index `m` still land on compressed index `s + m`, as long as
//! windows do not overlap (`2L - 1 <= P`).

use std::ops::Range;

use ringwake_beam::{FillingScheme, UniformBinSlicer};
use ringwake_math::{commensurate, gcd, COMMENSURATE_TOL};

use crate::history::HistoryLayout;
use crate::{Result, WakeError};

/// Periodic bunch slots on the history grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BunchWindows {
    /// Slot width `L` (grid points).
    pub width: usize,
    /// Repetition period `P` (grid points); `None` when there is only one
    /// bunch slot in the whole history.
    pub period: Option<usize>,
    /// Start `o0` of the first slot. Negative when the slicer cuts into the
    /// first occupied bucket.
    pub origin: isize,
}

impl BunchWindows {
    pub fn new(width: usize, period: Option<usize>, origin: isize) -> Result<Self> {
        if width == 0 {
            return Err(WakeError::InvalidParameter("bunch window width must be positive".into()));
        }
        if period == Some(0) {
            return Err(WakeError::InvalidParameter("bunch window period must be positive".into()));
        }
        Ok(Self {
            width,
            period,
            origin,
        })
    }

    /// Derive the windows from the slicer geometry, the filling scheme and
    /// the number of retained turns.
    ///
    /// The bucket length must be a whole number `S` of slices. The slot width
    /// is `S` when the slicer's head edge falls on a bucket boundary and
    /// `S + 1` otherwise.
    pub fn from_layout(
        slicer: &UniformBinSlicer,
        filling: &FillingScheme,
        layout: &HistoryLayout,
    ) -> Result<Self> {
        filling.validate()?;
        let dz = slicer.dz();
        let bucket_length = slicer.bucket_length();
        let per_bucket = commensurate(bucket_length, dz).ok_or(WakeError::NotCommensurate {
            what: "bucket length",
            length: bucket_length,
            dz,
        })?;
        if per_bucket == 0 {
            return Err(WakeError::InvalidParameter(
                "bucket is shorter than one slice".into(),
            ));
        }

        // Time-sorted index of bucket 0's head edge.
        let head_offset = (slicer.z_cuts.1 - 0.5 * bucket_length) / dz;
        let rounded = head_offset.round();
        let (head_index, width) =
            if (head_offset - rounded).abs() <= COMMENSURATE_TOL * rounded.abs().max(1.0) {
                (rounded as isize, per_bucket)
            } else {
                (head_offset.floor() as isize, per_bucket + 1)
            };

        let origin = head_index + (filling.first() * per_bucket) as isize;

        let mut g = filling.spacing().unwrap_or(0);
        if layout.n_turns > 1 {
            g = gcd(g, slicer.h_bunch);
        }
        let period = (g > 0).then_some(g * per_bucket);

        Self::new(width, period, origin)
    }

    /// Whether windows are disjoint, the precondition for compression.
    pub fn is_sparse(&self) -> bool {
        self.period.map_or(true, |p| 2 * self.width - 1 <= p)
    }

    /// `Δ = P - (2L - 1)`, how much closer consecutive windows sit after
    /// compression.
    fn shrink(&self) -> usize {
        self.period.map_or(0, |p| p - (2 * self.width - 1))
    }

    /// Starts `j·P` of all slots that begin before `len`.
    fn slot_starts(&self, len: usize) -> Vec<usize> {
        match self.period {
            Some(p) => (0..len).step_by(p).collect(),
            None if len > 0 => vec![0],
            None => Vec::new(),
        }
    }

    /// Kernel (or shifted-moment) windows `[j·P - L + 1, j·P + L)` clipped
    /// to `[0, len)`.
    pub fn padded_windows(&self, len: usize) -> Vec<Range<usize>> {
        let pad = self.width - 1;
        let mut windows = Vec::new();
        let mut j_start = 0;
        // A window whose padding starts before `len` still matters even if
        // its slot start does not.
        let mut starts = self.slot_starts(len + pad);
        starts.retain(|&s| s.saturating_sub(pad) < len);
        for start in starts {
            let lo = start.saturating_sub(pad).max(j_start);
            let hi = (start + self.width).min(len);
            if lo < hi {
                windows.push(lo..hi);
            }
            j_start = hi;
        }
        windows
    }

    /// Whether global history index `index` lies in a bunch slot.
    pub fn in_slot(&self, index: usize) -> bool {
        let local = index as isize - self.origin;
        if local < 0 {
            return false;
        }
        let local = local as usize;
        let offset = match self.period {
            Some(p) => local % p,
            None => local,
        };
        offset < self.width
    }

    /// Zero every moment outside the bunch slots. Values there above
    /// `tolerance` times the peak are charge the windows cannot account for.
    pub fn mask_gaps(&self, moments: &mut [f64], tolerance: f64) -> Result<()> {
        let peak = moments.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        for (index, value) in moments.iter_mut().enumerate() {
            if self.in_slot(index) || *value == 0.0 {
                continue;
            }
            let relative = value.abs() / peak;
            if relative > tolerance {
                return Err(WakeError::ChargeInGap { index, relative });
            }
            *value = 0.0;
        }
        Ok(())
    }

    /// Zero kicks outside the bunch slots.
    pub fn mask_kicks(&self, kicks: &mut [f64]) {
        for (index, value) in kicks.iter_mut().enumerate() {
            if !self.in_slot(index) {
                *value = 0.0;
            }
        }
    }

    /// Kernel with every sample outside the windows set to zero.
    pub fn chop(&self, kernel: &[f64]) -> Vec<f64> {
        let mut chopped = vec![0.0; kernel.len()];
        for window in self.padded_windows(kernel.len()) {
            chopped[window.clone()].copy_from_slice(&kernel[window]);
        }
        chopped
    }

    /// Concatenate the windows of `values` (kernel frame, or the moments
    /// after [`BunchWindows::to_local`]).
    pub fn gather(&self, values: &[f64]) -> Vec<f64> {
        self.padded_windows(values.len())
            .into_iter()
            .flat_map(|window| values[window].iter().copied())
            .collect()
    }

    /// Shift history-grid values so that the first slot starts at 0.
    pub fn to_local(&self, values: &[f64]) -> Vec<f64> {
        let len = (values.len() as isize - self.origin).max(0) as usize;
        (0..len)
            .map(|i| {
                let global = i as isize + self.origin;
                if global >= 0 {
                    values.get(global as usize).copied().unwrap_or(0.0)
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Place a compressed result back on the history grid. Only bunch slots
    /// are filled; everything else is zero.
    pub fn scatter(&self, compressed: &[f64], len: usize) -> Vec<f64> {
        let mut out = vec![0.0; len];
        let local_len = (len as isize - self.origin).max(0) as usize;
        let shrink = self.shrink();
        for (j, start) in self.slot_starts(local_len).into_iter().enumerate() {
            for local in start..(start + self.width).min(local_len) {
                let global = local as isize + self.origin;
                if global < 0 {
                    continue;
                }
                if let Some(&value) = compressed.get(local - j * shrink) {
                    out[global as usize] = value;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_windows() {
        let w = BunchWindows::new(3, Some(10), 0).unwrap();
        assert_eq!(w.padded_windows(25), vec![0..3, 8..13, 18..23]);
        assert_eq!(w.padded_windows(19), vec![0..3, 8..13, 18..19]);
        // Padding of the slot at 20 reaches back into the array.
        assert_eq!(w.padded_windows(20), vec![0..3, 8..13, 18..20]);
        let single = BunchWindows::new(4, None, 0).unwrap();
        assert_eq!(single.padded_windows(100), vec![0..4]);
    }

    #[test]
    fn test_overlapping_windows_do_not_duplicate() {
        let w = BunchWindows::new(3, Some(4), 0).unwrap();
        assert!(!w.is_sparse());
        assert_eq!(w.padded_windows(10), vec![0..3, 3..7, 7..10]);
    }

    #[test]
    fn test_slots_and_gap_masking() {
        let w = BunchWindows::new(2, Some(5), 1).unwrap();
        let slots: Vec<bool> = (0..8).map(|i| w.in_slot(i)).collect();
        assert_eq!(slots, vec![false, true, true, false, false, false, true, true]);

        let mut d = vec![1e-14, 1.0, 2.0, 0.0, 0.0, 0.0, 3.0, 1.0];
        w.mask_gaps(&mut d, 1e-10).unwrap();
        assert_eq!(d[0], 0.0);

        let mut noisy = vec![0.0, 1.0, 1.0, 0.1, 0.0, 0.0, 1.0, 1.0];
        assert!(matches!(
            w.mask_gaps(&mut noisy, 1e-10),
            Err(WakeError::ChargeInGap { index: 3, .. })
        ));
    }

    #[test]
    fn test_gather_scatter_places_slots() {
        let w = BunchWindows::new(2, Some(5), 0).unwrap();
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let gathered = w.gather(&values);
        // Windows: [0,2), [4,7), [9,12)
        assert_eq!(gathered, vec![0.0, 1.0, 4.0, 5.0, 6.0, 9.0, 10.0, 11.0]);
        let scattered = w.scatter(&gathered, 12);
        assert_eq!(
            scattered,
            vec![0.0, 1.0, 0.0, 0.0, 0.0, 5.0, 6.0, 0.0, 0.0, 0.0, 10.0, 11.0]
        );
    }

    #[test]
    fn test_to_local_shifts_both_ways() {
        let forward = BunchWindows::new(1, None, 2).unwrap();
        assert_eq!(forward.to_local(&[1.0, 2.0, 3.0, 4.0]), vec![3.0, 4.0]);
        let backward = BunchWindows::new(1, None, -1).unwrap();
        assert_eq!(backward.to_local(&[1.0, 2.0]), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_from_full_beam_layout() {
        let filling = FillingScheme::uniform(3, 5).unwrap();
        let slicer = UniformBinSlicer::full_beam(100, &filling, 20.0, 20).unwrap();
        let layout = HistoryLayout::for_slicer(&slicer, 1).unwrap();
        let w = BunchWindows::from_layout(&slicer, &filling, &layout).unwrap();
        assert_eq!(w, BunchWindows::new(100, Some(500), 0).unwrap());

        // Across turns the revolution (20 buckets) is also a period.
        let layout = HistoryLayout::for_slicer(&slicer, 3).unwrap();
        let w = BunchWindows::from_layout(&slicer, &filling, &layout).unwrap();
        assert_eq!(w.period, Some(500));
        assert!(w.is_sparse());
    }

    #[test]
    fn test_from_offset_slicers() {
        let filling = FillingScheme::single();
        let layout = HistoryLayout::new(1, 18, 18).unwrap();

        // Head edge one slice inside bucket 0: aligned, slot starts at -1.
        let inside = UniformBinSlicer::new(18, (-0.45, 0.45), 10.0, 10).unwrap();
        let w = BunchWindows::from_layout(&inside, &filling, &layout).unwrap();
        assert_eq!((w.width, w.period, w.origin), (20, None, -1));

        // Head edge half a slice off the boundary: one extra slice per slot.
        let unaligned = UniformBinSlicer::new(17, (-0.425, 0.425), 10.0, 10).unwrap();
        let w = BunchWindows::from_layout(&unaligned, &filling, &layout).unwrap();
        assert_eq!((w.width, w.origin), (21, -2));

        // Bucket not a whole number of slices.
        let coarse = UniformBinSlicer::new(20, (-0.35, 0.35), 10.0, 10).unwrap();
        assert!(matches!(
            BunchWindows::from_layout(&coarse, &filling, &layout),
            Err(WakeError::NotCommensurate { .. })
        ));
    }
}
