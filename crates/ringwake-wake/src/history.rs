//! Multi-turn source-moment memory.
//!
//! Turn `n`'s kicks depend on turns `n-1 … n-n_turns+1`, so the history is
//! strictly ordered: turns must be pushed consecutively and the oldest is
//! dropped once it ages out.

use std::collections::VecDeque;

use ringwake_beam::UniformBinSlicer;
use ringwake_math::commensurate;

use crate::series::{HeadTail, Series, TimeSorted};
use crate::{Result, WakeError};

/// Placement of successive turns on one dense time-sorted grid.
///
/// Turn age `a` (0 = current) occupies
/// `[(n_turns-1-a)·stride, (n_turns-1-a)·stride + n_slices)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLayout {
    /// Turns retained, including the current one.
    pub n_turns: usize,
    /// Slices per turn.
    pub n_slices: usize,
    /// Grid points per revolution (circumference / dz). Unused for one turn.
    pub stride: usize,
}

impl HistoryLayout {
    pub fn new(n_turns: usize, n_slices: usize, stride: usize) -> Result<Self> {
        if n_turns == 0 {
            return Err(WakeError::InvalidParameter("n_turns_wake must be at least 1".into()));
        }
        if n_slices == 0 {
            return Err(WakeError::InvalidParameter("history needs at least one slice".into()));
        }
        if n_turns > 1 && stride < n_slices {
            return Err(WakeError::InvalidParameter(format!(
                "slicing range ({n_slices} slices) is longer than one turn ({stride} slices)"
            )));
        }
        Ok(Self {
            n_turns,
            n_slices,
            stride,
        })
    }

    /// Layout for a slicer. The circumference must be a whole number of
    /// slices when more than one turn is kept.
    pub fn for_slicer(slicer: &UniformBinSlicer, n_turns: usize) -> Result<Self> {
        let dz = slicer.dz();
        let stride = if n_turns > 1 {
            commensurate(slicer.circumference, dz).ok_or(WakeError::NotCommensurate {
                what: "circumference",
                length: slicer.circumference,
                dz,
            })?
        } else {
            slicer.n_slices
        };
        Self::new(n_turns, slicer.n_slices, stride)
    }

    /// Total grid length spanned by the retained turns. Also the kernel
    /// length needed to reach the oldest turn.
    pub fn span(&self) -> usize {
        (self.n_turns - 1) * self.stride + self.n_slices
    }

    /// Start index of the turn of age `age`.
    pub fn turn_offset(&self, age: usize) -> usize {
        (self.n_turns - 1 - age) * self.stride
    }

    /// Index range of the current turn.
    pub fn current(&self) -> std::ops::Range<usize> {
        let start = self.turn_offset(0);
        start..start + self.n_slices
    }
}

/// Rolling buffer of the last `n_turns` turns' source moments.
#[derive(Debug, Clone)]
pub struct WakeHistory {
    layout: HistoryLayout,
    /// Front is the oldest turn.
    turns: VecDeque<Series<TimeSorted>>,
    latest: Option<u64>,
}

impl WakeHistory {
    pub fn new(layout: HistoryLayout) -> Self {
        Self {
            layout,
            turns: VecDeque::with_capacity(layout.n_turns),
            latest: None,
        }
    }

    pub fn layout(&self) -> &HistoryLayout {
        &self.layout
    }

    /// Turns currently held.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recently pushed turn.
    pub fn latest_turn(&self) -> Option<u64> {
        self.latest
    }

    /// Record a turn's moments. The first push may carry any turn number;
    /// after that each turn must follow the previous one.
    pub fn push(&mut self, turn: u64, moments: Series<HeadTail>) -> Result<()> {
        if let Some(latest) = self.latest {
            if turn != latest + 1 {
                return Err(WakeError::TurnOrder {
                    expected: latest + 1,
                    got: turn,
                });
            }
        }
        if moments.len() != self.layout.n_slices {
            return Err(WakeError::SliceCount {
                expected: self.layout.n_slices,
                got: moments.len(),
            });
        }

        self.turns.push_back(moments.reversed());
        while self.turns.len() > self.layout.n_turns {
            self.turns.pop_front();
        }
        self.latest = Some(turn);
        Ok(())
    }

    /// Dense time-sorted array over the whole layout span. Turns not yet
    /// recorded (warm-up) are zero.
    pub fn assemble(&self) -> Result<Series<TimeSorted>> {
        if self.turns.len() > self.layout.n_turns {
            return Err(WakeError::HistoryDepth {
                len: self.turns.len(),
                max: self.layout.n_turns,
            });
        }
        let mut dense = vec![0.0; self.layout.span()];
        for (age, turn) in self.turns.iter().rev().enumerate() {
            let start = self.layout.turn_offset(age);
            dense[start..start + turn.len()].copy_from_slice(turn.as_slice());
        }
        Ok(Series::new(dense))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moments(values: &[f64]) -> Series<HeadTail> {
        Series::new(values.to_vec())
    }

    #[test]
    fn test_layout_span() {
        let layout = HistoryLayout::new(3, 4, 10).unwrap();
        assert_eq!(layout.span(), 24);
        assert_eq!(layout.turn_offset(2), 0);
        assert_eq!(layout.current(), 20..24);
        assert!(HistoryLayout::new(2, 11, 10).is_err());
    }

    #[test]
    fn test_layout_for_slicer_requires_commensurate_ring() {
        let slicer = UniformBinSlicer::new(10, (-0.5, 0.5), 10.05, 10).unwrap();
        assert!(HistoryLayout::for_slicer(&slicer, 1).is_ok());
        assert!(matches!(
            HistoryLayout::for_slicer(&slicer, 2),
            Err(WakeError::NotCommensurate { .. })
        ));
        let ring = UniformBinSlicer::new(10, (-0.5, 0.5), 10.0, 10).unwrap();
        assert_eq!(HistoryLayout::for_slicer(&ring, 2).unwrap().stride, 100);
    }

    #[test]
    fn test_push_assemble_and_evict() {
        let mut history = WakeHistory::new(HistoryLayout::new(2, 2, 3).unwrap());
        history.push(7, moments(&[1.0, 2.0])).unwrap();
        // Warm-up: older turn slot is still zero.
        assert_eq!(history.assemble().unwrap().as_slice(), &[0.0, 0.0, 0.0, 2.0, 1.0]);

        history.push(8, moments(&[3.0, 4.0])).unwrap();
        history.push(9, moments(&[5.0, 6.0])).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest_turn(), Some(9));
        assert_eq!(history.assemble().unwrap().as_slice(), &[4.0, 3.0, 0.0, 6.0, 5.0]);
    }

    #[test]
    fn test_out_of_order_is_fatal() {
        let mut history = WakeHistory::new(HistoryLayout::new(2, 1, 1).unwrap());
        history.push(0, moments(&[1.0])).unwrap();
        assert!(matches!(
            history.push(2, moments(&[1.0])),
            Err(WakeError::TurnOrder { expected: 1, got: 2 })
        ));
        assert!(matches!(
            history.push(0, moments(&[1.0])),
            Err(WakeError::TurnOrder { .. })
        ));
    }

    #[test]
    fn test_slice_count_checked() {
        let mut history = WakeHistory::new(HistoryLayout::new(1, 2, 2).unwrap());
        assert!(matches!(
            history.push(0, moments(&[1.0])),
            Err(WakeError::SliceCount { expected: 2, got: 1 })
        ));
    }
}
