//! Ordered per-slice series.
//!
//! Every array the engine handles is indexed against the longitudinal grid
//! in one of two orders:
//!
//! - [`HeadTail`]: z ascending, tail first. This is how slice sets are laid
//!   out and how kicks are returned.
//! - [`TimeSorted`]: z descending, head first, so the index grows with
//!   arrival time. Wake kernels and the multi-turn history live in this
//!   order, where causality means "only look backwards in the index".
//!
//! The order is a type parameter, so passing a head-tail array where a
//! time-sorted one is expected does not compile. [`Series::reversed`] is the
//! only way to switch.

use std::marker::PhantomData;
use std::ops::Index;

mod sealed {
    pub trait Sealed {}
}

/// Index order of a [`Series`].
pub trait Order: sealed::Sealed + Copy + std::fmt::Debug {
    /// The order obtained by reversing the array.
    type Reversed: Order<Reversed = Self>;
    /// Human-readable name.
    const NAME: &'static str;
}

/// z descending: index 0 is the head, the earliest arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSorted;

/// z ascending: index 0 is the tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadTail;

impl sealed::Sealed for TimeSorted {}
impl sealed::Sealed for HeadTail {}

impl Order for TimeSorted {
    type Reversed = HeadTail;
    const NAME: &'static str = "time-sorted";
}

impl Order for HeadTail {
    type Reversed = TimeSorted;
    const NAME: &'static str = "head-tail";
}

/// Real samples on the slice grid, tagged with their index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<O: Order> {
    values: Vec<f64>,
    order: PhantomData<O>,
}

impl<O: Order> Series<O> {
    /// Wrap values already laid out in order `O`.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            order: PhantomData,
        }
    }

    /// All-zero series of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self::new(vec![0.0; n])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Reverse the array, switching its order tag.
    pub fn reversed(mut self) -> Series<O::Reversed> {
        self.values.reverse();
        Series::new(self.values)
    }

    /// Largest absolute value (0 for an empty series).
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }
}

impl<O: Order> Index<usize> for Series<O> {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.values[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_round_trip_switches_order() {
        let ht: Series<HeadTail> = Series::new(vec![1.0, 2.0, 3.0]);
        let ts: Series<TimeSorted> = ht.clone().reversed();
        assert_eq!(ts.as_slice(), &[3.0, 2.0, 1.0]);
        assert_eq!(ts.reversed(), ht);
    }

    #[test]
    fn test_max_abs() {
        let s: Series<TimeSorted> = Series::new(vec![0.5, -2.0, 1.0]);
        assert_eq!(s.max_abs(), 2.0);
        assert_eq!(Series::<HeadTail>::zeros(0).max_abs(), 0.0);
    }

    #[test]
    fn test_order_names() {
        assert_eq!(TimeSorted::NAME, "time-sorted");
        assert_eq!(<HeadTail as Order>::Reversed::NAME, "time-sorted");
    }
}
