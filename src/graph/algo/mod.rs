pub mod matching;

use core::ops::{Add, Div, Mul, Sub};
use std::fmt::Debug;

pub trait Measure: PartialOrd + Default + Add<Output = Self> + Copy {}

impl<T> Measure for T where T: PartialOrd + Default + Add<Output = Self> + Copy {}

// used to measure the max and min value
pub trait WeightMeasure: Measure {
    fn min() -> Self;

    fn infinite() -> Self;
}

/// Weights the primal-dual matching engines could work with. Every weight is multiplied
/// by `dual_scale()` up front, so that the halvings of the algorithm stay exact for
/// integers.
pub trait DualMeasure:
    WeightMeasure + Sub<Output = Self> + Mul<Output = Self> + Div<Output = Self> + Debug
{
    /// 4 for integers, 1 for floats
    fn dual_scale() -> Self;

    fn from_usize(n: usize) -> Self;

    fn two() -> Self {
        Self::from_usize(2)
    }
}

macro_rules! impl_weight_measure {
    ($($t: ty),*) => {
        $(
            impl WeightMeasure for $t {
                fn min() -> Self {
                    <$t>::MIN
                }

                fn infinite() -> Self {
                    <$t>::MAX
                }
            }
        )*
    };
}

impl_weight_measure!(usize, isize, i32, i64, f32, f64);

macro_rules! impl_dual_measure {
    ($scale: expr; $($t: ty),*) => {
        $(
            impl DualMeasure for $t {
                fn dual_scale() -> Self {
                    $scale as $t
                }

                fn from_usize(n: usize) -> Self {
                    n as $t
                }
            }
        )*
    };
}

impl_dual_measure!(4; isize, i32, i64);
impl_dual_measure!(1; f32, f64);
