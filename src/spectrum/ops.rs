use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use super::distribution::SpectralDistribution;
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Scalar arithmetic
// ---------------------------------------------------------------------------

macro_rules! scalar_op {
    ($op:ident, $method:ident, $assign:ident, $assign_method:ident, $sym:tt) => {
        impl $assign<f64> for SpectralDistribution {
            fn $assign_method(&mut self, rhs: f64) {
                for value in self.values_mut() {
                    *value = *value $sym rhs;
                }
            }
        }

        impl $op<f64> for SpectralDistribution {
            type Output = SpectralDistribution;

            fn $method(mut self, rhs: f64) -> SpectralDistribution {
                self.$assign_method(rhs);
                self
            }
        }
    };
}

scalar_op!(Add, add, AddAssign, add_assign, +);
scalar_op!(Sub, sub, SubAssign, sub_assign, -);
scalar_op!(Mul, mul, MulAssign, mul_assign, *);
scalar_op!(Div, div, DivAssign, div_assign, /);

// ---------------------------------------------------------------------------
// Pointwise arithmetic between distributions
// ---------------------------------------------------------------------------

impl SpectralDistribution {
    /// Combine with `other` sample by sample. Both must hold exactly the
    /// same wavelengths; align them first when they do not.
    pub fn try_combine(
        &mut self,
        other: &SpectralDistribution,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<&mut Self> {
        if self.wavelengths() != other.wavelengths() {
            return Err(SpectralError::DomainMismatch {
                left: self.name().to_string(),
                right: other.name().to_string(),
            });
        }
        for (value, (_, rhs)) in self.values_mut().zip(other.iter()) {
            *value = op(*value, rhs);
        }
        Ok(self)
    }

    pub fn try_add(&mut self, other: &SpectralDistribution) -> Result<&mut Self> {
        self.try_combine(other, |a, b| a + b)
    }

    pub fn try_sub(&mut self, other: &SpectralDistribution) -> Result<&mut Self> {
        self.try_combine(other, |a, b| a - b)
    }

    pub fn try_mul(&mut self, other: &SpectralDistribution) -> Result<&mut Self> {
        self.try_combine(other, |a, b| a * b)
    }

    pub fn try_div(&mut self, other: &SpectralDistribution) -> Result<&mut Self> {
        self.try_combine(other, |a, b| a / b)
    }
}
