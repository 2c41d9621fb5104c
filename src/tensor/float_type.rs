/// Generic floating-point type trait for tensorgrad
///
/// This trait defines the required operations for floating-point types
/// used in tensor computations. Currently implemented for f16 and f32.
use half::f16;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Trait for floating-point types supported in tensor operations
pub trait FloatType:
    Copy
    + Clone
    + Debug
    + Send
    + Sync
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// The zero value for this type
    fn zero() -> Self;

    /// The one value for this type
    fn one() -> Self;

    /// Convert from f32 to this type
    fn from_f32(value: f32) -> Self;

    /// Convert from this type to f32
    fn to_f32(self) -> f32;

    /// Convert from f64 to this type
    fn from_f64(value: f64) -> Self {
        Self::from_f32(value as f32)
    }

    /// Convert from this type to f64
    fn to_f64(self) -> f64 {
        self.to_f32() as f64
    }

    /// Absolute value
    fn abs(self) -> Self {
        Self::from_f32(self.to_f32().abs())
    }

    /// Sign of the value (-1, 0, or 1)
    fn signum(self) -> Self {
        let v = self.to_f32();
        if v > 0.0 {
            Self::one()
        } else if v < 0.0 {
            -Self::one()
        } else {
            Self::zero()
        }
    }

    /// Square root
    fn sqrt(self) -> Self {
        Self::from_f32(self.to_f32().sqrt())
    }

    /// Size in bytes
    fn size_in_bytes() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Check if this is f16
    fn is_f16() -> bool {
        Self::size_in_bytes() == 2
    }

    /// Check if this is f32
    fn is_f32() -> bool {
        Self::size_in_bytes() == 4
    }
}

/// Implementation for f16 (half precision)
impl FloatType for f16 {
    #[inline]
    fn zero() -> Self {
        f16::from_f32(0.0)
    }

    #[inline]
    fn one() -> Self {
        f16::from_f32(1.0)
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        f16::from_f32(value)
    }

    #[inline]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }
}

/// Implementation for f32 (single precision)
impl FloatType for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn abs(self) -> Self {
        f32::abs(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f16_float_type() {
        assert_eq!(<f16 as FloatType>::zero().to_f32(), 0.0);
        assert_eq!(<f16 as FloatType>::one().to_f32(), 1.0);
        assert!(f16::is_f16());
        assert!(!f16::is_f32());
    }

    #[test]
    fn test_f32_float_type() {
        assert_eq!(<f32 as FloatType>::zero(), 0.0);
        assert_eq!(<f32 as FloatType>::one(), 1.0);
        assert!(!f32::is_f16());
        assert!(f32::is_f32());
    }

    #[test]
    fn test_signum() {
        assert_eq!(FloatType::signum(3.0f32), 1.0);
        assert_eq!(FloatType::signum(-2.5f32), -1.0);
        assert_eq!(FloatType::signum(0.0f32), 0.0);
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(FloatType::sqrt(25.0f32), 5.0);
        let h = <f16 as FloatType>::from_f32(16.0);
        assert_eq!(FloatType::sqrt(h).to_f32(), 4.0);
    }
}
