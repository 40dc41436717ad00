//! # Unit Types
//!
//! Type-safe wrappers for the quantities that cross the carbon_core
//! boundary. They are plain `f64` newtypes so JSON stays clean (just
//! numbers) while the compiler keeps kilograms and tonnes apart.
//!
//! ## Declared Units
//!
//! - Life-cycle (LCA) stage values: kilograms CO2-equivalent ([`KgCo2e`])
//! - Scope 1/2/3 totals: metric tonnes CO2-equivalent ([`TonnesCo2e`])
//! - Floor area: square metres of gross floor area ([`SquareMeters`])
//! - Carbon intensity: kg CO2-e per m² (plain `f64`)
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::units::{KgCo2e, TonnesCo2e};
//!
//! let embodied = KgCo2e(31_000.0);
//! let tonnes: TonnesCo2e = embodied.into();
//! assert_eq!(tonnes.0, 31.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Kilograms per metric tonne
pub const KG_PER_TONNE: f64 = 1000.0;

// ============================================================================
// Mass of CO2-equivalent
// ============================================================================

/// Mass in kilograms of CO2-equivalent
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgCo2e(pub f64);

/// Mass in metric tonnes of CO2-equivalent
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TonnesCo2e(pub f64);

impl From<KgCo2e> for TonnesCo2e {
    fn from(kg: KgCo2e) -> Self {
        TonnesCo2e(kg.0 / KG_PER_TONNE)
    }
}

impl From<TonnesCo2e> for KgCo2e {
    fn from(t: TonnesCo2e) -> Self {
        KgCo2e(t.0 * KG_PER_TONNE)
    }
}

impl fmt::Display for KgCo2e {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} kg CO2-e", self.0)
    }
}

impl fmt::Display for TonnesCo2e {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} t CO2-e", self.0)
    }
}

// ============================================================================
// Area
// ============================================================================

/// Area in square metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

impl fmt::Display for SquareMeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m²", self.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self(0.0), |acc, x| acc + x)
            }
        }

        impl<'a> Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                iter.fold(Self(0.0), |acc, x| acc + *x)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(KgCo2e);
impl_arithmetic!(TonnesCo2e);
impl_arithmetic!(SquareMeters);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kg_to_tonnes() {
        let kg = KgCo2e(2_500.0);
        let t: TonnesCo2e = kg.into();
        assert_eq!(t.0, 2.5);

        let back: KgCo2e = t.into();
        assert_eq!(back.0, 2_500.0);
    }

    #[test]
    fn test_arithmetic_keeps_sign() {
        let a = KgCo2e(100.0);
        let b = KgCo2e(-250.0);
        assert_eq!((a + b).0, -150.0);
        assert_eq!((-b).0, 250.0);
        assert_eq!((a * 2.0).0, 200.0);
        assert_eq!((a / 4.0).0, 25.0);
    }

    #[test]
    fn test_sum() {
        let values = [TonnesCo2e(1.0), TonnesCo2e(2.5), TonnesCo2e(-0.5)];
        let total: TonnesCo2e = values.iter().sum();
        assert_eq!(total.0, 3.0);
    }

    #[test]
    fn test_serialization() {
        let area = SquareMeters(1250.5);
        let json = serde_json::to_string(&area).unwrap();
        assert_eq!(json, "1250.5");

        let roundtrip: SquareMeters = serde_json::from_str(&json).unwrap();
        assert_eq!(area, roundtrip);
    }
}
