//! This module defines various unit types and their conversions.
//!
//! The model works in hourly steps, so a power level held for one step corresponds to the same
//! number of MWh.
use serde::{Deserialize, Serialize};

macro_rules! unit_struct {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new instance of the unit type from an `f64` value
            pub const fn new(val: f64) -> Self {
                Self(val)
            }

            /// The value of the quantity as an `f64`
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is neither infinite nor NaN
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

/// Represents a dimensionless quantity (efficiencies, tolerances, binary decisions).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Default,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
)]
#[serde(transparent)]
pub struct Dimensionless(pub f64);

impl Dimensionless {
    /// Create a new [`Dimensionless`] from an `f64` value
    pub const fn new(val: f64) -> Self {
        Self(val)
    }

    /// The value as an `f64`
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Whether the underlying value is neither infinite nor NaN
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl From<bool> for Dimensionless {
    fn from(val: bool) -> Self {
        Self(if val { 1.0 } else { 0.0 })
    }
}

// Base quantities
unit_struct!(Power, "Electrical power in MW.");
unit_struct!(Energy, "Energy in MWh (electrical output or fuel input).");
unit_struct!(Mass, "Mass of CO2 in tonnes.");
unit_struct!(Money, "An amount of money.");

// Derived quantities
unit_struct!(MoneyPerEnergy, "A price per MWh.");
unit_struct!(MoneyPerMass, "A price per tonne.");
unit_struct!(MassPerEnergy, "Emissions in tonnes per MWh of fuel burnt.");

impl_mul!(MoneyPerEnergy, Energy, Money);
impl_mul!(MoneyPerMass, Mass, Money);
impl_mul!(MassPerEnergy, Energy, Mass);

impl Power {
    /// The energy delivered by holding this power level for one hourly step
    pub const fn over_one_hour(self) -> Energy {
        Energy(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_price_times_quantity() {
        let cost = MoneyPerEnergy(20.0) * Energy(3.0);
        assert_eq!(cost, Money(60.0));

        let cost = Mass(2.0) * MoneyPerMass(30.0);
        assert_eq!(cost, Money(60.0));
    }

    #[test]
    fn test_emissions_from_fuel() {
        let co2 = MassPerEnergy(0.2) * Energy(500.0);
        assert_approx_eq!(f64, co2.value(), 100.0);
    }

    #[test]
    fn test_fuel_from_efficiency() {
        let fuel = Power(220.0).over_one_hour() / Dimensionless(0.45);
        assert_approx_eq!(f64, fuel.value(), 220.0 / 0.45);
    }

    #[test]
    fn test_sum_of_money() {
        let total: Money = [Money(1.0), Money(-3.0), Money(4.5)].into_iter().sum();
        assert_eq!(total, Money(2.5));
    }
}
