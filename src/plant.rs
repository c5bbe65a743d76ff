//! Defines the [`PlantParameters`] struct, which holds the physical and commercial constants of the
//! plant being dispatched.
//!
//! Parameters can be read from a TOML file; any field that is left out takes the default value
//! listed here.
use crate::input::{input_err_msg, read_toml};
use crate::units::{Dimensionless, Energy, Mass, MassPerEnergy, Power};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use strum::EnumIter;

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_max_capacity, Power, 400.0);
define_unit_param_default!(default_min_capacity, Power, 220.0);
define_param_default!(default_max_starts, u32, 15);
define_param_default!(default_max_run_hours, u32, 250);
define_param_default!(default_hot_start_max_off_hours, u32, 10);
define_param_default!(default_warm_start_max_off_hours, u32, 35);
define_unit_param_default!(default_min_load_efficiency, Dimensionless, 0.45);
define_unit_param_default!(default_above_min_efficiency, Dimensionless, 0.5);
define_unit_param_default!(default_co2_intensity, MassPerEnergy, 0.2);

/// The category of a start, determined by how long the plant had been off beforehand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum StartTier {
    /// Tier 1: a short break
    Hot,
    /// Tier 2: an intermediate break
    Warm,
    /// Tier 3: a long break
    Cold,
}

impl StartTier {
    /// The numeric code used for this tier in results (0 is reserved for "no start")
    pub const fn code(self) -> u8 {
        match self {
            Self::Hot => 1,
            Self::Warm => 2,
            Self::Cold => 3,
        }
    }
}

impl fmt::Display for StartTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        };
        write!(f, "{name} start (type {})", self.code())
    }
}

/// The one-off quantities incurred by a single start of a given tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartCosts {
    /// Gas burnt during the start
    pub gas: Energy,
    /// CO2 emitted during the start
    pub co2: Mass,
    /// Power credited to the plant during the start
    pub power: Energy,
}

impl StartCosts {
    /// Check that all quantities are finite and non-negative
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gas", self.gas.value()),
            ("co2", self.co2.value()),
            ("power", self.power.value()),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a finite number greater than or equal to zero"
            );
        }

        Ok(())
    }
}

/// The start costs for each [`StartTier`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartTypeTable {
    /// Costs for a [`StartTier::Hot`] start
    pub hot: StartCosts,
    /// Costs for a [`StartTier::Warm`] start
    pub warm: StartCosts,
    /// Costs for a [`StartTier::Cold`] start
    pub cold: StartCosts,
}

impl StartTypeTable {
    /// Get the costs for the given tier
    pub fn get(&self, tier: StartTier) -> &StartCosts {
        match tier {
            StartTier::Hot => &self.hot,
            StartTier::Warm => &self.warm,
            StartTier::Cold => &self.cold,
        }
    }
}

impl Default for StartTypeTable {
    fn default() -> Self {
        Self {
            hot: StartCosts {
                gas: Energy(190.0),
                co2: Mass(35.0),
                power: Energy(75.0),
            },
            warm: StartCosts {
                gas: Energy(700.0),
                co2: Mass(130.0),
                power: Energy(190.0),
            },
            cold: StartCosts {
                gas: Energy(800.0),
                co2: Mass(150.0),
                power: Energy(210.0),
            },
        }
    }
}

/// Represents the contents of a plant parameters file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantParameters {
    /// The maximum output of the plant while running
    #[serde(default = "default_max_capacity")]
    pub max_capacity: Power,
    /// The minimum stable output of the plant while running
    #[serde(default = "default_min_capacity")]
    pub min_capacity: Power,
    /// The maximum number of starts over the whole horizon
    #[serde(default = "default_max_starts")]
    pub max_starts: u32,
    /// The maximum number of hours the plant may run over the whole horizon
    #[serde(default = "default_max_run_hours")]
    pub max_run_hours: u32,
    /// A start is a hot start if the plant was off for at most this many hours
    #[serde(default = "default_hot_start_max_off_hours")]
    pub hot_start_max_off_hours: u32,
    /// A start is a warm start if the plant was off for more hours than a hot start allows and at
    /// most this many hours. Any longer break gives a cold start.
    #[serde(default = "default_warm_start_max_off_hours")]
    pub warm_start_max_off_hours: u32,
    /// Conversion efficiency for output up to the minimum capacity
    #[serde(default = "default_min_load_efficiency")]
    pub min_load_efficiency: Dimensionless,
    /// Conversion efficiency for output above the minimum capacity
    #[serde(default = "default_above_min_efficiency")]
    pub above_min_efficiency: Dimensionless,
    /// CO2 emitted per MWh of gas burnt
    #[serde(default = "default_co2_intensity")]
    pub co2_intensity: MassPerEnergy,
    /// Start costs for each tier
    #[serde(default)]
    pub start_types: StartTypeTable,
}

impl Default for PlantParameters {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            min_capacity: default_min_capacity(),
            max_starts: default_max_starts(),
            max_run_hours: default_max_run_hours(),
            hot_start_max_off_hours: default_hot_start_max_off_hours(),
            warm_start_max_off_hours: default_warm_start_max_off_hours(),
            min_load_efficiency: default_min_load_efficiency(),
            above_min_efficiency: default_above_min_efficiency(),
            co2_intensity: default_co2_intensity(),
            start_types: StartTypeTable::default(),
        }
    }
}

/// Check that the capacity limits are valid
fn check_capacities(min_capacity: Power, max_capacity: Power) -> Result<()> {
    ensure!(
        min_capacity.is_finite() && max_capacity.is_finite(),
        "min_capacity and max_capacity must be finite"
    );
    ensure!(
        min_capacity > Power(0.0),
        "min_capacity must be greater than zero"
    );
    ensure!(
        max_capacity > min_capacity,
        "max_capacity must be greater than min_capacity"
    );

    Ok(())
}

/// Check that an efficiency lies in (0, 1]
fn check_efficiency(name: &str, value: Dimensionless) -> Result<()> {
    ensure!(
        value > Dimensionless(0.0) && value <= Dimensionless(1.0),
        "{name} must be greater than zero and at most one"
    );

    Ok(())
}

/// Check that the off-duration boundaries between tiers are ordered
fn check_tier_boundaries(hot_max: u32, warm_max: u32) -> Result<()> {
    ensure!(
        hot_max < warm_max,
        "hot_start_max_off_hours must be less than warm_start_max_off_hours"
    );

    Ok(())
}

impl PlantParameters {
    /// Read plant parameters from the specified TOML file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the plant parameters file
    ///
    /// # Returns
    ///
    /// The file contents as a [`PlantParameters`] struct or an error if the file is invalid
    pub fn from_path(file_path: &Path) -> Result<PlantParameters> {
        let params: PlantParameters = read_toml(file_path)?;

        params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(params)
    }

    /// Validate parameters after reading them in
    pub fn validate(&self) -> Result<()> {
        check_capacities(self.min_capacity, self.max_capacity)?;
        check_efficiency("min_load_efficiency", self.min_load_efficiency)?;
        check_efficiency("above_min_efficiency", self.above_min_efficiency)?;
        ensure!(
            self.co2_intensity.is_finite() && self.co2_intensity >= MassPerEnergy(0.0),
            "co2_intensity must be a finite number greater than or equal to zero"
        );
        check_tier_boundaries(self.hot_start_max_off_hours, self.warm_start_max_off_hours)?;

        for (name, costs) in [
            ("hot", &self.start_types.hot),
            ("warm", &self.start_types.warm),
            ("cold", &self.start_types.cold),
        ] {
            costs
                .validate()
                .with_context(|| format!("Invalid start_types.{name}"))?;
        }

        Ok(())
    }

    /// The range of output available above the minimum capacity
    pub fn headroom(&self) -> Power {
        self.max_capacity - self.min_capacity
    }

    /// Gas burnt in one hour of running at minimum capacity
    pub fn min_load_gas(&self) -> Energy {
        self.min_capacity.over_one_hour() / self.min_load_efficiency
    }

    /// Gas burnt per MWh of output above the minimum capacity
    pub fn gas_per_unit_above_min(&self) -> Dimensionless {
        Dimensionless(1.0) / self.above_min_efficiency
    }

    /// The inclusive range of preceding off-hours which gives the specified tier.
    ///
    /// The upper bound is `None` for the tier with no upper limit.
    pub fn off_hours_range(&self, tier: StartTier) -> (u32, Option<u32>) {
        match tier {
            StartTier::Hot => (0, Some(self.hot_start_max_off_hours)),
            StartTier::Warm => (
                self.hot_start_max_off_hours + 1,
                Some(self.warm_start_max_off_hours),
            ),
            StartTier::Cold => (self.warm_start_max_off_hours + 1, None),
        }
    }

    /// Classify a start by the number of hours the plant was off immediately beforehand
    pub fn tier_for_off_hours(&self, off_hours: u32) -> StartTier {
        if off_hours <= self.hot_start_max_off_hours {
            StartTier::Hot
        } else if off_hours <= self.warm_start_max_off_hours {
            StartTier::Warm
        } else {
            StartTier::Cold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use strum::IntoEnumIterator;
    use tempfile::tempdir;

    #[test]
    fn test_default_parameters_are_valid() {
        PlantParameters::default().validate().unwrap();
    }

    #[test]
    fn test_plant_params_from_path_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plant.toml");
        File::create(&file_path).unwrap();

        let params = PlantParameters::from_path(&file_path).unwrap();
        assert_eq!(params, PlantParameters::default());
    }

    #[test]
    fn test_plant_params_from_path_overrides() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plant.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "max_starts = 3").unwrap();
            writeln!(file, "min_capacity = 100.0").unwrap();
            writeln!(file, "[start_types.hot]").unwrap();
            writeln!(file, "gas = 1.0").unwrap();
            writeln!(file, "co2 = 2.0").unwrap();
            writeln!(file, "power = 3.0").unwrap();
            writeln!(file, "[start_types.warm]").unwrap();
            writeln!(file, "gas = 4.0").unwrap();
            writeln!(file, "co2 = 5.0").unwrap();
            writeln!(file, "power = 6.0").unwrap();
            writeln!(file, "[start_types.cold]").unwrap();
            writeln!(file, "gas = 7.0").unwrap();
            writeln!(file, "co2 = 8.0").unwrap();
            writeln!(file, "power = 9.0").unwrap();
        }

        let params = PlantParameters::from_path(&file_path).unwrap();
        assert_eq!(params.max_starts, 3);
        assert_eq!(params.min_capacity, Power(100.0));
        assert_eq!(params.max_capacity, Power(400.0));
        assert_eq!(params.start_types.warm.co2, Mass(5.0));
    }

    #[test]
    fn test_plant_params_from_path_invalid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plant.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "min_capacity = 500.0").unwrap();
        }

        assert_error!(
            PlantParameters::from_path(&file_path),
            format!("Error reading {}", file_path.display())
        );
    }

    #[rstest]
    #[case(220.0, 400.0, true)]
    #[case(0.0, 400.0, false)]
    #[case(400.0, 400.0, false)]
    #[case(500.0, 400.0, false)]
    #[case(220.0, f64::INFINITY, false)]
    #[case(f64::NAN, 400.0, false)]
    fn test_check_capacities(#[case] min: f64, #[case] max: f64, #[case] expected_valid: bool) {
        assert_eq!(
            check_capacities(Power(min), Power(max)).is_ok(),
            expected_valid
        );
    }

    #[rstest]
    #[case(0.45, true)]
    #[case(1.0, true)]
    #[case(0.0, false)]
    #[case(-0.5, false)]
    #[case(1.5, false)]
    #[case(f64::NAN, false)]
    fn test_check_efficiency(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(
            check_efficiency("efficiency", Dimensionless(value)).is_ok(),
            expected_valid
        );
    }

    #[test]
    fn test_check_tier_boundaries() {
        assert!(check_tier_boundaries(10, 35).is_ok());
        assert!(check_tier_boundaries(10, 10).is_err());
        assert!(check_tier_boundaries(35, 10).is_err());
    }

    #[test]
    fn test_negative_start_costs_invalid() {
        let mut params = PlantParameters::default();
        params.start_types.cold.gas = Energy(-1.0);
        assert_error!(params.validate(), "Invalid start_types.cold");
    }

    #[rstest]
    #[case(0, StartTier::Hot)]
    #[case(1, StartTier::Hot)]
    #[case(10, StartTier::Hot)]
    #[case(11, StartTier::Warm)]
    #[case(35, StartTier::Warm)]
    #[case(36, StartTier::Cold)]
    #[case(1000, StartTier::Cold)]
    fn test_tier_for_off_hours(#[case] off_hours: u32, #[case] expected: StartTier) {
        assert_eq!(
            PlantParameters::default().tier_for_off_hours(off_hours),
            expected
        );
    }

    #[test]
    fn test_off_hours_ranges_partition() {
        // Ranges must be contiguous, with no gaps or overlaps
        let params = PlantParameters::default();
        let mut next = 0;
        for tier in StartTier::iter() {
            let (lower, upper) = params.off_hours_range(tier);
            assert_eq!(lower, next);
            match upper {
                Some(upper) => next = upper + 1,
                None => assert_eq!(tier, StartTier::Cold),
            }
        }
    }

    #[test]
    fn test_fuel_helpers() {
        let params = PlantParameters::default();
        assert_approx_eq!(f64, params.min_load_gas().value(), 220.0 / 0.45);
        assert_approx_eq!(f64, params.gas_per_unit_above_min().value(), 2.0);
        assert_eq!(params.headroom(), Power(180.0));
    }
}
