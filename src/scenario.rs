//! Price scenarios to be dispatched against.
use crate::id::ScenarioID;
use crate::units::{MoneyPerEnergy, MoneyPerMass};

/// Hourly price series for a single scenario.
///
/// Index 0 is the first hour of the horizon, in which the plant is known to be running.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    /// Power price for each hour
    pub power: Vec<MoneyPerEnergy>,
    /// Gas price for each hour
    pub gas: Vec<MoneyPerEnergy>,
    /// CO2 price for each hour
    pub co2: Vec<MoneyPerMass>,
}

impl PriceSeries {
    /// Create a new [`PriceSeries`] from raw values
    pub fn from_values(power: &[f64], gas: &[f64], co2: &[f64]) -> Self {
        Self {
            power: power.iter().copied().map(MoneyPerEnergy).collect(),
            gas: gas.iter().copied().map(MoneyPerEnergy).collect(),
            co2: co2.iter().copied().map(MoneyPerMass).collect(),
        }
    }

    /// Create a series in which every hour has the same prices
    pub fn constant(n_hours: usize, power: f64, gas: f64, co2: f64) -> Self {
        Self {
            power: vec![MoneyPerEnergy(power); n_hours],
            gas: vec![MoneyPerEnergy(gas); n_hours],
            co2: vec![MoneyPerMass(co2); n_hours],
        }
    }
}

/// A single price scenario ("simulation")
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Identifies the scenario in logs and output file names
    pub id: ScenarioID,
    /// The scenario's prices
    pub prices: PriceSeries,
}
