//! Code for building the unit commitment problem for a single scenario.
//!
//! The problem is a mixed-integer linear program with one set of variables per hour. Its
//! objective is the profit of the plant over the whole horizon, which is maximised.
use crate::plant::{PlantParameters, StartTier};
use crate::scenario::PriceSeries;
use derive_more::Display;
use highs::RowProblem as Problem;
use indexmap::IndexMap;
use itertools::izip;
use std::ops::RangeBounds;
use strum::IntoEnumIterator;

pub mod constraints;
use constraints::add_constraints;

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
pub type Variable = highs::Col;

/// The quantity that a variable represents within a given hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Whether the plant is running (binary)
    IsOn,
    /// Whether the plant was started at the beginning of the hour (binary)
    Start,
    /// Whether the start was of the given tier (binary)
    StartTier(StartTier),
    /// Output above the minimum capacity (MW)
    GenAboveMin,
    /// Gas burnt during the hour, excluding startup gas (MWh)
    GasIn,
    /// CO2 emitted during the hour, excluding startup emissions (t)
    Co2Out,
    /// The number of consecutive hours immediately before this one in which the plant was off,
    /// or zero if the plant is on (integer)
    ConsecutiveOff,
}

impl VariableKind {
    /// Iterate over the kinds of variable declared for every hour, in declaration order
    pub fn iter() -> impl Iterator<Item = VariableKind> {
        [Self::IsOn, Self::Start]
            .into_iter()
            .chain(StartTier::iter().map(Self::StartTier))
            .chain([Self::GenAboveMin, Self::GasIn, Self::Co2Out, Self::ConsecutiveOff])
    }
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]) in the same order as the columns of the problem, so
/// the position of a key is also the index of its value in the solution.
#[derive(Default)]
pub struct VariableMap(IndexMap<(usize, VariableKind), Variable>);

impl VariableMap {
    /// Add a new column to the problem and record it in the map
    fn add<B: RangeBounds<f64>>(
        &mut self,
        problem: &mut Problem,
        hour: usize,
        kind: VariableKind,
        coeff: f64,
        bounds: B,
    ) {
        // Columns must only be added via this map, otherwise the indexes will not line up
        assert!(
            problem.num_cols() == self.0.len(),
            "Columns added to problem outside of variable map"
        );

        let var = match kind {
            VariableKind::GenAboveMin | VariableKind::GasIn | VariableKind::Co2Out => {
                problem.add_column(coeff, bounds)
            }
            _ => problem.add_integer_column(coeff, bounds),
        };

        let existing = self.0.insert((hour, kind), var).is_some();
        assert!(!existing, "Duplicate entry for var");
    }

    /// Get the [`Variable`] corresponding to the given hour and quantity
    pub fn get(&self, hour: usize, kind: VariableKind) -> Variable {
        *self
            .0
            .get(&(hour, kind))
            .expect("No variable found for given params")
    }

    /// Get the column index of the variable for the given hour and quantity
    pub fn index_of(&self, hour: usize, kind: VariableKind) -> usize {
        self.0
            .get_index_of(&(hour, kind))
            .expect("No variable found for given params")
    }

    /// The number of variables in the map
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no variables
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Indicates that a scenario's price series cannot be turned into a model
#[derive(Debug, Clone, PartialEq, Display)]
pub enum InvalidInputError {
    /// No prices were provided
    #[display("Price series are empty")]
    Empty,
    /// The three price series do not cover the same number of hours
    #[display("Price series have different lengths (power: {power}, gas: {gas}, co2: {co2})")]
    LengthMismatch {
        /// Length of the power price series
        power: usize,
        /// Length of the gas price series
        gas: usize,
        /// Length of the CO2 price series
        co2: usize,
    },
    /// A price is infinite or NaN
    #[display("{commodity} price for hour {hour} is not a finite number")]
    NonFinitePrice {
        /// The commodity whose price is invalid
        commodity: &'static str,
        /// The hour of the invalid price
        hour: usize,
    },
    /// The plant parameters are inconsistent
    #[display("Invalid plant parameters: {_0}")]
    Plant(String),
}

impl std::error::Error for InvalidInputError {}

/// The unit commitment problem for one scenario, ready to be solved
pub struct CommitmentModel<'a> {
    pub(super) problem: Problem,
    pub(super) variables: VariableMap,
    pub(super) prices: &'a PriceSeries,
    pub(super) plant: &'a PlantParameters,
}

impl<'a> CommitmentModel<'a> {
    /// Build the commitment problem for a scenario.
    ///
    /// # Arguments
    ///
    /// * `prices` - Hourly power, gas and CO2 prices, all of the same non-zero length
    /// * `plant` - Parameters of the plant being dispatched
    ///
    /// # Returns
    ///
    /// The problem, or an error if the inputs are invalid.
    pub fn build(
        prices: &'a PriceSeries,
        plant: &'a PlantParameters,
    ) -> Result<Self, InvalidInputError> {
        let n_hours = check_prices(prices)?;
        plant
            .validate()
            .map_err(|err| InvalidInputError::Plant(format!("{err:#}")))?;

        let mut problem = Problem::default();
        let variables = add_variables(&mut problem, prices, plant);
        add_constraints(&mut problem, &variables, plant, n_hours);

        Ok(Self {
            problem,
            variables,
            prices,
            plant,
        })
    }

    /// The number of hours in the horizon
    pub fn num_hours(&self) -> usize {
        self.prices.power.len()
    }

    /// The number of decision variables in the problem
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.problem.num_rows()
    }

    /// Fix the commitment decision for an hour.
    ///
    /// Used by tests to force particular on/off patterns.
    #[cfg(test)]
    pub(crate) fn fix_commitment(&mut self, hour: usize, is_on: bool) {
        let value = if is_on { 1.0 } else { 0.0 };
        let var = self.variables.get(hour, VariableKind::IsOn);
        self.problem.add_row(value..=value, [(var, 1.0)]);
    }
}

/// Check that the price series are usable, returning the number of hours
fn check_prices(prices: &PriceSeries) -> Result<usize, InvalidInputError> {
    let (power, gas, co2) = (prices.power.len(), prices.gas.len(), prices.co2.len());
    if power != gas || power != co2 {
        return Err(InvalidInputError::LengthMismatch { power, gas, co2 });
    }
    if power == 0 {
        return Err(InvalidInputError::Empty);
    }

    for (hour, (power, gas, co2)) in izip!(&prices.power, &prices.gas, &prices.co2).enumerate() {
        for (commodity, finite) in [
            ("power", power.is_finite()),
            ("gas", gas.is_finite()),
            ("co2", co2.is_finite()),
        ] {
            if !finite {
                return Err(InvalidInputError::NonFinitePrice { commodity, hour });
            }
        }
    }

    Ok(power)
}

/// Add variables to the optimisation problem.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `prices` - The scenario's prices
/// * `plant` - The plant parameters
///
/// # Returns
///
/// A [`VariableMap`] with the problem's variables as values.
fn add_variables(
    problem: &mut Problem,
    prices: &PriceSeries,
    plant: &PlantParameters,
) -> VariableMap {
    let n_hours = prices.power.len();
    let mut variables = VariableMap::default();

    for hour in 0..n_hours {
        for kind in VariableKind::iter() {
            let coeff = calculate_profit_coefficient(kind, hour, prices, plant);
            match kind {
                VariableKind::GenAboveMin => {
                    variables.add(problem, hour, kind, coeff, 0.0..=plant.headroom().value());
                }
                VariableKind::GasIn | VariableKind::Co2Out => {
                    variables.add(problem, hour, kind, coeff, 0.0..);
                }
                VariableKind::ConsecutiveOff => {
                    variables.add(problem, hour, kind, coeff, 0.0..=n_hours as f64);
                }
                VariableKind::IsOn | VariableKind::Start | VariableKind::StartTier(_) => {
                    variables.add(problem, hour, kind, coeff, 0.0..=1.0);
                }
            }
        }
    }

    variables
}

/// Calculate the contribution of one unit of a variable to the hour's profit.
///
/// Revenue is earned on baseline generation and on startup power credits. Costs are paid on gas
/// burnt and CO2 emitted, both during normal running and during starts.
fn calculate_profit_coefficient(
    kind: VariableKind,
    hour: usize,
    prices: &PriceSeries,
    plant: &PlantParameters,
) -> f64 {
    let power_price = prices.power[hour];
    let gas_price = prices.gas[hour];
    let co2_price = prices.co2[hour];

    match kind {
        VariableKind::IsOn => (power_price * plant.min_capacity.over_one_hour()).value(),
        VariableKind::GenAboveMin => power_price.value(),
        VariableKind::GasIn => -gas_price.value(),
        VariableKind::Co2Out => -co2_price.value(),
        VariableKind::StartTier(tier) => {
            let costs = plant.start_types.get(tier);
            (power_price * costs.power - gas_price * costs.gas - co2_price * costs.co2).value()
        }
        VariableKind::Start | VariableKind::ConsecutiveOff => 0.0,
    }
}
