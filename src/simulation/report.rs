//! Code for solving the unit commitment problem and turning the solution into an hourly report.
use super::optimisation::{CommitmentModel, VariableKind, VariableMap};
use crate::plant::{PlantParameters, StartTier};
use crate::scenario::PriceSeries;
use crate::units::{Dimensionless, Energy, Mass, Money, MoneyPerEnergy, MoneyPerMass, Power};
use anyhow::{Result, ensure};
use derive_more::Display;
use highs::{HighsModelStatus, Sense};
use log::{Level, log_enabled};
use strum::IntoEnumIterator;

/// Options passed on to the solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Wall-clock time limit for a single solve, in seconds
    pub time_limit: f64,
    /// The relative gap to the best bound at which a solution is accepted
    pub relative_gap: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit: 60.0,
            relative_gap: 0.001,
        }
    }
}

impl SolverOptions {
    /// Check that the options are usable
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.time_limit.is_finite() && self.time_limit > 0.0,
            "time_limit must be a finite number greater than zero"
        );
        ensure!(
            self.relative_gap.is_finite() && self.relative_gap >= 0.0,
            "relative_gap must be a finite number greater than or equal to zero"
        );

        Ok(())
    }
}

/// Indicates that no acceptable solution was found for a scenario
#[derive(Debug, Clone, PartialEq, Display)]
pub enum SolveFailure {
    /// The constraints cannot all be satisfied
    #[display("Problem is infeasible")]
    Infeasible,
    /// The time limit elapsed before a solution within the gap tolerance was found
    #[display("No acceptable solution found within the time limit of {_0}s")]
    TimeLimit(f64),
    /// The solver reported an error or an unexpected status
    #[display("Solver error: {_0}")]
    Solver(String),
}

impl std::error::Error for SolveFailure {}

/// The dispatch decision and its financial outcome for a single hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourRecord {
    /// Index of the hour within the horizon
    pub hour: usize,
    /// Power price for the hour
    pub power_price: MoneyPerEnergy,
    /// Gas price for the hour
    pub gas_price: MoneyPerEnergy,
    /// CO2 price for the hour
    pub co2_price: MoneyPerMass,
    /// Whether the plant is running
    pub is_on: bool,
    /// Whether the plant started at the beginning of the hour
    pub start: bool,
    /// The tier of the start, if there was one
    pub start_tier: Option<StartTier>,
    /// Total output (minimum plus output above minimum)
    pub generation: Power,
    /// Power credited for the start
    pub startup_power: Energy,
    /// Gas burnt for generation
    pub gas_input: Energy,
    /// CO2 emitted from generation
    pub co2_output: Mass,
    /// Gas burnt for the start
    pub startup_gas: Energy,
    /// CO2 emitted by the start
    pub startup_co2: Mass,
    /// Profit for the hour
    pub profit: Money,
    /// Profit for this and all preceding hours
    pub cumulative_profit: Money,
}

/// The solved dispatch schedule for a scenario
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    records: Vec<HourRecord>,
}

impl DispatchResult {
    /// Create a result from hourly records, (re)computing the cumulative profit
    pub fn from_records(mut records: Vec<HourRecord>) -> Self {
        let mut cumulative = Money(0.0);
        for record in &mut records {
            cumulative += record.profit;
            record.cumulative_profit = cumulative;
        }

        Self { records }
    }

    /// The hourly records, in hour order
    pub fn records(&self) -> &[HourRecord] {
        &self.records
    }

    /// Profit over the whole horizon
    pub fn total_profit(&self) -> Money {
        self.records
            .last()
            .map_or(Money(0.0), |record| record.cumulative_profit)
    }

    /// The number of starts over the horizon
    pub fn num_starts(&self) -> usize {
        self.records.iter().filter(|record| record.start).count()
    }

    /// The number of hours in which the plant runs
    pub fn run_hours(&self) -> usize {
        self.records.iter().filter(|record| record.is_on).count()
    }
}

/// Solve the commitment problem.
///
/// # Arguments
///
/// * `model` - The problem to solve
/// * `options` - Time limit and gap tolerance for the solver
///
/// # Returns
///
/// The hourly schedule, or the reason why no acceptable solution was found.
pub fn solve(
    model: CommitmentModel,
    options: &SolverOptions,
) -> Result<DispatchResult, SolveFailure> {
    let CommitmentModel {
        problem,
        variables,
        prices,
        plant,
    } = model;

    let mut highs_model = problem.optimise(Sense::Maximise);
    highs_model.set_option("time_limit", options.time_limit);
    highs_model.set_option("mip_rel_gap", options.relative_gap);

    // Solver output doesn't go via our logger, so only show it when debugging
    highs_model.set_option("output_flag", log_enabled!(Level::Debug));

    let solved = highs_model
        .try_solve()
        .map_err(|status| SolveFailure::Solver(format!("{status:?}")))?;
    match solved.status() {
        HighsModelStatus::Optimal => {}
        // The objective is bounded, so this can only mean infeasibility
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            return Err(SolveFailure::Infeasible);
        }
        HighsModelStatus::ReachedTimeLimit => {
            return Err(SolveFailure::TimeLimit(options.time_limit));
        }
        status => {
            return Err(SolveFailure::Solver(format!(
                "Unexpected model status: {status:?}"
            )));
        }
    }

    let solution = solved.get_solution();
    let values = solution.columns();
    let records = (0..prices.power.len())
        .map(|hour| build_hour_record(hour, &variables, values, prices, plant))
        .collect();

    Ok(DispatchResult::from_records(records))
}

/// Round the value of a binary variable, discarding numerical noise from the solver
fn is_set(value: f64) -> bool {
    value > 0.5
}

/// Reconstruct the record for one hour from the solved variable values.
///
/// Binary decisions are rounded and all derived quantities are recomputed from the rounded
/// values, rather than taken from the solver.
fn build_hour_record(
    hour: usize,
    variables: &VariableMap,
    values: &[f64],
    prices: &PriceSeries,
    plant: &PlantParameters,
) -> HourRecord {
    let value_of = |kind| values[variables.index_of(hour, kind)];

    let is_on = is_set(value_of(VariableKind::IsOn));
    let start = is_set(value_of(VariableKind::Start));
    let start_tier =
        StartTier::iter().find(|&tier| is_set(value_of(VariableKind::StartTier(tier))));
    let gen_above_min = if is_on {
        Power(value_of(VariableKind::GenAboveMin).clamp(0.0, plant.headroom().value()))
    } else {
        Power(0.0)
    };

    calculate_hour_record(
        hour,
        prices,
        plant,
        is_on,
        start,
        start_tier,
        gen_above_min,
    )
}

/// Calculate the physical and financial quantities for one hour from the dispatch decisions
fn calculate_hour_record(
    hour: usize,
    prices: &PriceSeries,
    plant: &PlantParameters,
    is_on: bool,
    start: bool,
    start_tier: Option<StartTier>,
    gen_above_min: Power,
) -> HourRecord {
    let on = Dimensionless::from(is_on);
    let generation = on * plant.min_capacity + gen_above_min;
    let gas_input = on * plant.min_load_gas()
        + plant.gas_per_unit_above_min() * gen_above_min.over_one_hour();
    let co2_output = plant.co2_intensity * gas_input;

    let (startup_power, startup_gas, startup_co2) = match start_tier {
        Some(tier) => {
            let costs = plant.start_types.get(tier);
            (costs.power, costs.gas, costs.co2)
        }
        None => (Energy(0.0), Energy(0.0), Mass(0.0)),
    };

    let power_price = prices.power[hour];
    let gas_price = prices.gas[hour];
    let co2_price = prices.co2[hour];
    let revenue = power_price * (generation.over_one_hour() + startup_power);
    let costs = gas_price * (gas_input + startup_gas) + co2_price * (co2_output + startup_co2);

    HourRecord {
        hour,
        power_price,
        gas_price,
        co2_price,
        is_on,
        start,
        start_tier,
        generation,
        startup_power,
        gas_input,
        co2_output,
        startup_gas,
        startup_co2,
        profit: revenue - costs,
        cumulative_profit: Money(0.0),
    }
}
