//! Fixtures for tests
use crate::plant::PlantParameters;
use crate::scenario::{PriceSeries, Scenario};
use crate::simulation::optimisation::CommitmentModel;
use crate::simulation::report::{DispatchResult, SolveFailure, SolverOptions, solve};
use crate::units::Money;
use float_cmp::approx_eq;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn plant() -> PlantParameters {
    PlantParameters::default()
}

#[fixture]
pub fn scenario() -> Scenario {
    Scenario {
        id: "1".into(),
        prices: PriceSeries::constant(24, 100.0, 20.0, 30.0),
    }
}

/// Build and solve a model for the given prices
pub fn solve_prices(
    prices: &PriceSeries,
    plant: &PlantParameters,
    options: &SolverOptions,
) -> Result<DispatchResult, SolveFailure> {
    let model = CommitmentModel::build(prices, plant).unwrap();
    solve(model, options)
}

/// The number of consecutive hours immediately before `hour` in which the plant was off
pub fn off_run_before(result: &DispatchResult, hour: usize) -> usize {
    result.records()[..hour]
        .iter()
        .rev()
        .take_while(|record| !record.is_on)
        .count()
}

/// Check every property that any solved schedule must have
pub fn assert_dispatch_invariants(result: &DispatchResult, plant: &PlantParameters) {
    let records = result.records();
    assert!(!records.is_empty());

    // Initial state is pinned
    let first = &records[0];
    assert!(first.is_on && !first.start && first.start_tier.is_none());

    let mut cumulative = Money(0.0);
    for (hour, record) in records.iter().enumerate() {
        assert_eq!(record.hour, hour);

        // Starts are exactly off -> on transitions
        if hour > 0 {
            assert_eq!(
                record.start,
                record.is_on && !records[hour - 1].is_on,
                "Bad start indicator in hour {hour}"
            );
        }

        // A tier is set iff there is a start, and it matches the preceding off-run
        match record.start_tier {
            Some(tier) => {
                assert!(record.start, "Tier without start in hour {hour}");
                let off_hours = u32::try_from(off_run_before(result, hour)).unwrap();
                assert_eq!(tier, plant.tier_for_off_hours(off_hours), "hour {hour}");
            }
            None => assert!(!record.start, "Start without tier in hour {hour}"),
        }

        // Output limits
        let gen_above_min = if record.is_on {
            record.generation - plant.min_capacity
        } else {
            record.generation
        };
        if record.is_on {
            assert!(gen_above_min.value() >= -1e-9);
            assert!(gen_above_min.value() <= plant.headroom().value() + 1e-9);
        } else {
            assert!(approx_eq!(f64, gen_above_min.value(), 0.0));
        }

        // Fuel and emissions
        let on = if record.is_on { 1.0 } else { 0.0 };
        let expected_gas = on * plant.min_load_gas().value()
            + gen_above_min.value() * plant.gas_per_unit_above_min().value();
        assert!(approx_eq!(
            f64,
            record.gas_input.value(),
            expected_gas,
            epsilon = 1e-6
        ));
        assert!(approx_eq!(
            f64,
            record.co2_output.value(),
            plant.co2_intensity.value() * record.gas_input.value(),
            epsilon = 1e-6
        ));

        // Running total
        cumulative += record.profit;
        assert!(approx_eq!(
            f64,
            record.cumulative_profit.value(),
            cumulative.value(),
            epsilon = 1e-6
        ));
    }

    // Horizon-wide limits
    assert!(result.num_starts() <= plant.max_starts as usize);
    assert!(result.run_hours() <= plant.max_run_hours as usize);
}
