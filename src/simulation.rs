//! Functionality for running dispatch simulations over a set of price scenarios.
use crate::id::ScenarioID;
use crate::output::write_results;
use crate::plant::PlantParameters;
use crate::scenario::Scenario;
use anyhow::{Result, ensure};
use derive_more::{Display, From};
use itertools::Itertools;
use log::{debug, error, info};
use std::path::Path;

pub mod optimisation;
use optimisation::{CommitmentModel, InvalidInputError};
pub mod report;
use report::{DispatchResult, SolveFailure, SolverOptions, solve};

/// Why a scenario produced no results
#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum ScenarioFailure {
    /// The scenario's inputs could not be turned into a model
    #[display("Invalid input: {_0}")]
    InvalidInput(InvalidInputError),
    /// No acceptable solution was found
    #[display("Solve failed: {_0}")]
    Solve(SolveFailure),
}

impl std::error::Error for ScenarioFailure {}

/// Build and solve the commitment problem for a single scenario.
///
/// # Arguments
///
/// * `scenario` - The scenario to solve
/// * `plant` - The plant parameters
/// * `options` - Options for the solver
pub fn solve_scenario(
    scenario: &Scenario,
    plant: &PlantParameters,
    options: &SolverOptions,
) -> Result<DispatchResult, ScenarioFailure> {
    let model = CommitmentModel::build(&scenario.prices, plant)?;
    debug!(
        "Built model for scenario {} with {} hours, {} variables and {} constraints",
        scenario.id,
        model.num_hours(),
        model.num_variables(),
        model.num_constraints()
    );

    info!("Solving scenario {}...", scenario.id);
    let result = solve(model, options)?;
    info!(
        "Scenario {}: profit {:.2}, {} starts, {} running hours",
        scenario.id,
        result.total_profit().value(),
        result.num_starts(),
        result.run_hours()
    );

    Ok(result)
}

/// Check that models can be built for all the scenarios, without solving them
pub fn validate_scenarios(scenarios: &[Scenario], plant: &PlantParameters) -> Result<()> {
    let mut failed = Vec::new();
    for scenario in scenarios {
        if let Err(err) = CommitmentModel::build(&scenario.prices, plant) {
            error!("Scenario {}: {err}", scenario.id);
            failed.push(scenario.id.clone());
        }
    }

    check_failures(&failed, scenarios.len())
}

/// Run the simulation.
///
/// Each scenario is solved independently. A failure in one scenario is logged and does not prevent
/// the others from running, but an error listing all failed scenarios is returned at the end.
///
/// # Arguments
///
/// * `scenarios` - The scenarios to run
/// * `plant` - The plant parameters
/// * `options` - Options for the solver
/// * `output_path` - The folder to which results will be written
pub fn run(
    scenarios: &[Scenario],
    plant: &PlantParameters,
    options: &SolverOptions,
    output_path: &Path,
) -> Result<()> {
    let mut failed = Vec::new();
    for scenario in scenarios {
        info!("Processing scenario {}...", scenario.id);
        match solve_scenario(scenario, plant, options) {
            Ok(result) => {
                let file_path = write_results(output_path, &scenario.id, &result)?;
                info!("Results saved to {}", file_path.display());
            }
            Err(err) => {
                error!("Scenario {}: {err}", scenario.id);
                failed.push(scenario.id.clone());
            }
        }
    }

    check_failures(&failed, scenarios.len())
}

/// Return an error naming the failed scenarios, if there were any
fn check_failures(failed: &[ScenarioID], total: usize) -> Result<()> {
    ensure!(
        failed.is_empty(),
        "{} of {} scenarios failed: {}",
        failed.len(),
        total,
        failed.iter().join(", ")
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, plant, scenario};
    use crate::output::results_file_path;
    use crate::scenario::PriceSeries;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_solve_scenario(scenario: Scenario, plant: PlantParameters) {
        let result = solve_scenario(&scenario, &plant, &SolverOptions::default()).unwrap();
        assert_eq!(result.records().len(), 24);
    }

    #[rstest]
    fn test_solve_scenario_invalid_input(plant: PlantParameters) {
        let scenario = Scenario {
            id: "bad".into(),
            prices: PriceSeries::from_values(&[1.0, 2.0], &[1.0], &[1.0]),
        };
        assert!(matches!(
            solve_scenario(&scenario, &plant, &SolverOptions::default()),
            Err(ScenarioFailure::InvalidInput(
                InvalidInputError::LengthMismatch { .. }
            ))
        ));
    }

    #[rstest]
    fn test_run_isolates_failures(scenario: Scenario, plant: PlantParameters) {
        let bad = Scenario {
            id: "2".into(),
            prices: PriceSeries::default(),
        };
        let infeasible = Scenario {
            id: "3".into(),
            prices: PriceSeries::constant(4, 100.0, 20.0, 30.0),
        };
        let plant_no_hours = PlantParameters {
            max_run_hours: 0,
            ..plant.clone()
        };

        let dir = tempdir().unwrap();
        assert_error!(
            run(
                &[bad, scenario.clone()],
                &plant,
                &SolverOptions::default(),
                dir.path()
            ),
            "1 of 2 scenarios failed: 2"
        );

        // The valid scenario still produced output, the invalid one didn't
        assert!(results_file_path(dir.path(), &scenario.id).is_file());
        assert!(!results_file_path(dir.path(), &"2".into()).exists());

        // Solve failures are reported in the same way
        assert_error!(
            run(
                &[infeasible],
                &plant_no_hours,
                &SolverOptions::default(),
                dir.path()
            ),
            "1 of 1 scenarios failed: 3"
        );
    }

    #[rstest]
    fn test_validate_scenarios(scenario: Scenario, plant: PlantParameters) {
        assert!(validate_scenarios(&[scenario.clone()], &plant).is_ok());

        let bad = Scenario {
            id: "x".into(),
            prices: PriceSeries::from_values(&[1.0], &[1.0], &[]),
        };
        assert_error!(
            validate_scenarios(&[scenario, bad], &plant),
            "1 of 2 scenarios failed: x"
        );
    }
}
