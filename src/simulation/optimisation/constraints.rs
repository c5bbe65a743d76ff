//! Code for adding constraints to the unit commitment problem.
//!
//! Temporal logic (starts, runs of off-hours and start tiers) is expressed with big-M
//! inequalities. The direction and tightness of each inequality matters: loosening one of them
//! admits solutions which are numerically feasible but logically inconsistent.
use super::{VariableKind, VariableMap};
use crate::plant::{PlantParameters, StartTier};
use highs::RowProblem as Problem;
use strum::IntoEnumIterator;

/// Add all constraints to the problem.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `plant` - The plant parameters
/// * `n_hours` - The number of hours in the horizon
pub fn add_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    plant: &PlantParameters,
    n_hours: usize,
) {
    add_initial_state_constraints(problem, variables);

    for hour in 0..n_hours {
        add_operating_constraints(problem, variables, plant, hour);
        add_start_tier_sum_constraint(problem, variables, hour);
    }

    for hour in 1..n_hours {
        add_start_constraints(problem, variables, hour);
        add_consecutive_off_constraints(problem, variables, hour, n_hours);
        add_start_tier_gating_constraints(problem, variables, plant, hour, n_hours);
    }

    add_horizon_limit_constraints(problem, variables, plant, n_hours);
}

/// Pin the state of the first hour: the plant is running, has not just started and has no
/// preceding off-hours.
fn add_initial_state_constraints(problem: &mut Problem, variables: &VariableMap) {
    let fixed = [
        (VariableKind::IsOn, 1.0),
        (VariableKind::Start, 0.0),
        (VariableKind::ConsecutiveOff, 0.0),
    ]
    .into_iter()
    .chain(StartTier::iter().map(|tier| (VariableKind::StartTier(tier), 0.0)));

    for (kind, value) in fixed {
        problem.add_row(value..=value, [(variables.get(0, kind), 1.0)]);
    }
}

/// Add output, fuel and emissions constraints for one hour.
///
/// Output above the minimum is only possible while the plant is on, and gas and CO2 are exact
/// linear functions of the commitment and output.
fn add_operating_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    plant: &PlantParameters,
    hour: usize,
) {
    let is_on = variables.get(hour, VariableKind::IsOn);
    let gen_above_min = variables.get(hour, VariableKind::GenAboveMin);
    let gas_in = variables.get(hour, VariableKind::GasIn);
    let co2_out = variables.get(hour, VariableKind::Co2Out);

    // gen_above_min <= headroom * is_on
    problem.add_row(
        ..=0.0,
        [(gen_above_min, 1.0), (is_on, -plant.headroom().value())],
    );

    // gas_in = min_load_gas * is_on + gen_above_min / above_min_efficiency
    problem.add_row(
        0.0..=0.0,
        [
            (gas_in, 1.0),
            (is_on, -plant.min_load_gas().value()),
            (gen_above_min, -plant.gas_per_unit_above_min().value()),
        ],
    );

    // co2_out = co2_intensity * gas_in
    problem.add_row(
        0.0..=0.0,
        [(co2_out, 1.0), (gas_in, -plant.co2_intensity.value())],
    );
}

/// Exactly one tier is selected when there is a start and none otherwise
fn add_start_tier_sum_constraint(problem: &mut Problem, variables: &VariableMap, hour: usize) {
    let start = variables.get(hour, VariableKind::Start);
    let terms = StartTier::iter()
        .map(|tier| (variables.get(hour, VariableKind::StartTier(tier)), 1.0))
        .chain([(start, -1.0)]);

    problem.add_row(0.0..=0.0, terms);
}

/// Define the start indicator as `is_on[h] AND NOT is_on[h-1]`.
///
/// The lower bound and the two upper bounds together pin the start variable for every combination
/// of the two commitment decisions.
fn add_start_constraints(problem: &mut Problem, variables: &VariableMap, hour: usize) {
    let start = variables.get(hour, VariableKind::Start);
    let is_on = variables.get(hour, VariableKind::IsOn);
    let was_on = variables.get(hour - 1, VariableKind::IsOn);

    // start >= is_on - was_on
    problem.add_row(0.0.., [(start, 1.0), (is_on, -1.0), (was_on, 1.0)]);

    // start <= is_on
    problem.add_row(..=0.0, [(start, 1.0), (is_on, -1.0)]);

    // start <= 1 - was_on
    problem.add_row(..=1.0, [(start, 1.0), (was_on, 1.0)]);
}

/// Track the length of the current run of off-hours.
///
/// With `M` equal to the horizon length, the count is forced to zero when the plant is on and to
/// exactly one more than the previous hour's count when it is off.
fn add_consecutive_off_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    hour: usize,
    n_hours: usize,
) {
    let big_m = n_hours as f64;
    let off = variables.get(hour, VariableKind::ConsecutiveOff);
    let prev_off = variables.get(hour - 1, VariableKind::ConsecutiveOff);
    let is_on = variables.get(hour, VariableKind::IsOn);

    // off[h] <= off[h-1] + 1
    problem.add_row(..=1.0, [(off, 1.0), (prev_off, -1.0)]);

    // off[h] <= M * (1 - is_on[h])
    problem.add_row(..=big_m, [(off, 1.0), (is_on, big_m)]);

    // off[h] >= off[h-1] + 1 - M * is_on[h]
    problem.add_row(1.0.., [(off, 1.0), (prev_off, -1.0), (is_on, big_m)]);
}

/// Only allow a tier to be selected if the length of the off-run ending in the previous hour falls
/// within the tier's bounds.
///
/// Each bound is a one-sided implication with its own big-M, chosen as the smallest value which
/// leaves the bound inactive when the tier is not selected:
///
/// * `off >= L - M(1 - x)` needs `M = L`, as `off` is never negative
/// * `off <= U + M(1 - x)` needs `M = n_hours - U`, as `off` never exceeds `n_hours`
fn add_start_tier_gating_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    plant: &PlantParameters,
    hour: usize,
    n_hours: usize,
) {
    let prev_off = variables.get(hour - 1, VariableKind::ConsecutiveOff);

    for tier in StartTier::iter() {
        let selected = variables.get(hour, VariableKind::StartTier(tier));
        let (lower, upper) = plant.off_hours_range(tier);

        if lower > 0 {
            // off[h-1] >= lower * x
            problem.add_row(0.0.., [(prev_off, 1.0), (selected, -f64::from(lower))]);
        }

        if let Some(upper) = upper {
            let big_m = n_hours.saturating_sub(upper as usize) as f64;
            if big_m > 0.0 {
                // off[h-1] + M * x <= upper + M
                problem.add_row(
                    ..=f64::from(upper) + big_m,
                    [(prev_off, 1.0), (selected, big_m)],
                );
            }
        }
    }
}

/// Cap the total number of starts and running hours over the horizon
fn add_horizon_limit_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    plant: &PlantParameters,
    n_hours: usize,
) {
    for (kind, limit) in [
        (VariableKind::Start, plant.max_starts),
        (VariableKind::IsOn, plant.max_run_hours),
    ] {
        let terms = (0..n_hours).map(|hour| (variables.get(hour, kind), 1.0));
        problem.add_row(..=f64::from(limit), terms);
    }
}
