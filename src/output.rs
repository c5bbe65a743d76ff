//! The module responsible for writing output data to disk.
use crate::id::ScenarioID;
use crate::simulation::report::{DispatchResult, HourRecord};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which input-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "dispatch_results";

/// Get the default output folder for the specified price file
pub fn get_output_dir(prices_file: &Path) -> Result<PathBuf> {
    let name = prices_file
        .file_stem()
        .context("Price file path has no file name")?
        .to_str()
        .context("Invalid chars in price file name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, name].iter().collect())
}

/// Create a new output directory, if it doesn't already exist.
///
/// A non-empty existing directory is only accepted if `allow_overwrite` is set, in which case its
/// contents are deleted.
///
/// # Returns
///
/// True if an existing folder is being overwritten, false otherwise.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in a results CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ResultRow {
    hour: usize,
    power_price: f64,
    gas_price: f64,
    co2_price: f64,
    is_on: u8,
    start: u8,
    start_type: u8,
    generation_mw: f64,
    startup_power_mwh: f64,
    gas_input_mwh: f64,
    co2_ton: f64,
    startup_gas_mwh: f64,
    startup_co2_ton: f64,
    profit: f64,
    profit_cum: f64,
}

impl From<&HourRecord> for ResultRow {
    fn from(record: &HourRecord) -> Self {
        Self {
            hour: record.hour,
            power_price: record.power_price.value(),
            gas_price: record.gas_price.value(),
            co2_price: record.co2_price.value(),
            is_on: record.is_on.into(),
            start: record.start.into(),
            start_type: record.start_tier.map_or(0, |tier| tier.code()),
            generation_mw: record.generation.value(),
            startup_power_mwh: record.startup_power.value(),
            gas_input_mwh: record.gas_input.value(),
            co2_ton: record.co2_output.value(),
            startup_gas_mwh: record.startup_gas.value(),
            startup_co2_ton: record.startup_co2.value(),
            profit: record.profit.value(),
            profit_cum: record.cumulative_profit.value(),
        }
    }
}

/// The path of the results file for a scenario
pub fn results_file_path(output_path: &Path, scenario_id: &ScenarioID) -> PathBuf {
    output_path.join(format!("results_sim_{scenario_id}.csv"))
}

/// Write the results for a scenario to a CSV file.
///
/// # Arguments
///
/// * `output_path` - Folder where the file will be saved
/// * `scenario_id` - The scenario the results are for
/// * `result` - The solved schedule
///
/// # Returns
///
/// The path of the file written.
pub fn write_results(
    output_path: &Path,
    scenario_id: &ScenarioID,
    result: &DispatchResult,
) -> Result<PathBuf> {
    let file_path = results_file_path(output_path, scenario_id);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for record in result.records() {
        writer.serialize(ResultRow::from(record))?;
    }
    writer.flush()?;

    Ok(file_path)
}
