//! Code for reading scenario price series from a CSV file.
//!
//! Each scenario is described by three columns named `power_<id>`, `gas_<id>` and `co2_<id>`.
//! Header matching is case-insensitive and other columns are ignored.
use super::input_err_msg;
use crate::id::ScenarioID;
use crate::scenario::{PriceSeries, Scenario};
use crate::units::{MoneyPerEnergy, MoneyPerMass};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::Path;
use unicase::UniCase;

/// The commodity a price column refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum PriceKind {
    Power,
    Gas,
    Co2,
}

impl PriceKind {
    /// The column name prefix for this kind of price
    const fn prefix(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Gas => "gas",
            Self::Co2 => "co2",
        }
    }

    /// Work out which price and scenario a column header refers to, if any
    fn parse_header(header: &str) -> Option<(Self, ScenarioID)> {
        let (prefix, id) = header.trim().split_once('_')?;
        if id.is_empty() {
            return None;
        }

        let prefix = UniCase::new(prefix);
        [Self::Power, Self::Gas, Self::Co2]
            .into_iter()
            .find(|kind| prefix == UniCase::new(kind.prefix()))
            .map(|kind| (kind, ScenarioID::from(id)))
    }
}

/// Read all scenarios from a price CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The scenarios, ordered by ID, or an error if the file is invalid.
pub fn read_scenarios(file_path: &Path) -> Result<Vec<Scenario>> {
    read_scenarios_from_path(file_path).with_context(|| input_err_msg(file_path))
}

fn read_scenarios_from_path(file_path: &Path) -> Result<Vec<Scenario>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(file_path)?;

    // Map of column index to the price it contains
    let mut columns = IndexMap::new();
    for (idx, header) in reader.headers()?.iter().enumerate() {
        if let Some(key) = PriceKind::parse_header(header) {
            ensure!(
                !columns.values().contains(&key),
                "Duplicate price column: {header}"
            );
            columns.insert(idx, key);
        }
    }
    ensure!(!columns.is_empty(), "No price columns found");

    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for ((&idx, (kind, id)), column) in columns.iter().zip(values.iter_mut()) {
            let value = parse_cell(record.get(idx).unwrap_or_default()).with_context(|| {
                format!(
                    "Invalid value for {}_{id} on line {}",
                    kind.prefix(),
                    row + 2
                )
            })?;
            column.push(value);
        }
    }

    let mut series = BTreeMap::new();
    for ((kind, id), column) in columns.into_values().zip(values) {
        let column = trim_column(column)
            .with_context(|| format!("Invalid column {}_{id}", kind.prefix()))?;
        series.insert((id, kind), column);
    }

    collect_scenarios(series)
}

/// Parse a single cell of the price table; blank cells are `None`
fn parse_cell(cell: &str) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }

    let value: f64 = cell.parse()?;
    ensure!(value.is_finite(), "Prices must be finite");

    Ok(Some(value))
}

/// Drop trailing blank cells, rejecting blanks in the middle of a column
fn trim_column(mut column: Vec<Option<f64>>) -> Result<Vec<f64>> {
    while column.last() == Some(&None) {
        column.pop();
    }

    column
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.with_context(|| format!("Missing value on line {}", row + 2)))
        .try_collect()
}

/// Group columns by scenario ID, checking that every scenario has all three prices
fn collect_scenarios(series: BTreeMap<(ScenarioID, PriceKind), Vec<f64>>) -> Result<Vec<Scenario>> {
    let mut by_id: BTreeMap<ScenarioID, IndexMap<PriceKind, Vec<f64>>> = BTreeMap::new();
    for ((id, kind), column) in series {
        by_id.entry(id).or_default().insert(kind, column);
    }

    let mut scenarios = Vec::with_capacity(by_id.len());
    for (id, mut columns) in by_id {
        let mut take = |kind: PriceKind| match columns.swap_remove(&kind) {
            Some(column) => Ok(column),
            None => bail!("Scenario {id} has no {}_{id} column", kind.prefix()),
        };

        let power = take(PriceKind::Power)?;
        let gas = take(PriceKind::Gas)?;
        let co2 = take(PriceKind::Co2)?;
        scenarios.push(Scenario {
            id,
            prices: PriceSeries {
                power: power.into_iter().map(MoneyPerEnergy).collect(),
                gas: gas.into_iter().map(MoneyPerEnergy).collect(),
                co2: co2.into_iter().map(MoneyPerMass).collect(),
            },
        });
    }

    Ok(scenarios)
}
