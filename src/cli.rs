//! The command line interface for the dispatch optimiser.
use crate::id::ScenarioID;
use crate::input::read_scenarios;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::plant::PlantParameters;
use crate::scenario::Scenario;
use crate::settings::Settings;
use crate::simulation::{run, validate_scenarios};
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the dispatch optimiser.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// TOML file with plant parameters (defaults are used for anything not given)
    #[arg(long)]
    pub plant: Option<PathBuf>,
    /// Solver time limit per scenario, in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Relative optimality gap at which the solver may stop
    #[arg(long)]
    pub relative_gap: Option<f64>,
    /// Only run the given scenario (may be repeated)
    #[arg(long = "scenario", value_name = "ID")]
    pub scenarios: Vec<String>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Optimise the plant's dispatch for each price scenario.
    Run {
        /// Path to the CSV file of hourly prices.
        prices_file: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate input files without solving.
    Validate {
        /// Path to the CSV file of hourly prices.
        prices_file: PathBuf,
        /// TOML file with plant parameters
        #[arg(long)]
        plant: Option<PathBuf>,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { prices_file, opts } => handle_run_command(&prices_file, &opts, None),
            Self::Validate { prices_file, plant } => {
                handle_validate_command(&prices_file, plant.as_deref(), None)
            }
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ thermal-dispatch --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    prices_file: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let mut settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // These settings can be overridden by command-line arguments
    if opts.overwrite {
        settings.overwrite = true;
    }
    if let Some(time_limit) = opts.time_limit {
        settings.time_limit = time_limit;
    }
    if let Some(relative_gap) = opts.relative_gap {
        settings.relative_gap = relative_gap;
    }
    let options = settings.solver_options();
    options.validate().context("Invalid solver options.")?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(prices_file)?;
        &pathbuf
    };

    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(&settings.log_level, Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let (plant, scenarios) = load_inputs(prices_file, opts.plant.as_deref())?;
    let scenarios = select_scenarios(scenarios, &opts.scenarios)?;
    info!(
        "Loaded {} scenario(s) from {}",
        scenarios.len(),
        prices_file.display()
    );
    info!("Output folder: {}", output_path.display());

    run(&scenarios, &plant, &options, output_path)?;
    info!("Simulation complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(
    prices_file: &Path,
    plant_file: Option<&Path>,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let (plant, scenarios) = load_inputs(prices_file, plant_file)?;
    validate_scenarios(&scenarios, &plant).context("Failed to validate scenarios.")?;
    info!("Validation of {} scenario(s) successful!", scenarios.len());

    Ok(())
}

/// Load the plant parameters and price scenarios
fn load_inputs(
    prices_file: &Path,
    plant_file: Option<&Path>,
) -> Result<(PlantParameters, Vec<Scenario>)> {
    let plant = match plant_file {
        Some(path) => {
            let plant = PlantParameters::from_path(path)
                .context("Failed to load plant parameters.")?;
            info!("Loaded plant parameters from {}", path.display());
            plant
        }
        None => PlantParameters::default(),
    };

    let scenarios = read_scenarios(prices_file).context("Failed to load prices.")?;

    Ok((plant, scenarios))
}

/// Keep only the scenarios with the given IDs, or all of them if no IDs are given
fn select_scenarios(scenarios: Vec<Scenario>, ids: &[String]) -> Result<Vec<Scenario>> {
    if ids.is_empty() {
        return Ok(scenarios);
    }

    let ids: Vec<ScenarioID> = ids.iter().map(|id| ScenarioID::from(id.as_str())).collect();
    let unknown = ids
        .iter()
        .filter(|id| !scenarios.iter().any(|scenario| &scenario.id == *id))
        .join(", ");
    ensure!(unknown.is_empty(), "Unknown scenario(s): {unknown}");

    Ok(scenarios
        .into_iter()
        .filter(|scenario| ids.contains(&scenario.id))
        .collect())
}
