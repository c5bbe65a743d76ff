//! Profit-maximising unit commitment for a single gas-fired power plant.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod plant;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which program configuration files are stored
pub fn get_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config directory on this platform, so use the working directory
        return PathBuf::new();
    };
    config_dir.push("thermal_dispatch");

    config_dir
}
