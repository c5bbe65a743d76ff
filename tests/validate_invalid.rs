//! Integration test for the `validate` command with an inconsistent scenario.
use std::fs;
use tempfile::tempdir;
use thermal_dispatch::cli::handle_validate_command;
use thermal_dispatch::settings::Settings;

#[test]
fn test_handle_validate_command_length_mismatch() {
    unsafe { std::env::set_var("DISPATCH_LOG_LEVEL", "off") };

    // Scenario 2 has a shorter CO2 series than power and gas series
    let dir = tempdir().unwrap();
    let prices_file = dir.path().join("prices.csv");
    fs::write(
        &prices_file,
        "power_1,gas_1,co2_1,power_2,gas_2,co2_2\n50,20,30,50,20,30\n60,20,30,60,20,\n",
    )
    .unwrap();

    let err = handle_validate_command(&prices_file, None, Some(Settings::default())).unwrap_err();
    assert_eq!(err.to_string(), "Failed to validate scenarios.");
    assert_eq!(
        err.chain().nth(1).unwrap().to_string(),
        "1 of 2 scenarios failed: 2"
    );
}
