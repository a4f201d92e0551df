//! Integration tests for the `load_config()` public API.
//!
//! These tests drive `load_config()` from a parsed `Cli` through every layer
//! (defaults, file, environment, flags) to the final configuration values.


use std::io::Write;

use camino::Utf8PathBuf;
use passtider::config::{Cli, Commands, SearchArgs, load_config};
use serial_test::serial;
use tempfile::NamedTempFile;
use test_utils::{clear_passtider_env, set_env_var};

/// Helper: Creates a CLI struct for `search` with an optional config file.
const fn cli_with_config(config_path: Option<Utf8PathBuf>) -> Cli {
    Cli {
        command: Commands::Search(SearchArgs {
            from: None,
            no_snapshots: false,
        }),
        config: config_path,
        engine_socket: None,
        region: None,
        snapshot_dir: None,
    }
}

/// Helper: Creates a temporary config file with the given TOML content.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written to.
fn temp_config_file(content: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

fn utf8_path(file: &NamedTempFile) -> Utf8PathBuf {
    Utf8PathBuf::try_from(file.path().to_path_buf()).expect("path should be valid UTF-8")
}

#[test]
#[serial]
fn load_config_returns_defaults_when_no_sources_provided() {
    let _guard = clear_passtider_env();

    let config = load_config(&cli_with_config(None)).expect("defaults should load");

    assert!(config.engine_socket.is_none());
    assert_eq!(config.booking.region, "vasternorrland");
    assert_eq!(config.booking.number_of_people, 1);
    assert_eq!(config.booking.search_hour, 8);
    assert!(config.output.save_snapshots);
    assert_eq!(config.image.user, "passtider");
}

#[test]
#[serial]
fn load_config_loads_from_config_file() {
    let _guard = clear_passtider_env();

    let config_file = temp_config_file(
        r#"
        engine_socket = "unix:///from/config/file.sock"

        [booking]
        region = "stockholm"
        number_of_people = 3

        [output]
        save_snapshots = false
    "#,
    )
    .expect("failed to create temp config");

    let config = load_config(&cli_with_config(Some(utf8_path(&config_file))))
        .expect("load_config should succeed");

    assert_eq!(
        config.engine_socket.as_deref(),
        Some("unix:///from/config/file.sock")
    );
    assert_eq!(config.booking.region, "stockholm");
    assert_eq!(config.booking.number_of_people, 3);
    assert!(!config.output.save_snapshots);
    // Unset nested fields keep their defaults.
    assert_eq!(config.booking.search_hour, 8);
    assert_eq!(config.image.tag, "passtider:latest");
}

#[test]
#[serial]
fn load_config_environment_overrides_file_and_cli_overrides_both() {
    let guard = clear_passtider_env();

    let config_file = temp_config_file(
        r#"
        [booking]
        region = "skane"
        search_hour = 9
    "#,
    )
    .expect("failed to create temp config");
    set_env_var(&guard, "PASSTIDER_BOOKING_REGION", "uppsala");
    set_env_var(&guard, "PASSTIDER_BOOKING_SEARCH_HOUR", "12");

    let mut cli = cli_with_config(Some(utf8_path(&config_file)));
    cli.region = Some(String::from("gotland"));
    let config = load_config(&cli).expect("load_config should succeed");

    assert_eq!(config.booking.region, "gotland");
    assert_eq!(config.booking.search_hour, 12);
}

#[test]
#[serial]
fn load_config_normalises_region_slug() {
    let _guard = clear_passtider_env();

    let config_file = temp_config_file("[booking]\nregion = \"  Stockholm \"\n")
        .expect("failed to create temp config");

    let config = load_config(&cli_with_config(Some(utf8_path(&config_file))))
        .expect("load_config should succeed");

    assert_eq!(config.booking.region, "stockholm");
}

#[test]
#[serial]
fn load_config_handles_missing_config_file_gracefully() {
    let _guard = clear_passtider_env();

    let cli = cli_with_config(Some(Utf8PathBuf::from("/nonexistent/config.toml")));
    let config = load_config(&cli).expect("missing file should fall back to defaults");

    assert!(config.engine_socket.is_none());
}

#[test]
#[serial]
fn load_config_rejects_malformed_config_file() {
    let _guard = clear_passtider_env();

    let config_file =
        temp_config_file("this is not valid TOML {{{").expect("failed to create temp config");

    let result = load_config(&cli_with_config(Some(utf8_path(&config_file))));

    assert!(result.is_err(), "load_config should fail for malformed TOML");
}

#[test]
#[serial]
fn load_config_fails_on_invalid_bool_env_var() {
    let guard = clear_passtider_env();
    set_env_var(&guard, "PASSTIDER_OUTPUT_SAVE_SNAPSHOTS", "maybe");

    let err = load_config(&cli_with_config(None)).expect_err("invalid bool should fail");
    let message = err.to_string();

    assert!(
        message.contains("PASSTIDER_OUTPUT_SAVE_SNAPSHOTS"),
        "error should mention the env var: {message}"
    );
    assert!(
        message.contains("expected bool"),
        "error should explain expected type: {message}"
    );
}

#[test]
#[serial]
fn load_config_fails_on_invalid_integer_env_var() {
    let guard = clear_passtider_env();
    set_env_var(&guard, "PASSTIDER_BOOKING_NUMBER_OF_PEOPLE", "two");

    let err = load_config(&cli_with_config(None)).expect_err("invalid integer should fail");
    let message = err.to_string();

    assert!(
        message.contains("PASSTIDER_BOOKING_NUMBER_OF_PEOPLE"),
        "error should mention the env var: {message}"
    );
    assert!(
        message.contains("expected unsigned integer"),
        "error should explain expected type: {message}"
    );
}

#[test]
#[serial]
fn load_config_accepts_typed_env_vars() {
    let guard = clear_passtider_env();
    set_env_var(&guard, "PASSTIDER_OUTPUT_SAVE_SNAPSHOTS", "false");
    set_env_var(&guard, "PASSTIDER_BOOKING_TIMEOUT_SECS", "45");

    let config = load_config(&cli_with_config(None)).expect("typed values should load");

    assert!(!config.output.save_snapshots);
    assert_eq!(config.booking.timeout_secs, 45);
}
