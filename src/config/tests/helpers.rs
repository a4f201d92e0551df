//! Shared fixtures and helper functions for config tests.

use crate::config::AppConfig;
use ortho_config::MergeComposer;
use rstest::fixture;
use std::sync::Arc;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "unix:///run/podman/podman.sock"

        [booking]
        base_url = "https://booking.example.test"
        region = "stockholm"
        service_group_id = 7
        service_category_id = 3
        number_of_people = 2
        search_hour = 10
        timeout_secs = 5

        [output]
        snapshot_dir = "/var/tmp/passtider"
        save_snapshots = false

        [image]
        tag = "ghcr.io/example/passtider:1.0"
        user = "booker"
        uid = 2000
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        [booking]
        region = "skane"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(
        config.engine_socket.is_none(),
        "engine_socket should be None"
    );
    assert_eq!(config.booking.base_url, "https://bokapass.nemoq.se");
    assert_eq!(config.booking.region, "vasternorrland");
    assert_eq!(config.booking.service_group_id, 14);
    assert_eq!(config.booking.service_category_id, 2);
    assert_eq!(config.booking.number_of_people, 1);
    assert_eq!(config.booking.search_hour, 8);
    assert_eq!(config.output.snapshot_dir.as_str(), ".");
    assert!(config.output.save_snapshots, "snapshots should be saved");
    assert_eq!(config.image.tag, "passtider:latest");
    assert_eq!(config.image.user, "passtider");
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers for
/// layer precedence tests.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "engine_socket": "unix:///from/file.sock",
            "booking": { "region": "uppsala", "search_hour": 9 }
        }),
        None,
    );

    composer.push_environment(json!({
        "booking": { "region": "gotland" }
    }));

    Ok(composer)
}
