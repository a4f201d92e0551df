//! Configuration loading with layered precedence.
//!
//! This module provides functions to load configuration with the precedence order
//! (lowest to highest): application defaults, configuration file, environment
//! variables, command-line arguments.
//!
//! The loader drives `MergeComposer` by hand instead of `OrthoConfig::load()`
//! because the `Cli` struct owns subcommand dispatch, and because Figment's
//! environment layer silently ignores unparseable values. Here a typed variable
//! such as `PASSTIDER_BOOKING_SEARCH_HOUR=noon` fails fast with a clear error.
//!
//! String fields (e.g., `PASSTIDER_BOOKING_REGION`) are always accepted.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`). Invalid values return an error.
    Bool,
    /// Unsigned 64-bit integer. Invalid values return an error.
    U64,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    /// The environment variable name (e.g., `PASSTIDER_BOOKING_REGION`).
    env_var: &'static str,
    /// The JSON path segments (e.g., `["booking", "region"]`).
    path: &'static [&'static str],
    /// The expected value type.
    var_type: EnvVarType,
}

const fn spec(
    env_var: &'static str,
    path: &'static [&'static str],
    var_type: EnvVarType,
) -> EnvVarSpec {
    EnvVarSpec {
        env_var,
        path,
        var_type,
    }
}

/// Table of all environment variables and their JSON paths.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    spec(
        "PASSTIDER_ENGINE_SOCKET",
        &["engine_socket"],
        EnvVarType::String,
    ),
    // Booking fields
    spec(
        "PASSTIDER_BOOKING_BASE_URL",
        &["booking", "base_url"],
        EnvVarType::String,
    ),
    spec(
        "PASSTIDER_BOOKING_REGION",
        &["booking", "region"],
        EnvVarType::String,
    ),
    spec(
        "PASSTIDER_BOOKING_SERVICE_GROUP_ID",
        &["booking", "service_group_id"],
        EnvVarType::U64,
    ),
    spec(
        "PASSTIDER_BOOKING_SERVICE_CATEGORY_ID",
        &["booking", "service_category_id"],
        EnvVarType::U64,
    ),
    spec(
        "PASSTIDER_BOOKING_NUMBER_OF_PEOPLE",
        &["booking", "number_of_people"],
        EnvVarType::U64,
    ),
    spec(
        "PASSTIDER_BOOKING_SEARCH_HOUR",
        &["booking", "search_hour"],
        EnvVarType::U64,
    ),
    spec(
        "PASSTIDER_BOOKING_TIMEOUT_SECS",
        &["booking", "timeout_secs"],
        EnvVarType::U64,
    ),
    // Output fields
    spec(
        "PASSTIDER_OUTPUT_SNAPSHOT_DIR",
        &["output", "snapshot_dir"],
        EnvVarType::String,
    ),
    spec(
        "PASSTIDER_OUTPUT_SAVE_SNAPSHOTS",
        &["output", "save_snapshots"],
        EnvVarType::Bool,
    ),
    // Image fields
    spec("PASSTIDER_IMAGE_TAG", &["image", "tag"], EnvVarType::String),
    spec("PASSTIDER_IMAGE_USER", &["image", "user"], EnvVarType::String),
];

/// Returns the list of environment variable names recognised by the config loader.
///
/// Tests use this to clear every `PASSTIDER_*` variable without keeping a
/// second hard-coded list in sync.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|entry| entry.env_var).collect()
}

/// Load a configuration file and push it to the composer.
///
/// Uses `cap_std::fs_utf8` for capability-oriented filesystem access. The
/// function opens the parent directory of the config file and reads from there.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Load configuration with full layer precedence.
///
/// This function loads configuration from all available sources:
/// 1. Application defaults defined in the struct
/// 2. Configuration file (discovered via XDG paths or `PASSTIDER_CONFIG_PATH`)
/// 3. Environment variables prefixed with `PASSTIDER_`
/// 4. Command-line arguments (from the provided `Cli`)
///
/// Later sources override earlier ones.
///
/// # Errors
///
/// Returns `ConfigError` if configuration loading fails due to:
/// - Malformed configuration files
/// - Invalid typed environment variable values (e.g., non-numeric
///   `PASSTIDER_BOOKING_SEARCH_HOUR`)
/// - Values that do not fit their field types after merging
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    // Use the CLI-provided path (if it exists), or discover via XDG paths.
    let config_path: Option<Utf8PathBuf> =
        cli.config.clone().filter(|p| p.exists()).or_else(|| {
            let discovery = ConfigDiscovery::builder("passtider")
                .env_var("PASSTIDER_CONFIG_PATH")
                .config_file_name("config.toml")
                .dotfile_name(".passtider.toml")
                .build();
            discovery
                .candidates()
                .into_iter()
                .filter(|p| p.exists())
                .find_map(|p| Utf8PathBuf::try_from(p).ok())
        });

    if let Some(ref path) = config_path {
        tracing::debug!(%path, "loading configuration file");
        load_config_file(path, &mut composer)?;
    }

    let env_values = collect_env_vars()?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;

    Ok(config)
}

/// Collect environment variables with the `PASSTIDER_` prefix into a JSON value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a typed environment variable (bool, u64)
/// has an unparseable value.
fn collect_env_vars() -> Result<Value> {
    let mut root = Map::new();

    for entry in ENV_VAR_SPECS {
        let Ok(raw_value) = std::env::var(entry.env_var) else {
            continue;
        };

        let json_value = parse_env_value(entry, raw_value)?;
        insert_at_path(&mut root, entry.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

fn parse_env_value(entry: &EnvVarSpec, raw_value: String) -> Result<Value> {
    match entry.var_type {
        EnvVarType::String => Ok(Value::String(raw_value)),
        EnvVarType::Bool => raw_value.parse::<bool>().map(Value::Bool).map_err(|_| {
            ConfigError::InvalidValue {
                field: entry.env_var.to_owned(),
                reason: format!("expected bool (true/false), got '{raw_value}'"),
            }
            .into()
        }),
        EnvVarType::U64 => raw_value
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| {
                ConfigError::InvalidValue {
                    field: entry.env_var.to_owned(),
                    reason: format!("expected unsigned integer, got '{raw_value}'"),
                }
                .into()
            }),
    }
}

/// Insert a value at a nested path in a JSON map.
///
/// For a path like `["booking", "region"]`, this creates the intermediate
/// `booking` object if needed and inserts `region` within it.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(ref socket) = cli.engine_socket {
        overrides.insert(String::from("engine_socket"), Value::String(socket.clone()));
    }

    if let Some(ref region) = cli.region {
        insert_at_path(
            &mut overrides,
            &["booking", "region"],
            Value::String(region.clone()),
        );
    }

    if let Some(ref dir) = cli.snapshot_dir {
        insert_at_path(
            &mut overrides,
            &["output", "snapshot_dir"],
            Value::String(dir.to_string()),
        );
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
