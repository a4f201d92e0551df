//! Configuration data types for passtider.

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest party the booking site accepts in a single reservation.
pub const MAX_PARTY_SIZE: u8 = 8;

/// Booking site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Scheme and host of the booking site, without a trailing path.
    pub base_url: String,

    /// Region slug used in the wizard URLs (for example `vasternorrland`).
    pub region: String,

    /// Service group posted by the "Boka ny tid" step.
    pub service_group_id: u32,

    /// Service category posted by the residency step (2 means "lives in Sweden").
    pub service_category_id: u32,

    /// Number of people the appointment is for.
    pub number_of_people: u8,

    /// Hour of day from which the first-available search starts.
    pub search_hour: u8,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://bokapass.nemoq.se"),
            region: String::from("vasternorrland"),
            service_group_id: 14,
            service_category_id: 2,
            number_of_people: 1,
            search_hour: 8,
            timeout_secs: 30,
        }
    }
}

impl BookingConfig {
    /// Validates the booking settings before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if reqwest::Url::parse(&self.base_url).is_err() {
            return Err(invalid("booking.base_url", "must be an absolute URL"));
        }
        if self.region.trim().is_empty() {
            return Err(invalid("booking.region", "must not be empty"));
        }
        if !(1..=MAX_PARTY_SIZE).contains(&self.number_of_people) {
            return Err(invalid(
                "booking.number_of_people",
                &format!("must be between 1 and {MAX_PARTY_SIZE}"),
            ));
        }
        if self.search_hour > 23 {
            return Err(invalid("booking.search_hour", "must be between 0 and 23"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("booking.timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// Returns the wizard start page URL.
    #[must_use]
    pub fn index_url(&self) -> String {
        format!(
            "{}/Booking/Booking/Index/{}",
            self.base_url.trim_end_matches('/'),
            self.region
        )
    }

    /// Returns the URL every wizard step posts to.
    #[must_use]
    pub fn next_url(&self) -> String {
        format!(
            "{}/Booking/Booking/Next/{}",
            self.base_url.trim_end_matches('/'),
            self.region
        )
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Output configuration for saved pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives `result.html` and `error.html`.
    pub snapshot_dir: Utf8PathBuf,

    /// Whether fetched pages are written to disk at all.
    pub save_snapshots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: Utf8PathBuf::from("."),
            save_snapshots: true,
        }
    }
}

/// Container image packaging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Tag applied to built images.
    pub tag: String,

    /// Toolchain image used by the build stage.
    pub builder_image: String,

    /// Minimal image used by the runtime stage.
    pub base_image: String,

    /// Application directory inside the image.
    pub app_dir: Utf8PathBuf,

    /// Restricted account that owns the files and runs the process.
    pub user: String,

    /// Numeric id of the restricted account.
    pub uid: u32,

    /// Environment variable pointing the search path at the application directory.
    pub search_path_env: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            tag: String::from("passtider:latest"),
            builder_image: String::from("rust:1.88-slim-bookworm"),
            base_image: String::from("debian:bookworm-slim"),
            app_dir: Utf8PathBuf::from("/app"),
            user: String::from("passtider"),
            uid: 10001,
            search_path_env: String::from("XDG_CONFIG_HOME"),
        }
    }
}

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `PASSTIDER_CONFIG_PATH` environment variable
/// 2. `.passtider.toml` in the current working directory
/// 3. `.passtider.toml` in the home directory
/// 4. `~/.config/passtider/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "PASSTIDER",
    post_merge_hook,
    discovery(
        app_name = "passtider",
        env_var = "PASSTIDER_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".passtider.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// The container engine socket path or URL.
    pub engine_socket: Option<String>,

    /// Booking site configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub booking: BookingConfig,

    /// Snapshot output configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub output: OutputConfig,

    /// Container image configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub image: ImageConfig,
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Region slugs are lowercase in every wizard URL.
        self.booking.region = self.booking.region.trim().to_lowercase();
        Ok(())
    }
}
