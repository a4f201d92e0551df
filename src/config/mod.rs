//! Configuration system for passtider.
//!
//! This module provides the configuration structures and CLI definitions for the
//! passtider application. Configuration loading and precedence merging is handled
//! by the `ortho_config` crate. Precedence: CLI flags override environment
//! variables, which override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/passtider/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_socket = "unix:///run/user/1000/podman/podman.sock"
//!
//! [booking]
//! region = "stockholm"
//! number_of_people = 2
//! search_hour = 10
//!
//! [output]
//! snapshot_dir = "/var/tmp/passtider"
//! save_snapshots = true
//!
//! [image]
//! tag = "ghcr.io/example/passtider:latest"
//! user = "passtider"
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{
    BuildArgs, Cli, Commands, ImageCommand, ParseArgs, RenderArgs, SearchArgs, VerifyArgs,
};
pub use loader::{env_var_names, load_config};
pub use types::{AppConfig, BookingConfig, ImageConfig, MAX_PARTY_SIZE, OutputConfig};
