//! Command-line argument definitions for passtider.

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Command-line interface for passtider.
#[derive(Debug, Parser)]
#[command(name = "passtider")]
#[command(
    author,
    version,
    about = "Find the first available passport appointment at the Swedish Police"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine socket path or URL.
    #[arg(long, global = true)]
    pub engine_socket: Option<String>,

    /// Booking region slug, for example `stockholm`.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Directory for saved `result.html` and `error.html` pages.
    #[arg(long, global = true)]
    pub snapshot_dir: Option<Utf8PathBuf>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search the booking site for the first available appointment.
    Search(SearchArgs),

    /// Summarise a previously saved timetable page.
    Parse(ParseArgs),

    /// Render, build or verify the container image.
    #[command(subcommand)]
    Image(ImageCommand),
}

/// Arguments for the `search` subcommand.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// First date to search from (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Do not write fetched pages to disk.
    #[arg(long)]
    pub no_snapshots: bool,
}

/// Arguments for the `parse` subcommand.
#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// Saved timetable page to summarise.
    #[arg(required = true)]
    pub file: Utf8PathBuf,
}

/// Container image subcommands.
#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Print or write the Containerfile.
    Render(RenderArgs),

    /// Build the image through the container engine.
    Build(BuildArgs),

    /// Check a built image against its recipe.
    Verify(VerifyArgs),
}

/// Arguments for `image render`.
#[derive(Debug, Parser)]
pub struct RenderArgs {
    /// Write the Containerfile here instead of standard output.
    #[arg(long)]
    pub output: Option<Utf8PathBuf>,
}

/// Arguments for `image build`.
#[derive(Debug, Parser)]
pub struct BuildArgs {
    /// Project directory holding `Cargo.toml`, `Cargo.lock` and `src/`.
    #[arg(long, default_value = ".")]
    pub context: Utf8PathBuf,

    /// Override the configured image tag.
    #[arg(long)]
    pub tag: Option<String>,
}

/// Arguments for `image verify`.
#[derive(Debug, Parser)]
pub struct VerifyArgs {
    /// Override the configured image tag.
    #[arg(long)]
    pub tag: Option<String>,
}
