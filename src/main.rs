//! `passtider` application entry point.
//!
//! This binary searches the Swedish Police booking site for the first free
//! passport or ID card appointment and prints a short report. It uses `eyre`
//! for opaque error handling at the application boundary, converting
//! domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/passtider/config.toml` or path from `PASSTIDER_CONFIG_PATH`)
//! 3. Environment variables (`PASSTIDER_*`)
//! 4. Command-line arguments
//!
//! Logs go to standard error and are filtered with `RUST_LOG`; the report
//! itself is the only thing written to standard output.

use std::time::Instant;

use bollard::Docker;
use chrono::Local;
use clap::Parser;
use eyre::{Report, Result as EyreResult, WrapErr};
use mockable::DefaultEnv;
use passtider::booking::{BookingSession, HttpTransport, search_first_available};
use passtider::config::{
    AppConfig, BuildArgs, Cli, Commands, ImageCommand, ParseArgs, RenderArgs, SearchArgs,
    VerifyArgs, load_config,
};
use passtider::engine::{EngineConnector, SocketResolver};
use passtider::error::Result as PasstiderResult;
use passtider::image::{ImageRecipe, build_context, render_containerfile, write_containerfile};
use passtider::report::render_report;
use passtider::snapshot::{SnapshotStore, read_page};
use passtider::timetable::parse_timetable;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// Loads configuration with layered precedence via `OrthoConfig`, then runs
/// the subcommand on a Tokio runtime.
fn main() -> EyreResult<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(&cli).map_err(Report::from)?;

    let runtime = tokio::runtime::Runtime::new().wrap_err("failed to start async runtime")?;
    runtime.block_on(run(&cli, &config)).map_err(Report::from)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Execute the CLI command, returning domain-specific errors.
///
/// Keeps semantic errors inside the run loop so the CLI boundary owns
/// conversion to `eyre::Report`.
async fn run(cli: &Cli, config: &AppConfig) -> PasstiderResult<()> {
    match &cli.command {
        Commands::Search(args) => search(config, args).await,
        Commands::Parse(args) => parse_saved_page(args),
        Commands::Image(ImageCommand::Render(args)) => render_image(config, args),
        Commands::Image(ImageCommand::Build(args)) => build_image(config, args).await,
        Commands::Image(ImageCommand::Verify(args)) => verify_image(config, args).await,
    }
}

/// Walk the booking wizard and print the report for the resulting timetable.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
async fn search(config: &AppConfig, args: &SearchArgs) -> PasstiderResult<()> {
    config.booking.validate()?;

    let snapshots = if args.no_snapshots {
        SnapshotStore::disabled()
    } else {
        SnapshotStore::open(&config.output)?
    };
    snapshots.clear_error()?;

    let now = Local::now().naive_local();
    let from = args.from.unwrap_or_else(|| now.date());
    tracing::info!(region = %config.booking.region, %from, "searching for first available time");

    let started = Instant::now();
    let transport = HttpTransport::new(&config.booking)?;
    let session = BookingSession::new(transport, &config.booking, &snapshots);
    let page = search_first_available(&session, &config.booking, from).await?;

    if let Some(path) = snapshots.save_result(&page)? {
        tracing::info!(%path, "saved timetable page");
    }

    let timetable = parse_timetable(&page)?;
    print!("{}", render_report(&timetable, started.elapsed(), now));
    Ok(())
}

/// Summarise a previously saved timetable page.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn parse_saved_page(args: &ParseArgs) -> PasstiderResult<()> {
    let started = Instant::now();
    let page = read_page(&args.file)?;
    let timetable = parse_timetable(&page)?;
    print!(
        "{}",
        render_report(&timetable, started.elapsed(), Local::now().naive_local())
    );
    Ok(())
}

fn recipe_for(config: &AppConfig, tag: Option<&str>) -> PasstiderResult<ImageRecipe> {
    let base = ImageRecipe::from_config(&config.image);
    let recipe = match tag {
        Some(override_tag) => base.with_tag(override_tag),
        None => base,
    };
    recipe.validate()?;
    Ok(recipe)
}

/// Print the Containerfile, or write it to `--output`.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn render_image(config: &AppConfig, args: &RenderArgs) -> PasstiderResult<()> {
    let recipe = recipe_for(config, None)?;
    match &args.output {
        Some(path) => {
            write_containerfile(path, &recipe)?;
            tracing::info!(%path, "wrote Containerfile");
        }
        None => print!("{}", render_containerfile(&recipe)),
    }
    Ok(())
}

/// Connect to the configured engine, falling back to the environment.
async fn connect_engine(config: &AppConfig) -> PasstiderResult<Docker> {
    let env = DefaultEnv::new();
    let resolver = SocketResolver::new(&env);
    EngineConnector::connect_with_fallback_and_verify_async(
        config.engine_socket.as_deref(),
        &resolver,
    )
    .await
}

/// Build the image from the project directory, then verify it.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
async fn build_image(config: &AppConfig, args: &BuildArgs) -> PasstiderResult<()> {
    let recipe = recipe_for(config, args.tag.as_deref())?;
    let context = build_context(&args.context, &recipe)?;
    let docker = connect_engine(config).await?;

    EngineConnector::build_image_async(&docker, &recipe, context).await?;
    EngineConnector::verify_image_async(&docker, &recipe).await?;
    println!("built and verified {}", recipe.tag);
    Ok(())
}

/// Check an existing image against the recipe.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
async fn verify_image(config: &AppConfig, args: &VerifyArgs) -> PasstiderResult<()> {
    let recipe = recipe_for(config, args.tag.as_deref())?;
    let docker = connect_engine(config).await?;

    EngineConnector::verify_image_async(&docker, &recipe).await?;
    println!("{} matches its recipe", recipe.tag);
    Ok(())
}
