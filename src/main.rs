//! Subhunter - Subtitle acquisition for media libraries
//!
//! Command-line entry point: lists items missing the target subtitle and
//! processes individual items.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subhunter::cli::{Args, Commands};
use subhunter::config::Config;
use subhunter::discovery::{group_candidates, season_label};
use subhunter::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = setup_logging(args.verbose)?;

    match args.command {
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::List => {
            let workflow = load_workflow(args.config.as_deref())?;
            let candidates = workflow.list_candidates().await?;
            let listing = group_candidates(candidates);

            for (series, seasons) in &listing.series {
                println!("\n{}", series);
                for (season, episodes) in seasons {
                    println!("  {}", season_label(*season, episodes));
                    for episode in episodes {
                        println!(
                            "    {:>3}. {:<50} [{}]",
                            episode.episode_number.unwrap_or(0),
                            episode.name,
                            episode.id
                        );
                    }
                }
            }

            if !listing.movies.is_empty() {
                println!("\nMovies");
                for movie in &listing.movies {
                    println!("    {:<55} [{}]", movie.name, movie.id);
                }
            }
        }
        Commands::Process { item } => {
            let workflow = load_workflow(args.config.as_deref())?;
            match workflow.process(&item).await {
                Ok(outcome) => {
                    println!("{}", outcome.message(workflow.staging_dir()));
                    println!("{}", outcome.saved_path.display());
                }
                Err(e) => {
                    eprintln!("{}", serde_json::to_string(&e.report())?);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

/// Load configuration and build the workflow with its HTTP clients
fn load_workflow(config_path: Option<&Path>) -> Result<Workflow> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => {
            // Try config.toml from the current directory first
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env_overrides();
    config.validate()?;

    info!("Catalog URL: {}", config.catalog.url);
    Ok(Workflow::from_config(config)?)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subhunter").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard flushes the writer on drop
    let file_appender = rolling::daily(&log_dir, "subhunter.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subhunter.log").display());

    Ok(guard)
}
