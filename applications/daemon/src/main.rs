/// Cadenza daemon - headless playback controller
use anyhow::Context;
use cadenza_daemon::{input, DaemonConfig, JsonLinesSession};
use cadenza_playback::{parse_eq_params, Command, PlaybackService};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadenzad")]
#[command(about = "Cadenza background playback controller", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENZA_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller, reading commands from stdin (default)
    Serve,
    /// Print the bands parsed from an EQ parameter file as JSON
    ParseEq {
        /// EQ parameter text file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries the session stream
    let default_filter = if cli.verbose {
        "cadenza_playback=debug,cadenza_daemon=debug"
    } else {
        "cadenza_playback=info,cadenza_daemon=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.config).await?,
        Commands::ParseEq { file } => parse_eq(&file)?,
    }

    Ok(())
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    // Load configuration
    let config =
        DaemonConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    config.validate()?;

    tracing::info!("Starting Cadenza daemon");
    tracing::info!("Library: {}", config.paths.library.display());
    tracing::info!("Snapshot: {}", config.paths.snapshot.display());

    let collaborators =
        cadenza_daemon::collaborators(&config, Box::new(JsonLinesSession::stdout()))
            .context("failed to set up playback collaborators")?;
    let (service, handle) = PlaybackService::new(collaborators, &config.player);
    let service_task = tokio::spawn(service.run());

    // Restore the previous session lazily
    handle.send(Command::SetMediaState)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    tracing::info!("stdin closed, shutting down");
                    break;
                };
                if input::dispatch_line(&handle, &line).is_err() {
                    tracing::warn!("Playback service is gone");
                    break;
                }
            }
            result = &mut interrupt => {
                result.context("failed to listen for Ctrl-C")?;
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    // The service persists a final snapshot while releasing
    if handle.shutdown().is_ok() {
        service_task
            .await
            .context("playback service task failed")?;
    }

    Ok(())
}

fn parse_eq(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let bands = parse_eq_params(&text);
    if bands.is_empty() {
        tracing::warn!("No filter records in {}", file.display());
    }
    println!("{}", serde_json::to_string_pretty(&bands)?);
    Ok(())
}
