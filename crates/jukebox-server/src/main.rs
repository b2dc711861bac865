//! jukeboxd daemon entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use jukebox_server::{Server, ServerConfig, ServerResult, SignalHandler, scan_catalog};

/// jukeboxd - serve a directory of audio files over TCP
#[derive(Debug, Parser)]
#[command(name = "jukeboxd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:12345", env = "JUKEBOX_LISTEN")]
    listen: SocketAddr,

    /// Directory containing the served audio files (created if missing)
    #[arg(long, default_value = "music_files", env = "JUKEBOX_MUSIC_DIR")]
    music_dir: PathBuf,

    /// Seconds a silent session is kept open before it is closed
    #[arg(long, default_value = "30")]
    idle_timeout: u64,

    /// Maximum number of concurrent client connections
    #[arg(long, default_value = "100")]
    max_connections: usize,

    /// Enable debug output
    #[arg(long, short = 'v')]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    if !cli.music_dir.exists() {
        tokio::fs::create_dir_all(&cli.music_dir).await?;
        info!(dir = %cli.music_dir.display(), "Created music directory");
    }
    let catalog = scan_catalog(&cli.music_dir).await?;
    info!(
        dir = %cli.music_dir.display(),
        files = catalog.len(),
        "Serving music directory"
    );

    let config = ServerConfig::new(cli.listen)
        .with_music_dir(cli.music_dir)
        .with_idle_timeout(Duration::from_secs(cli.idle_timeout))
        .with_max_connections(cli.max_connections);
    let server = Server::bind(config).await?;

    let signals = SignalHandler::new();
    signals.spawn_listener();
    server.run_until_shutdown(signals.shutdown().wait()).await?;

    // Give closing sessions a moment to finish before the process exits.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.session_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    info!("Server stopped");
    Ok(())
}
