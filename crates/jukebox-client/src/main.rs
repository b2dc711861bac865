//! jukebox CLI entry point.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use jukebox_client::cli::{Cli, Command};
use jukebox_client::config::ClientConfig;
use jukebox_client::error::ClientResult;
use jukebox_client::transport::SocketClient;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
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

async fn run(cli: Cli) -> ClientResult<()> {
    let config = ClientConfig::new(cli.server)
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_request_timeout(Duration::from_secs(cli.request_timeout));
    let download_dir = config.download_dir.clone();

    let client = SocketClient::new(config);
    client.connect().await?;

    match cli.command {
        Command::List => {
            let files = client.fetch_catalog().await?;
            for file in files {
                println!("{file}");
            }
        }
        Command::Fetch { filename, output } => {
            let dest = output.unwrap_or_else(|| download_dir.join(&filename));
            if let Some(parent) = dest.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }

            let mut last_percent = None;
            client
                .fetch_file_with_progress(&filename, &dest, |received, total| {
                    if total == 0 {
                        return;
                    }
                    let percent = received * 100 / total;
                    if last_percent != Some(percent) {
                        print!("\rdownloading {filename}: {percent}%");
                        let _ = std::io::stdout().flush();
                        last_percent = Some(percent);
                    }
                })
                .await?;
            if last_percent.is_some() {
                println!();
            }
            println!("saved to {}", dest.display());
        }
    }

    client.disconnect().await;
    Ok(())
}
