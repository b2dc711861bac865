//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jukebox - list and download music from a jukebox server
#[derive(Debug, Parser)]
#[command(name = "jukebox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server address as host:port
    #[arg(long, default_value = "localhost:12345", env = "JUKEBOX_SERVER")]
    pub server: String,

    /// Seconds to wait for the connection to be established
    #[arg(long, default_value = "10")]
    pub connect_timeout: u64,

    /// Seconds to wait for each server response
    #[arg(long, default_value = "30")]
    pub request_timeout: u64,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the files available on the server
    List,
    /// Download a file from the server
    Fetch {
        /// Name of the file to download
        filename: String,

        /// Destination path (defaults to the download directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}
