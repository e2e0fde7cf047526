//! # CLI
//!
//! This module defines the command-line interface of `dtn-registry` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring the
//! worker concurrency is positive).
use crate::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(
    name = "dtn-registry",
    version,
    about = "DTN adapter registration server and client"
)]
pub struct Cli {
    /// Log filter (e.g. info, dtn_registry_core=debug). RUST_LOG takes precedence
    #[arg(long, global = true, env = "DTN_REGISTRY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bundle server's registration endpoint
    ///
    /// Listens until interrupted (Ctrl-C or SIGTERM), then drains in-flight calls.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// dtn-registry serve --listen-address 0.0.0.0:50051 --worker-concurrency 10
    /// ```
    Serve {
        /// Path to a TOML configuration file
        #[arg(short, long, env = "DTN_REGISTRY_CONFIG")]
        config: Option<PathBuf>,

        /// Address to bind (default 0.0.0.0:50051)
        #[arg(long, env = "DTN_REGISTRY_LISTEN_ADDRESS")]
        listen_address: Option<SocketAddr>,

        /// Maximum number of registrations handled at once (default 10)
        #[arg(long, env = "DTN_REGISTRY_WORKER_CONCURRENCY", value_parser = parse_concurrency)]
        worker_concurrency: Option<usize>,

        #[arg(long, value_enum, default_value_t = WireFormatArg::Protobuf)]
        wire_format: WireFormatArg,
    },

    /// Register an adapter with a bundle server
    ///
    /// Prints the server's acknowledgement, or the error, to standard output.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// dtn-registry register http://localhost:50051 --app-name echo --url http://adapter:7778
    /// ```
    Register {
        /// The bundle server URL (e.g. http://localhost:50051)
        target: String,

        /// Identifier of the registering adapter
        #[arg(long)]
        app_name: String,

        /// Callback address of the registering adapter
        #[arg(long)]
        url: String,

        /// Deadline of the call in milliseconds
        #[arg(long = "timeout-ms", value_parser = parse_millis)]
        timeout: Option<Duration>,

        /// Deadline for establishing the connection in milliseconds
        #[arg(long = "connect-timeout-ms", value_parser = parse_millis)]
        connect_timeout: Option<Duration>,

        #[arg(long, value_enum, default_value_t = WireFormatArg::Protobuf)]
        wire_format: WireFormatArg,
    },
}

/// Encoding used on the wire. Both peers must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WireFormatArg {
    Protobuf,
    Json,
}

fn parse_concurrency(value: &str) -> Result<usize, String> {
    let n: usize = value
        .parse()
        .map_err(|e| format!("Invalid number '{value}': {e}"))?;

    if n == 0 {
        return Err("Worker concurrency must be at least 1".to_string());
    }

    Ok(n)
}

fn parse_millis(value: &str) -> Result<Duration, String> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("Invalid milliseconds '{value}': {e}"))
}
