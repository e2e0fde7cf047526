//! # DTN Registry CLI Entry Point
//!
//! One executable for both ends of the registration protocol:
//!
//! 1. **`serve`**: Loads the configuration, binds the listener and serves
//!    `DTNCommunication/registerAdapter` until the process is signalled.
//! 2. **`register`**: Connects to a bundle server, registers an adapter once and prints
//!    the acknowledgement or the error to standard output.

mod cli;
mod config;
mod formatter;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, WireFormatArg};
use config::FileConfig;
use dtn_registry_core::{
    client::{ClientConfig, RegistrationClient},
    codec::Json,
    schema::ConnectionData,
    server::{RegistrationServer, ServerConfig},
    service::RegistrationService,
};
use formatter::FormattedString;
use logging::{DEFAULT_LOG_LEVEL, init_logging};
use std::process;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Commands::Serve {
            config,
            listen_address,
            worker_concurrency,
            wire_format,
        } => {
            let file = match config {
                Some(path) => FileConfig::load(path)?,
                None => FileConfig::default(),
            };

            let level = args.log_level.unwrap_or_else(|| file.logging.level.clone());
            init_logging(&level, args.log_format.unwrap_or(file.logging.format))?;

            let server_config = file.server_config(listen_address, worker_concurrency);
            serve(server_config, wire_format).await
        }
        Commands::Register {
            target,
            app_name,
            url,
            timeout,
            connect_timeout,
            wire_format,
        } => {
            let level = args.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
            init_logging(level, args.log_format.unwrap_or_default())?;

            let config = ClientConfig {
                target,
                connect_timeout,
                request_timeout: timeout,
            };
            register(config, ConnectionData::new(app_name, url), wire_format).await;
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig, wire_format: WireFormatArg) -> Result<()> {
    info!(?config, ?wire_format, "Loaded configuration");

    let server = RegistrationServer::bind(config, RegistrationService)
        .await
        .context("Failed to start the registration server")?;

    match wire_format {
        WireFormatArg::Protobuf => server.serve().await?,
        WireFormatArg::Json => server.with_wire_format::<Json>().serve().await?,
    }

    Ok(())
}

async fn register(config: ClientConfig, data: ConnectionData, wire_format: WireFormatArg) {
    let result = match RegistrationClient::connect_with(config).await {
        Ok(mut client) => match wire_format {
            WireFormatArg::Protobuf => client.register_adapter(data).await,
            WireFormatArg::Json => {
                let mut client = client.with_wire_format::<Json>();
                client.register_adapter(data).await
            }
        },
        Err(err) => Err(err),
    };

    match result {
        Ok(status) => println!("{}", FormattedString::from(status)),
        Err(err) => {
            println!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}
