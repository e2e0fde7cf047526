//! # Server Runtime
//!
//! Binds a [`DtnCommunication`] handler to a TCP listener and serves it over gRPC until
//! shut down.
//!
//! The runtime is built in two steps so that binding problems surface before anything is
//! served:
//!
//! 1. [`RegistrationServer::bind`] validates the [`ServerConfig`] and binds the listener.
//!    An occupied port or missing privileges are reported as [`ServerError::Bind`].
//! 2. [`RegistrationServer::serve`] (or [`RegistrationServer::serve_with_shutdown`])
//!    accepts calls until the process is signalled. On shutdown no new calls are
//!    accepted and the ones in flight are drained before returning.
//!
//! ```rust,no_run
//! use dtn_registry_core::{server::{RegistrationServer, ServerConfig}, service::RegistrationService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = RegistrationServer::bind(ServerConfig::default(), RegistrationService).await?;
//! server.serve().await?;
//! # Ok(())
//! # }
//! ```
pub mod dispatch;

pub use dispatch::DtnCommunicationServer;

use crate::{
    codec::{Protobuf, WireFormat},
    service::DtnCommunication,
};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    marker::PhantomData,
    net::{Ipv4Addr, SocketAddr},
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{error, info};

/// Port the bundle server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 50051;

/// Number of calls handled at the same time unless configured otherwise.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to bind '{address}': {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to read the listener's local address: {0}")]
    LocalAddr(#[source] std::io::Error),
    #[error("Transport failure while serving: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Settings of the server runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Endpoint to bind. Defaults to every interface on port 50051.
    pub listen_address: SocketAddr,
    /// Maximum number of `registerAdapter` calls executing at once.
    pub worker_concurrency: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
        }
    }
}

impl ServerConfig {
    pub fn new(listen_address: SocketAddr, worker_concurrency: usize) -> Self {
        Self {
            listen_address,
            worker_concurrency,
        }
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.worker_concurrency == 0 {
            return Err(ServerError::InvalidConfig(
                "worker_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A bound, not yet serving, registration server.
///
/// The generic parameter `W` selects the [`WireFormat`]; it is [`Protobuf`] unless changed
/// with [`RegistrationServer::with_wire_format`].
pub struct RegistrationServer<T, W = Protobuf> {
    config: ServerConfig,
    service: T,
    listener: TcpListener,
    local_addr: SocketAddr,
    _wire: PhantomData<fn() -> W>,
}

impl<T> RegistrationServer<T, Protobuf>
where
    T: DtnCommunication,
{
    /// Validates `config` and binds its listen address.
    ///
    /// # Returns
    ///
    /// * `Ok(RegistrationServer)` - The listener is bound and ready to serve.
    /// * `Err(ServerError)` - The configuration is invalid or the address can't be bound.
    pub async fn bind(config: ServerConfig, service: T) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = TcpListener::bind(config.listen_address)
            .await
            .map_err(|source| ServerError::Bind {
                address: config.listen_address,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        Ok(Self {
            config,
            service,
            listener,
            local_addr,
            _wire: PhantomData,
        })
    }
}

impl<T, W> RegistrationServer<T, W>
where
    T: DtnCommunication,
    W: WireFormat,
{
    /// Switches the wire format used for every call served by this server.
    pub fn with_wire_format<F: WireFormat>(self) -> RegistrationServer<T, F> {
        RegistrationServer {
            config: self.config,
            service: self.service,
            listener: self.listener,
            local_addr: self.local_addr,
            _wire: PhantomData,
        }
    }

    /// The address the listener is bound to. Useful when binding port `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until the process receives SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight calls.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let dispatcher =
            DtnCommunicationServer::<T, W>::new(self.service, self.config.worker_concurrency);

        info!(
            address = %self.local_addr,
            workers = self.config.worker_concurrency,
            wire_format = W::NAME,
            "Registration server listening"
        );

        Server::builder()
            .add_service(dispatcher)
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), signal)
            .await?;

        info!("Registration server stopped");
        Ok(())
    }
}

/// Resolves on the first SIGINT (Ctrl-C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight calls");
}
