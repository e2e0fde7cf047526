//! # Registration Client
//!
//! [`RegistrationClient`] is the typed stub adapters use to announce themselves to the
//! bundle server. It hides the transport and the [`WireFormat`] behind a single call,
//! [`RegistrationClient::register_adapter`].
//!
//! Each call is exactly one round trip. Nothing is retried and no response is made up
//! when the call fails: every failure reaches the caller as a [`RegistrationError`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use dtn_registry_core::{client::RegistrationClient, schema::ConnectionData};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = RegistrationClient::connect("http://localhost:50051").await?;
//!
//! let status = client
//!     .register_adapter(ConnectionData::new("echo", "http://adapter:7778"))
//!     .await?;
//!
//! println!("{}", status.message);
//! # Ok(())
//! # }
//! ```
mod types;

pub use types::*;

use crate::{
    BoxError,
    codec::{Protobuf, WireFormat},
    schema::{ConnectionData, REGISTER_ADAPTER_PATH, ResponseStatus},
};
use http::uri::PathAndQuery;
use http_body::Body as HttpBody;
use std::{marker::PhantomData, time::Duration};
use tonic::{
    Code, Request,
    client::GrpcService,
    transport::{Channel, Endpoint},
};
use tracing::{Instrument, debug, debug_span, warn};

// Message attached by tonic's own deadline enforcement.
const TIMEOUT_EXPIRED: &str = "Timeout expired";

/// Every way a registration can fail.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidTarget(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
    #[error("Internal error, the client was not ready: '{0}'")]
    NotReady(#[source] BoxError),
    #[error("Call did not complete within {0:?}")]
    Timeout(Duration),
    #[error("registerAdapter failed with code {:?}: {}", .0.code(), .0.message())]
    Rpc(#[source] tonic::Status),
}

impl RegistrationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RegistrationError::Timeout(_))
    }

    /// The status returned by the server, if the call got that far.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            RegistrationError::Rpc(status) => Some(status),
            _ => None,
        }
    }
}

/// Client stub for `DTNCommunication`.
///
/// `S` is the underlying transport (a `tonic` [`Channel`] when connected over the network)
/// and `W` the [`WireFormat`].
pub struct RegistrationClient<S = Channel, W = Protobuf> {
    grpc: tonic::client::Grpc<S>,
    request_timeout: Option<Duration>,
    _wire: PhantomData<fn() -> W>,
}

impl<S: Clone, W> Clone for RegistrationClient<S, W> {
    fn clone(&self) -> Self {
        Self {
            grpc: self.grpc.clone(),
            request_timeout: self.request_timeout,
            _wire: PhantomData,
        }
    }
}

impl RegistrationClient<Channel, Protobuf> {
    /// Connects to `target` (e.g. `http://localhost:50051`) without any deadline.
    pub async fn connect(target: &str) -> Result<Self, RegistrationError> {
        Self::connect_with(ClientConfig::new(target)).await
    }

    /// Connects using the timeouts in `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(RegistrationClient)` - The connected client.
    /// * `Err(RegistrationError)` - If the URL is invalid or the connection fails.
    pub async fn connect_with(config: ClientConfig) -> Result<Self, RegistrationError> {
        let mut endpoint = Endpoint::new(config.target.clone())
            .map_err(|e| RegistrationError::InvalidTarget(config.target.clone(), e))?;

        if let Some(timeout) = config.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }

        debug!(server = %config.target, "Connecting to bundle server");

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| RegistrationError::ConnectionFailed(config.target.clone(), e))?;

        let client = Self::new(channel);
        Ok(match config.request_timeout {
            Some(timeout) => client.with_request_timeout(timeout),
            None => client,
        })
    }
}

impl<S> RegistrationClient<S, Protobuf> {
    /// Creates a client from an existing `tonic` service or channel.
    pub fn new(service: S) -> Self {
        Self {
            grpc: tonic::client::Grpc::new(service),
            request_timeout: None,
            _wire: PhantomData,
        }
    }
}

impl<S, W> RegistrationClient<S, W>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
    W: WireFormat,
{
    /// Switches the wire format. The server must use the same one.
    pub fn with_wire_format<F: WireFormat>(self) -> RegistrationClient<S, F> {
        RegistrationClient {
            grpc: self.grpc,
            request_timeout: self.request_timeout,
            _wire: PhantomData,
        }
    }

    /// Sets a deadline on every subsequent call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Registers an adapter with the bundle server.
    ///
    /// # Returns
    ///
    /// * `Ok(ResponseStatus)` - The server's acknowledgement.
    /// * `Err(RegistrationError)` - The call failed in transport, on the server or timed out.
    pub async fn register_adapter(
        &mut self,
        data: ConnectionData,
    ) -> Result<ResponseStatus, RegistrationError> {
        let span = debug_span!("register_adapter", app_name = %data.app_name);

        async move {
            debug!(state = %CallState::Created, "Call created");
            let result = self.round_trip(data).await;

            let state = match &result {
                Ok(_) => CallState::Completed,
                Err(e) => {
                    warn!("Registration failed: {}", e);
                    CallState::Failed
                }
            };
            debug!(%state, "Call finished");

            result
        }
        .instrument(span)
        .await
    }

    async fn round_trip(
        &mut self,
        data: ConnectionData,
    ) -> Result<ResponseStatus, RegistrationError> {
        self.grpc
            .ready()
            .await
            .map_err(|e| RegistrationError::NotReady(e.into()))?;

        let mut request = Request::new(data);
        if let Some(timeout) = self.request_timeout {
            request.set_timeout(timeout);
        }

        debug!(state = %CallState::Sent, "Request sent");

        let call = self.grpc.unary(
            request,
            PathAndQuery::from_static(REGISTER_ADAPTER_PATH),
            W::client_codec(),
        );

        let response = match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| RegistrationError::Timeout(timeout))?,
            None => call.await,
        };

        response
            .map(tonic::Response::into_inner)
            .map_err(|status| self.classify(status))
    }

    fn classify(&self, status: tonic::Status) -> RegistrationError {
        let expired = status.code() == Code::DeadlineExceeded
            || (status.code() == Code::Cancelled && status.message() == TIMEOUT_EXPIRED);

        match self.request_timeout {
            Some(timeout) if expired => RegistrationError::Timeout(timeout),
            _ => RegistrationError::Rpc(status),
        }
    }
}
