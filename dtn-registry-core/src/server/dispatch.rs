//! # Call Dispatch
//!
//! [`DtnCommunicationServer`] is the `tower` service that `tonic`'s router hands every
//! HTTP/2 request for the `DTNCommunication` service to. It decodes the request with the
//! selected [`WireFormat`], waits for a worker permit and then runs the handler.
//!
//! Requests for any other method of the service are answered with `UNIMPLEMENTED`
//! without touching the handler.
use crate::{
    codec::{Protobuf, WireFormat},
    schema::{ConnectionData, REGISTER_ADAPTER_PATH, ResponseStatus, SERVICE_NAME},
    service::DtnCommunication,
};
use std::{
    convert::Infallible,
    marker::PhantomData,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::Semaphore;
use tonic::{
    Code, Status,
    codegen::{Body, BoxFuture, Service, StdError},
    server::{NamedService, UnaryService},
};
use tracing::{debug, warn};

/// Routes `registerAdapter` calls to a [`DtnCommunication`] handler.
pub struct DtnCommunicationServer<T, W = Protobuf> {
    inner: Arc<T>,
    workers: Arc<Semaphore>,
    _wire: PhantomData<fn() -> W>,
}

impl<T, W> DtnCommunicationServer<T, W> {
    /// Wraps `inner`, allowing at most `worker_concurrency` handler calls at once.
    ///
    /// A concurrency of `0` would block every call forever, so it is raised to `1`.
    /// [`crate::server::ServerConfig::validate`] rejects it before it gets here.
    pub fn new(inner: T, worker_concurrency: usize) -> Self {
        Self {
            inner: Arc::new(inner),
            workers: Arc::new(Semaphore::new(worker_concurrency.max(1))),
            _wire: PhantomData,
        }
    }
}

impl<T, W> Clone for DtnCommunicationServer<T, W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            workers: Arc::clone(&self.workers),
            _wire: PhantomData,
        }
    }
}

impl<T, W> NamedService for DtnCommunicationServer<T, W> {
    const NAME: &'static str = SERVICE_NAME;
}

impl<T, W, B> Service<http::Request<B>> for DtnCommunicationServer<T, W>
where
    T: DtnCommunication,
    W: WireFormat,
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::Body>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        if req.uri().path() != REGISTER_ADAPTER_PATH {
            let path = req.uri().path().to_string();
            warn!(%path, "Rejecting call to unknown method");

            let response: Self::Response =
                Status::unimplemented(format!("Method '{}' is not implemented", path)).into_http();
            return Box::pin(async move { Ok(response) });
        }

        let handler = RegisterAdapter {
            inner: Arc::clone(&self.inner),
            workers: Arc::clone(&self.workers),
        };

        Box::pin(async move {
            let mut grpc = tonic::server::Grpc::new(W::server_codec());
            let response = grpc.unary(handler, req).await;

            // Failed calls, including requests that could not be decoded, are answered
            // trailers-only, so the status is already in the headers.
            if let Some(status) = Status::from_header_map(response.headers()) {
                if status.code() != Code::Ok {
                    warn!(
                        code = ?status.code(),
                        reason = status.message(),
                        wire_format = W::NAME,
                        "registerAdapter call failed"
                    );
                }
            }

            Ok(response)
        })
    }
}

/// One `registerAdapter` invocation, bound to the shared handler and worker pool.
struct RegisterAdapter<T> {
    inner: Arc<T>,
    workers: Arc<Semaphore>,
}

impl<T: DtnCommunication> UnaryService<ConnectionData> for RegisterAdapter<T> {
    type Response = ResponseStatus;
    type Future = BoxFuture<tonic::Response<Self::Response>, Status>;

    fn call(&mut self, request: tonic::Request<ConnectionData>) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        let workers = Arc::clone(&self.workers);

        Box::pin(async move {
            // The pool is never closed, acquiring only waits.
            let _permit = Arc::clone(&workers)
                .acquire_owned()
                .await
                .map_err(|_| Status::internal("Worker pool closed"))?;

            debug!(available = workers.available_permits(), "Worker acquired");

            inner.register_adapter(request).await
        })
    }
}
