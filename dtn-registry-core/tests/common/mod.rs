#![allow(dead_code)]

use dtn_registry_core::{
    client::RegistrationClient,
    codec::WireFormat,
    schema::{ConnectionData, ResponseStatus},
    server::{DtnCommunicationServer, RegistrationServer, ServerConfig},
    service::{DtnCommunication, RegistrationService},
};
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{sync::oneshot, task::JoinHandle};
use tonic::{Request, Response, Status};

/// A handler that was never given a real implementation.
pub struct UnimplementedService;

#[tonic::async_trait]
impl DtnCommunication for UnimplementedService {
    async fn register_adapter(
        &self,
        _request: Request<ConnectionData>,
    ) -> Result<Response<ResponseStatus>, Status> {
        Err(Status::unimplemented("Method not implemented!"))
    }
}

/// Acknowledges like [`RegistrationService`] after a fixed delay.
pub struct SlowService(pub Duration);

#[tonic::async_trait]
impl DtnCommunication for SlowService {
    async fn register_adapter(
        &self,
        request: Request<ConnectionData>,
    ) -> Result<Response<ResponseStatus>, Status> {
        tokio::time::sleep(self.0).await;
        RegistrationService.register_adapter(request).await
    }
}

/// Records the highest number of handler calls observed running at once.
#[derive(Clone, Default)]
pub struct CountingService {
    pub running: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

#[tonic::async_trait]
impl DtnCommunication for CountingService {
    async fn register_adapter(
        &self,
        request: Request<ConnectionData>,
    ) -> Result<Response<ResponseStatus>, Status> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(100)).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        RegistrationService.register_adapter(request).await
    }
}

/// A client whose transport is the dispatcher itself, no network involved.
pub fn in_process_client<T, W>(
    service: T,
) -> RegistrationClient<DtnCommunicationServer<T, W>, W>
where
    T: DtnCommunication,
    W: WireFormat,
{
    RegistrationClient::new(DtnCommunicationServer::<T, W>::new(service, 10)).with_wire_format::<W>()
}

pub struct RunningServer {
    pub url: String,
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), dtn_registry_core::server::ServerError>>,
}

impl RunningServer {
    /// Triggers shutdown and waits until every in-flight call was drained.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap().unwrap();
    }
}

/// Serves `service` on a random local port.
pub async fn spawn_server<T: DtnCommunication>(service: T, workers: usize) -> RunningServer {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap(), workers);
    let server = RegistrationServer::bind(config, service).await.unwrap();
    let addr = server.local_addr();
    let (shutdown, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve_with_shutdown(async {
        let _ = rx.await;
    }));

    RunningServer {
        url: format!("http://{}", addr),
        addr,
        shutdown,
        handle,
    }
}
