//! # Registration Service
//!
//! [`DtnCommunication`] is the server-side contract of the registration protocol. The
//! runtime in [`crate::server`] routes every `registerAdapter` call to an implementation
//! of it.
//!
//! [`RegistrationService`] is the bundle server's implementation: it acknowledges the
//! adapter by name and keeps no state between calls.
use crate::schema::{ConnectionData, ResponseStatus};
use tonic::{Request, Response, Status};
use tracing::info;

/// Handler for the `DTNCommunication` service.
///
/// Implementations are shared between every in-flight call and must not rely on being
/// invoked one at a time.
#[tonic::async_trait]
pub trait DtnCommunication: Send + Sync + 'static {
    async fn register_adapter(
        &self,
        request: Request<ConnectionData>,
    ) -> Result<Response<ResponseStatus>, Status>;
}

/// Acknowledges registrations with `"Hello " + appName`.
///
/// No adapter table is kept: a second registration with the same data produces the same
/// answer as the first one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationService;

impl RegistrationService {
    /// Builds the acknowledgement for a registration. `app_name` is copied verbatim.
    pub fn acknowledge(data: &ConnectionData) -> ResponseStatus {
        ResponseStatus::new(format!("Hello {}", data.app_name))
    }
}

#[tonic::async_trait]
impl DtnCommunication for RegistrationService {
    async fn register_adapter(
        &self,
        request: Request<ConnectionData>,
    ) -> Result<Response<ResponseStatus>, Status> {
        let peer = request
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "in-process".to_string());
        let data = request.into_inner();

        info!(app_name = %data.app_name, url = %data.url, %peer, "Adapter registration received");

        Ok(Response::new(Self::acknowledge(&data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_embeds_app_name() {
        let ack = RegistrationService::acknowledge(&ConnectionData::new("test", "grpc://host:50051"));
        assert_eq!(ack.message, "Hello test");
    }

    #[test]
    fn empty_app_name_is_accepted() {
        let ack = RegistrationService::acknowledge(&ConnectionData::new("", "x"));
        assert_eq!(ack.message, "Hello ");
    }

    #[test]
    fn app_name_is_not_normalised() {
        let name = "  K9 Mail/ädapter\t";
        let ack = RegistrationService::acknowledge(&ConnectionData::new(name, ""));
        assert_eq!(ack.message, format!("Hello {name}"));
    }

    #[tokio::test]
    async fn handler_ignores_url_and_answers_once() {
        let service = RegistrationService;

        let first = service
            .register_adapter(Request::new(ConnectionData::new("echo", "a")))
            .await
            .unwrap()
            .into_inner();
        let second = service
            .register_adapter(Request::new(ConnectionData::new("echo", "b")))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(first, second);
    }
}
