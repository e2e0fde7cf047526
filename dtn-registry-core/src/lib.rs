//! # DTN Registry Core
//!
//! `dtn-registry-core` implements the registration protocol spoken between DTN adapters
//! and the bundle server: an adapter sends its [`schema::ConnectionData`] through the
//! unary `DTNCommunication/registerAdapter` call and receives a [`schema::ResponseStatus`]
//! acknowledgement.
//!
//! ## Key Components
//!
//! * **[`schema`]:** The versioned request and response records.
//! * **[`codec`]:** The [`codec::WireFormat`] abstraction and its protobuf and JSON
//!   implementations.
//! * **[`service`]:** The [`service::DtnCommunication`] handler trait and the bundle
//!   server's [`service::RegistrationService`].
//! * **[`server`]:** The runtime that binds a handler to a TCP listener.
//! * **[`client`]:** The [`client::RegistrationClient`] stub used by adapters.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `tonic` to ensure that consumers use compatible
//! versions of these underlying dependencies.
pub mod client;
pub mod codec;
pub mod schema;
pub mod server;
pub mod service;

// Re-exports
pub use prost;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
