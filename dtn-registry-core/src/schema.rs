//! # Wire Schema
//!
//! The two fixed-shape records exchanged by the registration call, together with the
//! names that make up the gRPC route.
//!
//! The structs are derived with `prost` directly instead of being generated at build time,
//! so the crate builds without `protoc`. `proto/dtn_communication.proto` is the IDL they
//! must stay in sync with. They also derive `serde` so they can travel over the
//! [`crate::codec::Json`] wire format, using the proto3 JSON field names (`appName`).
//!
//! Every schema revision lives in its own module. The current revision is re-exported at
//! the root of this module.
pub use v1::*;

/// Revision of the record layout defined in [`v1`].
pub const SCHEMA_VERSION: u32 = 1;

/// Name under which the service is exposed. The IDL has no package, so this is also
/// the fully qualified name.
pub const SERVICE_NAME: &str = "DTNCommunication";

/// The only method of the service.
pub const REGISTER_ADAPTER_METHOD: &str = "registerAdapter";

/// HTTP/2 path of `registerAdapter`.
pub const REGISTER_ADAPTER_PATH: &str = "/DTNCommunication/registerAdapter";

pub mod v1 {
    use serde::{Deserialize, Serialize};

    /// Identifying information an adapter sends when it registers.
    #[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct ConnectionData {
        /// Short identifier of the adapter. Opaque to the server, may be empty.
        #[prost(string, tag = "1")]
        pub app_name: String,
        /// Callback address of the adapter.
        #[prost(string, tag = "2")]
        pub url: String,
    }

    impl ConnectionData {
        pub fn new(app_name: impl Into<String>, url: impl Into<String>) -> Self {
            Self {
                app_name: app_name.into(),
                url: url.into(),
            }
        }
    }

    /// Acknowledgement returned for a registration.
    #[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct ResponseStatus {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    impl ResponseStatus {
        pub fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn path_is_built_from_service_and_method() {
        assert_eq!(
            REGISTER_ADAPTER_PATH,
            format!("/{SERVICE_NAME}/{REGISTER_ADAPTER_METHOD}")
        );
    }

    #[test]
    fn connection_data_uses_proto_field_tags() {
        let bytes = ConnectionData::new("echo", "http://adapter:7778").encode_to_vec();

        // field 1, length-delimited, "echo"
        assert_eq!(&bytes[..6], &[0x0a, 4, b'e', b'c', b'h', b'o']);
        // field 2 follows
        assert_eq!(bytes[6], 0x12);
    }

    #[test]
    fn json_uses_camel_case_names() {
        let value = serde_json::to_value(ConnectionData::new("k9", "x")).unwrap();

        assert_eq!(value, serde_json::json!({ "appName": "k9", "url": "x" }));
    }

    #[test]
    fn missing_json_fields_default_to_empty() {
        let data: ConnectionData = serde_json::from_str(r#"{ "url": "x" }"#).unwrap();

        assert_eq!(data, ConnectionData::new("", "x"));
    }
}
