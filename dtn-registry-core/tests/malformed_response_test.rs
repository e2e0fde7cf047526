use bytes::Bytes;
use dtn_registry_core::{
    client::{RegistrationClient, RegistrationError},
    codec::Json,
    schema::{ConnectionData, ResponseStatus},
};
use http_body::Frame;
use std::{
    convert::Infallible,
    future::{Ready, ready},
    pin::Pin,
    task::{Context, Poll},
};
use tonic::{Code, codegen::Service};

/// Answers every call with one gRPC data frame carrying `payload` as the message.
#[derive(Clone)]
struct FixedFrameServer {
    payload: &'static [u8],
}

impl Service<http::Request<tonic::body::Body>> for FixedFrameServer {
    type Response = http::Response<SingleFrame>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: http::Request<tonic::body::Body>) -> Self::Future {
        // Uncompressed flag, big-endian length, then the message bytes.
        let mut frame = Vec::with_capacity(5 + self.payload.len());
        frame.push(0);
        frame.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(self.payload);

        let response = http::Response::builder()
            .header("content-type", "application/grpc")
            .body(SingleFrame(Some(Bytes::from(frame))))
            .unwrap();
        ready(Ok(response))
    }
}

struct SingleFrame(Option<Bytes>);

impl http_body::Body for SingleFrame {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.0.take().map(|data| Ok(Frame::data(data))))
    }
}

async fn register(payload: &'static [u8]) -> Result<ResponseStatus, RegistrationError> {
    let mut client = RegistrationClient::new(FixedFrameServer { payload });
    client
        .register_adapter(ConnectionData::new("test", "grpc://host:50051"))
        .await
}

fn assert_decode_failure(result: Result<ResponseStatus, RegistrationError>) {
    let err = result.expect_err("a malformed response must not produce a ResponseStatus");
    let status = err.status().expect("decode failures surface as an RPC status");
    assert_eq!(status.code(), Code::Internal);
}

#[tokio::test]
async fn test_invalid_utf8_message_is_an_error() {
    // Field 1 (message) with two bytes that are not UTF-8.
    let result = register(&[0x0a, 0x02, 0xff, 0xfe]).await;

    assert_decode_failure(result);
}

#[tokio::test]
async fn test_truncated_message_is_an_error() {
    // Field 1 claims five bytes but only one follows.
    let result = register(&[0x0a, 0x05, b'H']).await;

    assert_decode_failure(result);
}

#[tokio::test]
async fn test_malformed_json_response_is_an_error() {
    let mut client = RegistrationClient::new(FixedFrameServer {
        payload: b"{\"message\":",
    })
    .with_wire_format::<Json>();

    let result = client
        .register_adapter(ConnectionData::new("test", "grpc://host:50051"))
        .await;

    let err = result.expect_err("a malformed response must not produce a ResponseStatus");
    let status = err.status().unwrap();
    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("Failed to decode JSON message"));
}

#[tokio::test]
async fn test_wrongly_typed_json_field_is_an_error() {
    let mut client = RegistrationClient::new(FixedFrameServer {
        payload: b"{\"message\":42}",
    })
    .with_wire_format::<Json>();

    let result = client
        .register_adapter(ConnectionData::new("test", "grpc://host:50051"))
        .await;

    assert_decode_failure(result);
}
