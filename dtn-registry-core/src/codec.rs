//! # Wire Formats
//!
//! The registration service and its client never touch bytes themselves. They ask a
//! [`WireFormat`] for the `tonic::codec::Codec` to use on each side of the call, so the
//! encoding can be swapped without changing either of them.
//!
//! Two formats are provided:
//!
//! * **[`Protobuf`]** (default): the standard protobuf encoding through `tonic-prost`.
//!   This is wire compatible with any stub generated from `dtn_communication.proto`.
//! * **[`Json`]**: the same records serialized with `serde_json`, using the proto3 JSON
//!   field names. Both peers must agree on it.
//!
//! Decoding failures are reported as a [`Status`] and never produce a partially
//! populated message.
use crate::schema::{ConnectionData, ResponseStatus};
use bytes::{Buf, BufMut};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};
use tonic_prost::ProstCodec;

/// Selects the codecs used on both ends of `registerAdapter`.
pub trait WireFormat: Send + Sync + 'static {
    /// Human readable name, used in logs.
    const NAME: &'static str;

    /// Decodes requests and encodes responses.
    type ServerCodec: Codec<Encode = ResponseStatus, Decode = ConnectionData> + Send + 'static;
    /// Encodes requests and decodes responses.
    type ClientCodec: Codec<Encode = ConnectionData, Decode = ResponseStatus> + Send + 'static;

    fn server_codec() -> Self::ServerCodec;
    fn client_codec() -> Self::ClientCodec;
}

/// Protobuf binary encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Protobuf;

impl WireFormat for Protobuf {
    const NAME: &'static str = "protobuf";

    type ServerCodec = ProstCodec<ResponseStatus, ConnectionData>;
    type ClientCodec = ProstCodec<ConnectionData, ResponseStatus>;

    fn server_codec() -> Self::ServerCodec {
        ProstCodec::default()
    }

    fn client_codec() -> Self::ClientCodec {
        ProstCodec::default()
    }
}

/// JSON encoding of the same records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl WireFormat for Json {
    const NAME: &'static str = "json";

    type ServerCodec = JsonCodec<ResponseStatus, ConnectionData>;
    type ClientCodec = JsonCodec<ConnectionData, ResponseStatus>;

    fn server_codec() -> Self::ServerCodec {
        JsonCodec::default()
    }

    fn client_codec() -> Self::ClientCodec {
        JsonCodec::default()
    }
}

/// A `tonic` codec that carries `serde` types as JSON documents.
///
/// `E` is the type written to the wire, `D` the type read from it.
pub struct JsonCodec<E, D> {
    _marker: PhantomData<fn(E) -> D>,
}

impl<E, D> Default for JsonCodec<E, D> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, D> Codec for JsonCodec<E, D>
where
    E: Serialize + Send + 'static,
    D: DeserializeOwned + Send + 'static,
{
    type Encode = E;
    type Decode = D;

    type Encoder = JsonEncoder<E>;
    type Decoder = JsonDecoder<D>;

    fn encoder(&mut self) -> Self::Encoder {
        JsonEncoder(PhantomData)
    }

    fn decoder(&mut self) -> Self::Decoder {
        JsonDecoder(PhantomData)
    }
}

/// Serializes a message into JSON bytes.
pub struct JsonEncoder<E>(PhantomData<fn(E)>);

impl<E: Serialize> Encoder for JsonEncoder<E> {
    type Item = E;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        let bytes = serde_json::to_vec(&item)
            .map_err(|e| Status::internal(format!("Failed to encode message as JSON: {}", e)))?;

        dst.put_slice(&bytes);
        Ok(())
    }
}

/// Parses JSON bytes into a message.
pub struct JsonDecoder<D>(PhantomData<fn() -> D>);

impl<D: DeserializeOwned> Decoder for JsonDecoder<D> {
    type Item = D;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let bytes = src.copy_to_bytes(src.remaining());

        let item = serde_json::from_slice(&bytes)
            .map_err(|e| Status::internal(format!("Failed to decode JSON message: {}", e)))?;

        Ok(Some(item))
    }
}
