//! # Payload Codec Seam
//!
//! Typed values cross the container boundary through a [`PayloadCodec`].
//! Codec failures never abort dispatch; they become in-band
//! [`RpcError::Decoding`] / [`RpcError::Encoding`] values carrying the
//! target type name and the codec's reason.

use crate::error::{CodecFailure, RpcError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Encodes and decodes typed payloads to and from container values.
pub trait PayloadCodec: Send + Sync {
    /// Encodes a value into its container representation.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encoding`] with the type name and the codec's
    /// reason.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Value, RpcError>;

    /// Decodes a container value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Decoding`] with the type name and the codec's
    /// reason, including the offending field where the codec knows it.
    fn decode<T: DeserializeOwned>(&self, value: &Value) -> Result<T, RpcError>;
}

/// The default codec: `serde_json` value-level conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Value, RpcError> {
        serde_json::to_value(value)
            .map_err(|e| RpcError::Encoding(CodecFailure::new::<T>(e.to_string())))
    }

    fn decode<T: DeserializeOwned>(&self, value: &Value) -> Result<T, RpcError> {
        serde_json::from_value(value.clone())
            .map_err(|e| RpcError::Decoding(CodecFailure::new::<T>(e.to_string())))
    }
}
