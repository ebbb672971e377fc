//! Value serialization for cache artifacts

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Failure to encode or decode a cached value
#[derive(Debug)]
pub struct CodecError(String);

impl CodecError {
    pub fn new(msg: impl Into<String>) -> Self {
        CodecError(msg.into())
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CodecError {}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError(err.to_string())
    }
}

/// Turns values into artifact bytes and back
pub trait Codec<V>: Send + Sync + 'static {
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError>;
}

/// JSON codec backed by `serde_json`
pub struct JsonCodec<V> {
    _value: PhantomData<fn() -> V>,
}

impl<V> JsonCodec<V> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<V> Default for JsonCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Codec<V> for JsonCodec<V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
