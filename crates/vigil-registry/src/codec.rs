//! Artifact codecs.
//!
//! The registry never looks inside a trained artifact; a codec turns it
//! into bytes and back.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RegistryError, RegistryResult};

/// Turns artifacts into bytes and back.
pub trait ArtifactCodec: Send + Sync {
    type Artifact;

    fn encode(&self, artifact: &Self::Artifact) -> RegistryResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> RegistryResult<Self::Artifact>;

    /// File extension of stored artifacts.
    fn extension(&self) -> &str {
        "bin"
    }
}

/// Stores any serde-serialisable artifact as JSON.
pub struct JsonCodec<T> {
    _artifact: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// A codec for `T`.
    pub fn new() -> Self {
        Self {
            _artifact: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArtifactCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Artifact = T;

    fn encode(&self, artifact: &T) -> RegistryResult<Vec<u8>> {
        serde_json::to_vec_pretty(artifact).map_err(|e| RegistryError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> RegistryResult<T> {
        serde_json::from_slice(bytes).map_err(|e| RegistryError::Codec(e.to_string()))
    }

    fn extension(&self) -> &str {
        "json"
    }
}

/// Passes already-serialised artifacts through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesCodec;

impl ArtifactCodec for BytesCodec {
    type Artifact = Vec<u8>;

    fn encode(&self, artifact: &Vec<u8>) -> RegistryResult<Vec<u8>> {
        Ok(artifact.clone())
    }

    fn decode(&self, bytes: &[u8]) -> RegistryResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stump {
        feature: String,
        split: f64,
    }

    #[test]
    fn json_codec_roundtrip() {
        let codec = JsonCodec::<Stump>::new();
        let stump = Stump {
            feature: "temperature".into(),
            split: 0.1 + 0.2,
        };
        let bytes = codec.encode(&stump).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), stump);
        assert_eq!(codec.extension(), "json");
    }

    #[test]
    fn json_codec_reports_garbage() {
        let codec = JsonCodec::<Stump>::new();
        assert!(matches!(codec.decode(b"not json"), Err(RegistryError::Codec(_))));
    }

    #[test]
    fn bytes_codec_is_identity() {
        let bytes = vec![0u8, 159, 146, 150];
        assert_eq!(BytesCodec.decode(&BytesCodec.encode(&bytes).unwrap()).unwrap(), bytes);
        assert_eq!(BytesCodec.extension(), "bin");
    }
}
