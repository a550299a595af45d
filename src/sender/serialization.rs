use super::transport::Payload;
use crate::buffer::Batch;
use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::{Compression, write::GzEncoder};
use std::io::{Read, Write};
use thiserror::Error;

// Small bodies are not worth the gzip framing
const COMPRESSION_MIN_BYTES: usize = 1024;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error during serialization: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Batch is empty")]
    EmptyBatch,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSerializer {
    compression: bool,
}

impl BatchSerializer {
    pub fn new(compression: bool) -> Self {
        Self { compression }
    }

    pub fn serialize_json(&self, batch: &Batch) -> Result<Vec<u8>, SerializationError> {
        if batch.is_empty() {
            return Err(SerializationError::EmptyBatch);
        }

        Ok(serde_json::to_vec(batch)?)
    }

    pub fn serialize(&self, batch: &Batch) -> Result<Payload, SerializationError> {
        let json = self.serialize_json(batch)?;

        let (body, gzip) = if self.compression && json.len() >= COMPRESSION_MIN_BYTES {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
            encoder.write_all(&json)?;
            (encoder.finish()?, true)
        } else {
            (json, false)
        };

        Ok(Payload {
            batch_id: batch.id(),
            event_count: batch.size(),
            body: Bytes::from(body),
            gzip,
        })
    }

    /// Inverse of [`serialize`](Self::serialize), used by receivers and tests.
    pub fn decode(body: &[u8], gzip: bool) -> Result<Batch, SerializationError> {
        if gzip {
            let mut json = Vec::new();
            GzDecoder::new(body).read_to_end(&mut json)?;
            Ok(serde_json::from_slice(&json)?)
        } else {
            Ok(serde_json::from_slice(body)?)
        }
    }
}
