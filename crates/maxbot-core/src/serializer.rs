//! Wire serialization for webhook payloads.

use serde_json::Value;

use crate::error::{SerializationError, SerializationResult};
use crate::model::Update;

/// Converts webhook payloads to updates and bot responses back to text.
///
/// Each bot picks its serializer through [`Bot::serializer`](crate::Bot::serializer);
/// the container never assumes a format.
pub trait Serializer: Send + Sync {
    /// Parses a request body into an update.
    fn deserialize(&self, body: &[u8]) -> SerializationResult<Update>;

    /// Writes a bot response as a response body.
    fn serialize(&self, value: &Value) -> SerializationResult<String>;
}

/// JSON serializer backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn deserialize(&self, body: &[u8]) -> SerializationResult<Update> {
        serde_json::from_slice(body).map_err(|e| SerializationError::Deserialize(e.to_string()))
    }

    fn serialize(&self, value: &Value) -> SerializationResult<String> {
        serde_json::to_string(value).map_err(|e| SerializationError::Serialize(e.to_string()))
    }
}
