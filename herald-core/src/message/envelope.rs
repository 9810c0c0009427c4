use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Map, Value};
use rst_common::standard::uuid::Uuid;

use super::family::MessageType;
use super::types::{
    MessageError, ThreadID, FIELD_FOR_RELATIONSHIP, FIELD_ID, FIELD_THREAD, FIELD_THREAD_ID,
    FIELD_TYPE,
};

/// `Envelope` is the JSON object exchanged with the agent
///
/// It always carries `@type` and `@id`, protocol families merge their own fields on top
/// of it. The framework only reads `@type`, `@id`, `~thread` and `~for_relationship`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde", transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    pub fn new(msg_type: String) -> Self {
        let mut fields = Map::new();
        fields.insert(FIELD_TYPE.to_string(), Value::String(msg_type));
        fields.insert(
            FIELD_ID.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(MessageError::JSONError(format!(
                "envelope must be a json object, got: {}",
                other
            ))),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| MessageError::JSONError(err.to_string()))?;

        Self::from_value(value)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(&self.0).map_err(|err| MessageError::JSONError(err.to_string()))
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.get_str(FIELD_TYPE)
    }

    pub fn parse_type(&self) -> Result<MessageType, MessageError> {
        let raw = self
            .msg_type()
            .ok_or_else(|| MessageError::MalformedType(format!("missing {}", FIELD_TYPE)))?;

        MessageType::parse(raw)
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str(FIELD_ID)
    }

    pub fn thread_id(&self) -> Option<ThreadID> {
        self.0
            .get(FIELD_THREAD)
            .and_then(|thread| thread.get(FIELD_THREAD_ID))
            .and_then(Value::as_str)
            .map(ThreadID::from)
    }

    pub fn set_thread(&mut self, thread_id: &ThreadID) -> &mut Self {
        let mut thread = Map::new();
        thread.insert(
            FIELD_THREAD_ID.to_string(),
            Value::String(thread_id.to_string()),
        );

        self.0.insert(FIELD_THREAD.to_string(), Value::Object(thread));
        self
    }

    pub fn for_relationship(&self) -> Option<&str> {
        self.get_str(FIELD_FOR_RELATIONSHIP)
    }

    pub fn set_relationship(&mut self, relationship: &str) -> &mut Self {
        self.insert(FIELD_FOR_RELATIONSHIP, relationship)
    }

    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Builder flavoured [`Envelope::insert`]
    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge every field of a serializable payload into this envelope
    pub fn merge<T: Serialize>(&mut self, payload: &T) -> Result<&mut Self, MessageError> {
        let value =
            serde_json::to_value(payload).map_err(|err| MessageError::JSONError(err.to_string()))?;

        match value {
            Value::Object(fields) => {
                self.0.extend(fields);
                Ok(self)
            }
            _ => Err(MessageError::JSONError(
                "payload must serialize into a json object".to_string(),
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn require_str(&self, key: &str) -> Result<&str, MessageError> {
        self.get_str(key)
            .ok_or_else(|| MessageError::MissingField(key.to_string()))
    }

    /// Decode the whole envelope into a typed payload, unknown fields are ignored
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|err| MessageError::JSONError(err.to_string()))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Envelope {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}
