use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A frame received from the device, tagged on `type`.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    CommandResponse(CommandResponse),
    DataResponse(DataResponse),
    #[serde(untagged)]
    Unknown(UnknownMessage),
}

impl InboundMessage {
    pub fn from_text(text: &str) -> Result<InboundMessage, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub action: String,
    pub status: CommandStatus,
    #[serde(default)]
    pub message: String,
    pub id: Option<u64>,
}

#[derive(Debug, PartialEq, Deserialize)]
pub enum CommandStatus {
    Success,
    Error,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub action: String,
    /// Raw values, so that one unreadable value does not cost the others.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    pub id: Option<u64>,
}

/// Any well-formed JSON that is not one of the known responses.
#[derive(Debug, PartialEq)]
pub struct UnknownMessage {
    pub message_type: Option<String>,
}

impl<'de> Deserialize<'de> for UnknownMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let message_type = match value.get("type") {
            Some(Value::String(message_type)) => Some(message_type.clone()),
            _ => None,
        };
        Ok(UnknownMessage { message_type })
    }
}
