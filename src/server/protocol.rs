//! JSON wire protocol
//!
//! One JSON object per request, dispatched on its `action` field, and one
//! JSON object per response:
//!
//! | action                      | response                                   |
//! |-----------------------------|--------------------------------------------|
//! | `say_hello`                 | `{"status":"ok","message":"Hello"}`        |
//! | `load_save_state_from_slot` | `{"status":"ok"}`                          |
//! | `get_watch_list_values`     | `{"values":{...},"status":"ok"}`           |
//! | `set_inputs`                | `{"status":"ok"}`                          |
//! | `reset`                     | `{"status":"ok"}` or an error envelope     |
//! | anything else               | `{"status":"error","message":"Invalid action : <name>"}` |

use crate::controller::{ControllerInputs, InvalidSlot};
use crate::memory::MemorySample;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const KNOWN_ACTIONS: [&str; 5] = [
    "reset",
    "load_save_state_from_slot",
    "get_watch_list_values",
    "set_inputs",
    "say_hello",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Reset,
    LoadSaveStateFromSlot { slot_number: u8 },
    GetWatchListValues,
    SetInputs { inputs: ControllerInputs },
    SayHello,
}

/// Malformed or unrecognized request; answered with an error envelope
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid request : {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Invalid request : missing action")]
    MissingAction,

    #[error("Invalid request : action must be a string")]
    ActionNotString,

    #[error("Invalid action : {0}")]
    UnknownAction(String),

    #[error("Invalid request for {action} : {source}")]
    InvalidPayload {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request for set_inputs : {0}")]
    InvalidSlot(#[from] InvalidSlot),
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::Reset => "reset",
            Request::LoadSaveStateFromSlot { .. } => "load_save_state_from_slot",
            Request::GetWatchListValues => "get_watch_list_values",
            Request::SetInputs { .. } => "set_inputs",
            Request::SayHello => "say_hello",
        }
    }

    /// Decodes one request, telling unknown actions apart from bad payloads
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(bytes).map_err(ProtocolError::Malformed)?;
        let action = match value.get("action") {
            Some(Value::String(action)) => action.clone(),
            Some(_) => return Err(ProtocolError::ActionNotString),
            None => return Err(ProtocolError::MissingAction),
        };
        if !KNOWN_ACTIONS.contains(&action.as_str()) {
            return Err(ProtocolError::UnknownAction(action));
        }

        let request: Request = serde_json::from_value(value)
            .map_err(|source| ProtocolError::InvalidPayload { action, source })?;
        if let Request::SetInputs { inputs } = &request {
            inputs.slot()?;
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Response envelope; field order matches what clients already parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<MemorySample>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            values: None,
            status: Status::Ok,
            message: None,
        }
    }

    pub fn hello() -> Self {
        Self {
            message: Some("Hello".into()),
            ..Self::ok()
        }
    }

    pub fn values(sample: MemorySample) -> Self {
        Self {
            values: Some(sample),
            ..Self::ok()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            values: None,
            status: Status::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Splits the envelope into the successful response or the error message
    pub fn into_result(self) -> Result<Self, String> {
        match self.status {
            Status::Ok => Ok(self),
            Status::Error => Err(self.message.unwrap_or_default()),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
