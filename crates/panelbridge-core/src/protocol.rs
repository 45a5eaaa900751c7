//! Simulator WebSocket frames.
//!
//! Outbound: `{"req_id": n, "type": "...", "params": {...}}`.
//! Inbound: `{"type": "result" | "dataref_update_values", ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outbound request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    DatarefSubscribeValues,
    DatarefSetValues,
    CommandSetIsActive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatarefRef {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatarefValue {
    pub id: u64,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandActivation {
    pub id: u64,
    pub is_active: bool,
    /// Hold duration in seconds
    pub duration: f64,
}

/// Request parameters; the variant always matches the request type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    Datarefs { datarefs: Vec<DatarefRef> },
    DatarefValues { datarefs: Vec<DatarefValue> },
    Commands { commands: Vec<CommandActivation> },
}

/// A request sent to the simulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub req_id: u64,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub params: RequestParams,
}

impl Request {
    pub fn subscribe(req_id: u64, ids: &[u64]) -> Self {
        Self {
            req_id,
            request_type: RequestType::DatarefSubscribeValues,
            params: RequestParams::Datarefs {
                datarefs: ids.iter().map(|&id| DatarefRef { id }).collect(),
            },
        }
    }

    /// Write the same value to every id.
    pub fn set_values(req_id: u64, ids: &[u64], value: &Value) -> Self {
        Self {
            req_id,
            request_type: RequestType::DatarefSetValues,
            params: RequestParams::DatarefValues {
                datarefs: ids
                    .iter()
                    .map(|&id| DatarefValue {
                        id,
                        value: value.clone(),
                    })
                    .collect(),
            },
        }
    }

    pub fn activate_commands(req_id: u64, ids: &[u64], duration: f64) -> Self {
        Self {
            req_id,
            request_type: RequestType::CommandSetIsActive,
            params: RequestParams::Commands {
                commands: ids
                    .iter()
                    .map(|&id| CommandActivation {
                        id,
                        is_active: true,
                        duration,
                    })
                    .collect(),
            },
        }
    }
}

/// A frame received from the simulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Outcome of an earlier request
    Result {
        #[serde(default, alias = "req_id")]
        request_id: Option<u64>,
        #[serde(default)]
        success: bool,
        #[serde(default)]
        error_code: Option<String>,
        #[serde(default)]
        error_message: Option<String>,
    },
    /// Subscribed values keyed by id (as a string)
    DatarefUpdateValues {
        #[serde(default)]
        data: Map<String, Value>,
    },
    #[serde(other)]
    Unknown,
}
