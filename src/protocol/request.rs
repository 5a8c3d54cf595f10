use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Correlation token supplied by the MCP client, a JSON number or string.
/// Echoed back exactly as received, so any JSON number is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(Number),
    Str(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Inbound MCP request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub id: RequestId,
    pub method: String,
    /// Left as a raw value so a non-object `params` surfaces as an
    /// `invalid_params` event instead of a transport-level rejection.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl McpRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}
