use serde::{Deserialize, Serialize};

use super::request::RequestId;

/// Schema tag carried by every successful result envelope.
pub const RESULT_SCHEMA_TAG: &str = "json_schema";

// ---------------------------------------------------------------------------
// Outcome layer (one per request, produced by the dispatcher)
// ---------------------------------------------------------------------------

/// Machine-distinguishable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownMethod,
    InvalidParams,
    RemoteUnreachable,
    RemoteTimeout,
    RemoteRejected,
    /// The remote answered 2xx but the body does not fit the method's projection.
    RemoteMalformed,
    InternalFailure,
}

impl ErrorKind {
    /// Whether the failure originates from the caller's input rather than
    /// the remote side or the bridge itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownMethod | Self::InvalidParams)
    }

    pub fn canonical_message(&self) -> &'static str {
        match self {
            Self::UnknownMethod => "Method is not supported",
            Self::InvalidParams => "Parameters are invalid",
            Self::RemoteUnreachable => "n8n API is unreachable",
            Self::RemoteTimeout => "n8n API did not respond in time",
            Self::RemoteRejected => "n8n API returned an error",
            Self::RemoteMalformed => "n8n API returned an unexpected response",
            Self::InternalFailure => "Internal error",
        }
    }
}

/// Failure half of an [`Outcome`]; serialized as the `error` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn canonical(kind: ErrorKind) -> Self {
        Self::new(kind, kind.canonical_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Exactly one of these is produced per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(serde_json::Value),
    Failure(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Attach the request id and reshape into the wire envelope.
    pub fn into_response(self, id: RequestId) -> McpResponse {
        match self {
            Self::Success(data) => McpResponse::success(id, data),
            Self::Failure(failure) => McpResponse::error(id, failure),
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

// ---------------------------------------------------------------------------
// Wire envelope (carried as the `data` of the terminal SSE event)
// ---------------------------------------------------------------------------

/// Schema-tagged wrapper around the remote payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "type")]
    pub schema: String,
    pub data: serde_json::Value,
}

/// Response envelope echoed back for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultEnvelope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

impl McpResponse {
    pub fn success(id: RequestId, data: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(ResultEnvelope {
                schema: RESULT_SCHEMA_TAG.into(),
                data,
            }),
            error: None,
        }
    }

    pub fn error(id: RequestId, failure: Failure) -> Self {
        Self {
            id,
            result: None,
            error: Some(failure),
        }
    }
}
