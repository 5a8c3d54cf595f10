//! Outbound n8n REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::protocol::{ErrorKind, Failure};
use crate::registry::HttpVerb;

/// Header n8n reads its API key from (`X-N8N-API-KEY`).
pub const API_KEY_HEADER: &str = "x-n8n-api-key";

/// One fully-resolved outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCall {
    pub verb: HttpVerb,
    /// Path segments relative to the base URL, not yet percent-encoded.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutboundCall {
    /// Unencoded relative path, for logs and assertions.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

/// Raw 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("n8n API is unreachable: {0}")]
    Unreachable(String),
    #[error("n8n API did not respond within {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("n8n API returned HTTP {status}")]
    Rejected { status: u16, body: Value },
    #[error("n8n API returned an unexpected response: {0}")]
    Malformed(String),
    #[error("failed to prepare n8n request: {0}")]
    Internal(String),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable(_) => ErrorKind::RemoteUnreachable,
            Self::Timeout(_) => ErrorKind::RemoteTimeout,
            Self::Rejected { .. } => ErrorKind::RemoteRejected,
            Self::Malformed(_) => ErrorKind::RemoteMalformed,
            Self::Internal(_) => ErrorKind::InternalFailure,
        }
    }
}

impl From<RemoteError> for Failure {
    fn from(err: RemoteError) -> Self {
        let failure = Failure::new(err.kind(), err.to_string());
        match err {
            RemoteError::Rejected { status, body } => {
                failure.with_details(json!({ "status": status, "response": body }))
            }
            _ => failure,
        }
    }
}

/// The seam between dispatch and the network.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn execute(&self, call: &OutboundCall) -> Result<RemoteResponse, RemoteError>;
}

/// Shared n8n client. One instance serves every request.
#[derive(Debug, Clone)]
pub struct N8nClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl N8nClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| RemoteError::Internal("API key is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, call: &OutboundCall) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Internal(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(&call.segments);
        if !call.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&call.query);
        }
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Unreachable(err.to_string())
        }
    }
}

fn method_for(verb: HttpVerb) -> Method {
    match verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Post => Method::POST,
        HttpVerb::Patch => Method::PATCH,
        HttpVerb::Delete => Method::DELETE,
    }
}

/// Best-effort decode of an error body for the failure details.
fn error_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl RemoteApi for N8nClient {
    async fn execute(&self, call: &OutboundCall) -> Result<RemoteResponse, RemoteError> {
        let url = self.url_for(call)?;
        debug!(verb = call.verb.as_str(), %url, "Calling n8n");

        let mut request = self.http.request(method_for(call.verb), url);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify(e))?.to_vec();

        if !status.is_success() {
            warn!(status = status.as_u16(), path = %call.path(), "n8n rejected request");
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                body: error_body(&body),
            });
        }

        Ok(RemoteResponse {
            status: status.as_u16(),
            body,
        })
    }
}
