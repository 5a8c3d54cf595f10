//! Shared fixtures: a recording stand-in for the n8n client.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mcp_n8n_bridge::dispatch::Dispatcher;
use mcp_n8n_bridge::protocol::{McpRequest, RequestId};
use mcp_n8n_bridge::registry::MethodRegistry;
use mcp_n8n_bridge::remote::{OutboundCall, RemoteApi, RemoteError, RemoteResponse};
use serde_json::Value;

/// Records every outbound call and answers with a canned reply.
pub struct RecordingApi {
    calls: Mutex<Vec<OutboundCall>>,
    reply: Result<RemoteResponse, RemoteError>,
    delay: Option<Duration>,
    panic: bool,
}

impl RecordingApi {
    pub fn ok(body: Value) -> Self {
        Self::raw(200, &body.to_string())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Ok(RemoteResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            delay: None,
            panic: false,
        }
    }

    pub fn failing(err: RemoteError) -> Self {
        Self {
            reply: Err(err),
            ..Self::raw(200, "")
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::raw(200, "")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteApi for RecordingApi {
    async fn execute(&self, call: &OutboundCall) -> Result<RemoteResponse, RemoteError> {
        self.calls.lock().unwrap().push(call.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic {
            panic!("simulated client defect");
        }
        self.reply.clone()
    }
}

pub fn dispatcher(api: Arc<RecordingApi>, timeout: Duration) -> Dispatcher {
    Dispatcher::new(Arc::new(MethodRegistry::n8n()), api, timeout)
}

pub fn request(id: &str, method: &str, params: Value) -> McpRequest {
    McpRequest::new(RequestId::Str(id.into()), method, params)
}

/// Split an SSE body into `(event name, parsed data)` pairs.
pub fn parse_events(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut data = String::new();
            for line in block.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    name = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data.push_str(rest.trim_start());
                }
            }
            let name = name?;
            Some((name, serde_json::from_str(&data).unwrap()))
        })
        .collect()
}
