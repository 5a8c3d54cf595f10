//! Request dispatch.
//!
//! Every path through validation, the remote call and response projection
//! ends in exactly one [`Outcome`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::protocol::{ErrorKind, Failure, McpRequest, Outcome};
use crate::registry::{MethodRegistry, Projection};
use crate::remote::{OutboundCall, RemoteApi, RemoteError, RemoteResponse};
use crate::validate::validate;

/// Turns requests into outcomes. Cheap to share behind an `Arc`.
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    remote: Arc<dyn RemoteApi>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>, remote: Arc<dyn RemoteApi>, timeout: Duration) -> Self {
        Self {
            registry,
            remote,
            timeout,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Dispatch one request.
    pub async fn dispatch(&self, request: &McpRequest) -> Outcome {
        info!(id = %request.id, method = %request.method, "Dispatching request");

        match self.try_dispatch(request).await {
            Ok(payload) => {
                info!(id = %request.id, "Request succeeded");
                Outcome::Success(payload)
            }
            Err(failure) => {
                if failure.kind == ErrorKind::InternalFailure {
                    error!(id = %request.id, message = %failure.message, "Request failed");
                } else if failure.kind.is_client_error() {
                    info!(id = %request.id, kind = ?failure.kind, message = %failure.message, "Request rejected");
                } else {
                    warn!(id = %request.id, kind = ?failure.kind, message = %failure.message, "Request failed");
                }
                Outcome::Failure(failure)
            }
        }
    }

    async fn try_dispatch(&self, request: &McpRequest) -> Result<Value, Failure> {
        let call = validate(&self.registry, request)?;

        let outbound = call.spec.remote.build(&call.params).map_err(|e| {
            error!(method = call.spec.name, "Registry entry produced an invalid call: {e}");
            Failure::new(ErrorKind::InternalFailure, e.to_string())
        })?;
        debug!(id = %request.id, path = %outbound.path(), "Outbound call prepared");

        let response = self.execute(&outbound).await?;
        project(call.spec.remote.projection, response).map_err(Failure::from)
    }

    /// Run the remote call under the configured timeout. A panic inside the
    /// remote client is reported as an internal failure.
    async fn execute(&self, call: &OutboundCall) -> Result<RemoteResponse, Failure> {
        let attempt = AssertUnwindSafe(self.remote.execute(call)).catch_unwind();

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(result)) => result.map_err(Failure::from),
            Ok(Err(_)) => {
                error!("Remote client panicked");
                Err(Failure::canonical(ErrorKind::InternalFailure))
            }
            Err(_) => {
                warn!("Remote call timed out after {:?}", self.timeout);
                Err(RemoteError::Timeout(self.timeout).into())
            }
        }
    }
}

/// Apply a method's projection rule to a 2xx response.
pub fn project(projection: Projection, response: RemoteResponse) -> Result<Value, RemoteError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return match projection {
            Projection::AckOnEmpty => Ok(json!({ "status": "deleted" })),
            _ => Err(RemoteError::Malformed(format!(
                "empty body with HTTP {}",
                response.status
            ))),
        };
    }

    let body: Value = serde_json::from_slice(&response.body)
        .map_err(|e| RemoteError::Malformed(format!("body is not JSON: {e}")))?;

    if projection == Projection::Execution && execution_id(&body).is_none() {
        return Err(RemoteError::Malformed(
            "response carries no execution identifier".into(),
        ));
    }

    Ok(body)
}

/// Locate the execution identifier in a run-trigger response.
pub fn execution_id(body: &Value) -> Option<&Value> {
    [
        body.get("executionId"),
        body.get("data").and_then(|d| d.get("executionId")),
        body.get("id"),
    ]
    .into_iter()
    .flatten()
    .find(|v| v.is_string() || v.is_number())
}
