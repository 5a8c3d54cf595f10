//! Request validation against the method registry.
//!
//! Pure and synchronous: the same request always yields the same result.

use serde_json::{json, Map, Value};

use crate::protocol::{ErrorKind, Failure, McpRequest};
use crate::registry::{MethodRegistry, MethodSpec, ParamKind, ParamSpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported method: {0}")]
    UnknownMethod(String),
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParams { field: String, reason: String },
}

impl ValidationError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownMethod(_) => ErrorKind::UnknownMethod,
            Self::InvalidParams { .. } => ErrorKind::InvalidParams,
        }
    }
}

impl From<ValidationError> for Failure {
    fn from(err: ValidationError) -> Self {
        let failure = Failure::new(err.kind(), err.to_string());
        match err {
            ValidationError::UnknownMethod(method) => {
                failure.with_details(json!({ "method": method }))
            }
            ValidationError::InvalidParams { field, .. } => {
                failure.with_details(json!({ "field": field }))
            }
        }
    }
}

/// A request that passed validation, ready to be turned into an outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCall<'r> {
    pub spec: &'r MethodSpec,
    pub params: Map<String, Value>,
}

/// Resolve the method, then check every declared parameter.
pub fn validate<'r>(
    registry: &'r MethodRegistry,
    request: &McpRequest,
) -> Result<ValidatedCall<'r>, ValidationError> {
    let spec = registry
        .lookup(&request.method)
        .ok_or_else(|| ValidationError::UnknownMethod(request.method.clone()))?;

    let mut params = match &request.params {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => return Err(ValidationError::invalid("params", "expected an object")),
    };

    check_fields(spec.params, &mut params, None)?;

    Ok(ValidatedCall { spec, params })
}

/// Check declared fields, dropping those that are explicitly `null` so the
/// outbound call sees them as omitted.
fn check_fields(
    fields: &[ParamSpec],
    values: &mut Map<String, Value>,
    parent: Option<&str>,
) -> Result<(), ValidationError> {
    for field in fields {
        let path = match parent {
            Some(p) => format!("{p}.{}", field.name),
            None => field.name.to_string(),
        };

        if values.get(field.name).is_some_and(Value::is_null) {
            values.remove(field.name);
        }

        let Some(value) = values.get_mut(field.name) else {
            if field.required {
                return Err(ValidationError::invalid(path, "field required"));
            }
            continue;
        };

        field
            .kind
            .accepts(value)
            .map_err(|reason| ValidationError::invalid(path.clone(), reason))?;

        if let (ParamKind::Object(nested), Value::Object(map)) = (field.kind, value) {
            check_fields(nested, map, Some(&path))?;
        }
    }
    Ok(())
}
