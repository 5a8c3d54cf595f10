//! Method registry.
//!
//! Each MCP method is one [`MethodSpec`]: its declared parameters and the
//! shape of the single n8n call it turns into. The same parameter
//! declarations drive request validation and the discovery document, so the
//! advertised and enforced schemas cannot drift apart.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::remote::OutboundCall;
use crate::schema::{self, SchemaValidationError};

/// Expected shape of one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Non-empty string, safe to substitute into a path segment.
    Identifier,
    Text,
    /// Non-negative whole number. Integral floats such as `5.0` count.
    Count,
    List,
    /// Object whose listed fields are type-checked when present; other keys
    /// pass through untouched.
    Object(&'static [ParamSpec]),
    Any,
}

impl ParamKind {
    /// Check a value against this kind. Nested object fields are not
    /// descended into here; see `validate`.
    pub fn accepts(&self, value: &Value) -> Result<(), &'static str> {
        match self {
            Self::Identifier => match value.as_str() {
                Some(s) if !s.is_empty() => Ok(()),
                Some(_) => Err("must not be empty"),
                None => Err("expected a string"),
            },
            Self::Text => value.is_string().then_some(()).ok_or("expected a string"),
            Self::Count => is_count(value)
                .then_some(())
                .ok_or("expected a non-negative integer"),
            Self::List => value.is_array().then_some(()).ok_or("expected an array"),
            Self::Object(_) => value.is_object().then_some(()).ok_or("expected an object"),
            Self::Any => Ok(()),
        }
    }

    pub fn json_schema(&self) -> Value {
        match self {
            Self::Identifier => json!({ "type": "string", "minLength": 1 }),
            Self::Text => json!({ "type": "string" }),
            Self::Count => json!({ "type": "integer", "minimum": 0 }),
            Self::List => json!({ "type": "array" }),
            Self::Object(fields) => object_schema(fields),
            Self::Any => json!({}),
        }
    }
}

/// Declaration of one named parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, required: true, description }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, required: false, description }
    }

    /// Schema for this parameter. Optional parameters also admit `null`,
    /// which validation treats as omitted.
    pub fn json_schema(&self) -> Value {
        let mut schema = self.kind.json_schema();
        if let Some(obj) = schema.as_object_mut() {
            if !self.required {
                if let Some(Value::String(ty)) = obj.get("type").cloned() {
                    obj.insert("type".into(), json!([ty, "null"]));
                }
            }
            obj.insert("description".into(), Value::String(self.description.into()));
        }
        schema
    }
}

fn is_count(value: &Value) -> bool {
    value.as_u64().is_some()
        || value
            .as_f64()
            .is_some_and(|f| f.is_finite() && f >= 0.0 && f.fract() == 0.0)
}

/// Render a parameter as a query-string value. Whole-number floats are
/// written without a fractional part.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_u64().is_none() && n.as_i64().is_none() => match n.as_f64() {
            Some(f) if f == 0.0 => "0".to_string(),
            Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Render a list of parameter declarations as a JSON Schema object.
pub fn object_schema(fields: &[ParamSpec]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|p| (p.name.to_string(), p.json_schema()))
        .collect();
    let required: Vec<&str> = fields.iter().filter(|p| p.required).map(|p| p.name).collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Where the outbound request body comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    None,
    /// The named parameter's value, or `{}` when it was omitted.
    Param(&'static str),
    /// The `payload` object with `id_param` inserted under `id_key` unless
    /// the payload already carries that key.
    MergeId {
        payload: &'static str,
        id_param: &'static str,
        id_key: &'static str,
    },
}

/// How a 2xx response body becomes the result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Body must be JSON.
    Json,
    /// An empty body is acknowledged as `{"status": "deleted"}`.
    AckOnEmpty,
    /// Body must be a JSON object carrying an execution identifier.
    Execution,
}

/// Description of the single n8n call a method maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteOperation {
    pub verb: HttpVerb,
    /// Relative to the configured base URL; `{name}` is replaced by the
    /// string value of parameter `name`.
    pub path_template: &'static str,
    pub query: &'static [&'static str],
    pub body: BodySource,
    pub projection: Projection,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("path placeholder `{0}` has no string value")]
    MissingPathParam(String),
    #[error("unterminated placeholder in path template `{0}`")]
    BadTemplate(&'static str),
    #[error("body parameter `{0}` is not an object")]
    BodyNotObject(&'static str),
}

impl RemoteOperation {
    /// Turn validated parameters into the outbound call. Pure.
    pub fn build(&self, params: &Map<String, Value>) -> Result<OutboundCall, BuildError> {
        let mut segments = Vec::new();
        for raw in self.path_template.split('/').filter(|s| !s.is_empty()) {
            let segment = match raw.strip_prefix('{') {
                Some(rest) => {
                    let name = rest
                        .strip_suffix('}')
                        .ok_or(BuildError::BadTemplate(self.path_template))?;
                    params
                        .get(name)
                        .and_then(Value::as_str)
                        .ok_or_else(|| BuildError::MissingPathParam(name.to_string()))?
                        .to_string()
                }
                None => raw.to_string(),
            };
            segments.push(segment);
        }

        let query = self
            .query
            .iter()
            .filter_map(|name| {
                params
                    .get(*name)
                    .map(|value| (name.to_string(), query_value(value)))
            })
            .collect();

        let body = match self.body {
            BodySource::None => None,
            BodySource::Param(name) => Some(params.get(name).cloned().unwrap_or_else(|| json!({}))),
            BodySource::MergeId { payload, id_param, id_key } => {
                let mut body = match params.get(payload) {
                    Some(Value::Object(map)) => map.clone(),
                    Some(_) => return Err(BuildError::BodyNotObject(payload)),
                    None => Map::new(),
                };
                if let Some(id) = params.get(id_param) {
                    body.entry(id_key).or_insert_with(|| id.clone());
                }
                Some(Value::Object(body))
            }
        };

        Ok(OutboundCall {
            verb: self.verb,
            segments,
            query,
            body,
        })
    }
}

/// One registered MCP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub remote: RemoteOperation,
}

impl MethodSpec {
    pub fn parameter_schema(&self) -> Value {
        object_schema(self.params)
    }
}

/// Discovery entry for one method.
#[derive(Debug, Clone, Serialize)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameter_schema: Value,
}

/// Immutable name → method table, built once at startup.
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: Vec<MethodSpec>,
}

impl MethodRegistry {
    pub fn new(methods: impl IntoIterator<Item = MethodSpec>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    /// The six n8n workflow methods.
    pub fn n8n() -> Self {
        Self::new(N8N_METHODS.iter().copied())
    }

    pub fn lookup(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.name).collect()
    }

    pub fn descriptors(&self) -> Vec<MethodDescriptor> {
        self.methods
            .iter()
            .map(|m| MethodDescriptor {
                name: m.name,
                description: m.description,
                parameter_schema: m.parameter_schema(),
            })
            .collect()
    }

    /// Compile every advertised parameter schema once, failing on the first
    /// method whose schema is not valid JSON Schema.
    pub fn compile_schemas(&self) -> Result<(), (&'static str, SchemaValidationError)> {
        for method in &self.methods {
            schema::compile(&method.parameter_schema()).map_err(|e| (method.name, e))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// n8n method table
// ---------------------------------------------------------------------------

const WORKFLOW_ID: ParamSpec = ParamSpec::required(
    "workflow_id",
    ParamKind::Identifier,
    "Identifier of the n8n workflow",
);

const RUN_PAYLOAD_FIELDS: &[ParamSpec] = &[
    ParamSpec::optional("runData", ParamKind::Object(&[]), "Pinned run data keyed by node name"),
    ParamSpec::optional("startNodes", ParamKind::List, "Nodes to start the execution from"),
    ParamSpec::optional("destinationNode", ParamKind::Text, "Node at which the execution stops"),
];

const N8N_METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "list_workflows",
        description: "List workflows, optionally paginated",
        params: &[
            ParamSpec::optional("limit", ParamKind::Count, "Maximum number of workflows to fetch"),
            ParamSpec::optional("offset", ParamKind::Count, "Offset for pagination"),
        ],
        remote: RemoteOperation {
            verb: HttpVerb::Get,
            path_template: "workflows",
            query: &["limit", "offset"],
            body: BodySource::None,
            projection: Projection::Json,
        },
    },
    MethodSpec {
        name: "create_workflow",
        description: "Create a workflow from a full n8n workflow definition",
        params: &[ParamSpec::required(
            "workflow",
            ParamKind::Object(&[]),
            "Workflow definition as accepted by n8n (name, nodes, connections, settings)",
        )],
        remote: RemoteOperation {
            verb: HttpVerb::Post,
            path_template: "workflows",
            query: &[],
            body: BodySource::Param("workflow"),
            projection: Projection::Json,
        },
    },
    MethodSpec {
        name: "update_workflow",
        description: "Apply a partial update to an existing workflow",
        params: &[
            WORKFLOW_ID,
            ParamSpec::optional("workflow", ParamKind::Object(&[]), "Fields of the workflow to update"),
        ],
        remote: RemoteOperation {
            verb: HttpVerb::Patch,
            path_template: "workflows/{workflow_id}",
            query: &[],
            body: BodySource::Param("workflow"),
            projection: Projection::Json,
        },
    },
    MethodSpec {
        name: "delete_workflow",
        description: "Delete a workflow",
        params: &[WORKFLOW_ID],
        remote: RemoteOperation {
            verb: HttpVerb::Delete,
            path_template: "workflows/{workflow_id}",
            query: &[],
            body: BodySource::None,
            projection: Projection::AckOnEmpty,
        },
    },
    MethodSpec {
        name: "run_workflow",
        description: "Trigger a workflow execution",
        params: &[
            WORKFLOW_ID,
            ParamSpec::optional(
                "payload",
                ParamKind::Object(RUN_PAYLOAD_FIELDS),
                "Execution parameters forwarded to n8n",
            ),
        ],
        remote: RemoteOperation {
            verb: HttpVerb::Post,
            path_template: "workflows/run",
            query: &[],
            body: BodySource::MergeId {
                payload: "payload",
                id_param: "workflow_id",
                id_key: "workflowId",
            },
            projection: Projection::Execution,
        },
    },
    MethodSpec {
        name: "get_execution_status",
        description: "Fetch the status of a workflow execution",
        params: &[ParamSpec::required(
            "execution_id",
            ParamKind::Identifier,
            "Execution identifier returned by n8n",
        )],
        remote: RemoteOperation {
            verb: HttpVerb::Get,
            path_template: "executions/{execution_id}",
            query: &[],
            body: BodySource::None,
            projection: Projection::Json,
        },
    },
];
