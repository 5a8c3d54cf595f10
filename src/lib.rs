//! MCP bridge for the n8n workflow-automation REST API.
//!
//! Accepts `{id, method, params}` requests on `POST /mcp/request`, validates
//! them against a fixed method registry, performs one n8n call, and answers
//! with exactly one `result` or `error` server-sent event. The registry is
//! advertised on `GET /mcp/discover`.

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod remote;
pub mod server;
pub mod sse;
pub mod validate;

pub mod schema;
