pub mod request;
pub mod response;

pub use request::{McpRequest, RequestId};
pub use response::{
    ErrorKind, Failure, McpResponse, Outcome, ResultEnvelope, RESULT_SCHEMA_TAG,
};
