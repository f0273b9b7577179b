//! Request decoding, response envelopes and the request handler.

pub mod envelope;
pub mod handler;

pub use envelope::{
    ErrorBody, QueryRequest, QueryResponse, RawRequest, RequestBody, ResponseBody,
    ResponseEnvelope, CORS_HEADERS,
};
pub use handler::QueryHandler;
