//! Application Layer
//!
//! Orchestrates a service call on top of the resilience pipeline:
//!
//! - **Ports**: resolver and transport interfaces
//! - **Request builder**: absolute URL and JSON headers
//! - **Typed REST client**: GET/POST/PUT/DELETE with typed decoding

pub mod ports;
pub mod request_builder;
pub mod rest_client;

pub use ports::*;
pub use request_builder::{
    ACCEPT_JSON, CONTENT_TYPE_JSON, REQUEST_ID_HEADER, RequestBuilder, join_url,
};
pub use rest_client::{MAX_ERROR_BODY_BYTES, TypedRestClient, decode_json};
