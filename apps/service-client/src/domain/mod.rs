//! Domain Layer
//!
//! Value objects describing a service invocation. No I/O lives here.

mod invocation;

pub use invocation::{EMPTY_JSON_OBJECT, HttpMethod, InvocationRequest, ServiceId};
