//! User service library: credential hashing, session tokens, and
//! duplicate-safe user persistence behind an Actix Web adapter.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
