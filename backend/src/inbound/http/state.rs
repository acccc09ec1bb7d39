//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and depend only on the
//! driving port, so they can be tested against a mock or in-memory service.

use std::sync::Arc;

use crate::domain::ports::AuthService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
}

impl HttpState {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }
}
