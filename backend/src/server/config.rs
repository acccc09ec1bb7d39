//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use user_service::domain::ports::AuthService;

/// Everything the HTTP server needs once the domain is wired.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) auth: Arc<dyn AuthService>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, auth: Arc<dyn AuthService>) -> Self {
        Self { bind_addr, auth }
    }
}
