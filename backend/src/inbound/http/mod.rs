//! HTTP inbound adapter exposing the REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod state;
pub mod users;

use actix_web::web;

pub use error::ApiResult;

/// Register the user routes and the JSON error handler on an app or scope.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use user_service::inbound::http::configure_users;
///
/// let app = App::new().configure(configure_users);
/// ```
pub fn configure_users(cfg: &mut web::ServiceConfig) {
    cfg.app_data(users::json_config())
        .service(users::register)
        .service(users::login)
        .service(users::current_user)
        .service(users::update_user);
}
