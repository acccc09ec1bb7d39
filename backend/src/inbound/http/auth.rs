//! Authorization header extraction.
//!
//! The raw header value is handed to the domain unchanged; its shape and
//! signature are checked there. A missing or non-ASCII header reads as the
//! empty string, which the domain rejects as forbidden.

use std::convert::Infallible;

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{Ready, ready};

/// Raw `Authorization` header value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationHeader(String);

impl AuthorizationHeader {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromRequest for AuthorizationHeader {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let value = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        ready(Ok(Self(value.to_owned())))
    }
}
