//! Registration, login and profile handlers.
//!
//! ```text
//! POST  /users/register {"phone":"+6280989444","name":"albert einstein","password":"Password1!"}
//! POST  /login          {"phone":"+6280989444","password":"Password1!"}
//! GET   /users          Authorization: Bearer <token>
//! PATCH /users          Authorization: Bearer <token> {"phone":"","name":"halo halo"}
//! ```

use actix_web::{HttpRequest, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::ports::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::domain::{Error, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthorizationHeader;
use crate::inbound::http::state::HttpState;

/// Message returned for any body that fails to deserialise.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload: failed to parse";

/// JSON extractor configuration mapping parse failures to the domain error
/// envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        debug!(error = %err, "rejected request payload");
        Error::invalid_request(INVALID_PAYLOAD_MESSAGE).into()
    })
}

/// Request bodies must be JSON objects; arrays and scalars fail to parse.
type JsonObject = Map<String, Value>;

/// Missing and `null` fields read as empty strings.
fn string_field(object: &JsonObject, key: &str) -> Result<String, String> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(format!("{key} must be a string")),
    }
}

/// Body for `POST /users/register`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(try_from = "JsonObject")]
pub struct RegisterBody {
    pub phone: String,
    pub name: String,
    pub password: String,
}

impl TryFrom<JsonObject> for RegisterBody {
    type Error = String;

    fn try_from(object: JsonObject) -> Result<Self, Self::Error> {
        Ok(Self {
            phone: string_field(&object, "phone")?,
            name: string_field(&object, "name")?,
            password: string_field(&object, "password")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub id: i64,
}

/// Body for `POST /login`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(try_from = "JsonObject")]
pub struct LoginBody {
    pub phone: String,
    pub password: String,
}

impl TryFrom<JsonObject> for LoginBody {
    type Error = String;

    fn try_from(object: JsonObject) -> Result<Self, Self::Error> {
        Ok(Self {
            phone: string_field(&object, "phone")?,
            password: string_field(&object, "password")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub id: i64,
    pub token: String,
}

/// Body for `PATCH /users`. Empty or missing fields keep the stored value.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(try_from = "JsonObject")]
pub struct UpdateProfileBody {
    pub phone: String,
    pub name: String,
}

impl TryFrom<JsonObject> for UpdateProfileBody {
    type Error = String;

    fn try_from(object: JsonObject) -> Result<Self, Self::Error> {
        Ok(Self {
            phone: string_field(&object, "phone")?,
            name: string_field(&object, "name")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileResponse {
    pub name: String,
    pub phone: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(value: UserProfile) -> Self {
        Self {
            name: value.name,
            phone: value.phone,
        }
    }
}

/// Create an account.
#[post("/users/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterBody>,
) -> ApiResult<web::Json<RegisterResponse>> {
    let body = payload.into_inner();
    let id = state
        .auth
        .register(RegisterRequest::new(&body.phone, &body.name, &body.password))
        .await?;
    Ok(web::Json(RegisterResponse { id: id.get() }))
}

/// Exchange credentials for a session token.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginBody>,
) -> ApiResult<web::Json<LoginResponse>> {
    let body = payload.into_inner();
    let outcome = state
        .auth
        .login(LoginRequest::new(&body.phone, &body.password))
        .await?;
    Ok(web::Json(LoginResponse {
        id: outcome.user_id.get(),
        token: outcome.token,
    }))
}

/// Profile of the authenticated user.
#[get("/users")]
pub async fn current_user(
    state: web::Data<HttpState>,
    authorization: AuthorizationHeader,
) -> ApiResult<web::Json<ProfileResponse>> {
    let profile = state.auth.fetch_profile(authorization.as_str()).await?;
    Ok(web::Json(profile.into()))
}

/// Change the authenticated user's phone number or name.
///
/// The session token is checked before the body, so an unauthenticated
/// caller gets 403 even when the payload is malformed.
#[patch("/users")]
pub async fn update_user(
    state: web::Data<HttpState>,
    authorization: AuthorizationHeader,
    payload: Result<web::Json<UpdateProfileBody>, actix_web::Error>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let body = match payload {
        Ok(body) => body.into_inner(),
        Err(_) => {
            state.auth.authenticate(authorization.as_str()).await?;
            return Err(Error::invalid_request(INVALID_PAYLOAD_MESSAGE));
        }
    };
    let profile = state
        .auth
        .update_profile(
            authorization.as_str(),
            UpdateProfileRequest::new(&body.phone, &body.name),
        )
        .await?;
    Ok(web::Json(profile.into()))
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
