//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use rstest::rstest;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn render(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let body = serde_json::from_slice(&bytes).expect("error envelope deserialises");
    (status, header, body)
}

#[rstest]
#[case(Error::invalid_request("Invalid payload: failed to parse"), StatusCode::BAD_REQUEST)]
#[case(Error::duplicate_data("phone number already registered"), StatusCode::BAD_REQUEST)]
#[case(Error::forbidden("token has expired"), StatusCode::FORBIDDEN)]
#[case(Error::service_unavailable("pool exhausted"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), expected);
}

#[rstest]
#[actix_web::test]
async fn client_errors_are_returned_verbatim() {
    let error = Error::invalid_request("name must be at least 3 characters")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "violations": ["name must be at least 3 characters"] }));

    let (status, header, body) = render(&error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body, error);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace_id() {
    let error = Error::internal("user repository error: relation \"users\" does not exist")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "sql": "SELECT" }));

    let (status, header, body) = render(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body.message(), REDACTED_MESSAGE);
    assert_eq!(body.trace_id(), Some(TRACE_ID));
    assert!(body.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn missing_trace_id_omits_the_header() {
    let (_, header, body) = render(&Error::forbidden("user not found")).await;
    assert!(header.is_none());
    assert!(body.trace_id().is_none());
}
