//! Response helpers shared by the route modules

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE, WWW_AUTHENTICATE,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::auth::{AuthStatus, RejectReason, AUTH_STATUS_HEADER};
use crate::types::GatehouseError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

fn add_cors_headers(response: &mut Response<BoxBody>) {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    add_cors_headers(&mut response);
    response
}

pub fn error_json(
    status: StatusCode,
    error: impl Into<String>,
    code: Option<&str>,
) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.into(),
            code: code.map(str::to_string),
        },
    )
}

/// Map a domain error onto its HTTP response.
/// Unknown identifier and wrong password share one message.
pub fn error_response(err: &GatehouseError) -> Response<BoxBody> {
    let message = match err {
        GatehouseError::CredentialNotFound(_) | GatehouseError::PasswordMismatch => {
            "Invalid credentials".to_string()
        }
        GatehouseError::AccountDisabled(_) => "Account is disabled".to_string(),
        GatehouseError::Database(_) | GatehouseError::Internal(_) | GatehouseError::Config(_) => {
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };

    error_json(err.status_code(), message, Some(err.code()))
}

/// Response for a request the guard refused
pub fn rejection_response(reason: RejectReason) -> Response<BoxBody> {
    let mut response = error_json(
        GatehouseError::from(reason).status_code(),
        reason.to_string(),
        Some(reason.as_str()),
    );
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

/// Attach the observational AuthStatus header
pub fn with_auth_status(mut response: Response<BoxBody>, status: AuthStatus) -> Response<BoxBody> {
    response
        .headers_mut()
        .insert(AUTH_STATUS_HEADER, status.header_value());
    response
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    add_cors_headers(&mut response);
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    error_json(StatusCode::NOT_FOUND, format!("Not found: {}", path), None)
}
