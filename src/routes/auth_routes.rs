//! HTTP Routes for Authentication
//!
//! - POST /auth/register        - Create credentials and get a JWT token
//! - POST /auth/login           - Authenticate and get a JWT token
//! - POST /auth/logout          - Acknowledge logout (tokens are stateless)
//! - POST /auth/refresh         - Reissue a token for the current identity
//! - POST /auth/change-password - Replace the password of the current identity
//! - GET  /auth/me              - Current identity from the token

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AuthOutcome, AuthStatus, Identity};
use crate::credentials::LoginSuccess;
use crate::routes::response::{
    cors_preflight, error_json, error_response, json_response, rejection_response,
    with_auth_status, BoxBody,
};
use crate::server::AppState;
use crate::types::GatehouseError;

/// Largest accepted request body in bytes
pub const MAX_BODY_BYTES: usize = 10240;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Public registration never assigns roles; they are granted out of band
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub identifier: String,
    pub roles: Vec<String>,
    pub issued_at: i64,
    pub expires_at: i64,
    /// Seconds until expiry
    pub expires_in: i64,
}

impl From<LoginSuccess> for AuthResponse {
    fn from(success: LoginSuccess) -> Self {
        let claims = success.claims;
        Self {
            token: success.token,
            token_type: "Bearer".into(),
            expires_in: claims.exp - claims.iat,
            identifier: claims.sub,
            roles: claims.roles,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub identifier: String,
    pub roles: Vec<String>,
    pub issued_at: i64,
    pub expires_at: i64,
    /// Seconds left on the presented token
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Request Helpers
// =============================================================================

async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, GatehouseError>
where
    T: for<'de> Deserialize<'de>,
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| GatehouseError::BadRequest(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(GatehouseError::BadRequest("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| GatehouseError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Run the guard; on rejection the ready-made 401 is returned as `Err`
fn authorize<B>(req: &Request<B>, state: &AppState) -> Result<Identity, Response<BoxBody>> {
    let outcome = state.guard.authorize(req.headers());
    let status = outcome.status();
    match outcome {
        AuthOutcome::Authenticated(identity) => Ok(identity),
        AuthOutcome::Rejected(reason) => {
            warn!(
                path = %req.uri().path(),
                reason = reason.as_str(),
                cause = %GatehouseError::from(reason),
                "Request rejected"
            );
            Err(with_auth_status(rejection_response(reason), status))
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/register
async fn handle_register<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    match state
        .authenticator
        .register(&body.identifier, &body.password, Vec::new())
        .await
    {
        Ok(success) => json_response(StatusCode::CREATED, &AuthResponse::from(success)),
        Err(e) => {
            warn!(identifier = %body.identifier, error = %e, "Registration failed");
            error_response(&e)
        }
    }
}

/// POST /auth/login
async fn handle_login<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.identifier.is_empty() || body.password.is_empty() {
        return error_response(&GatehouseError::BadRequest(
            "Missing required fields: identifier, password".into(),
        ));
    }

    match state
        .authenticator
        .login(&body.identifier, &body.password)
        .await
    {
        Ok(success) => json_response(StatusCode::OK, &AuthResponse::from(success)),
        Err(e) => error_response(&e),
    }
}

/// POST /auth/logout
///
/// Tokens are stateless, so the client discards its copy.
async fn handle_logout() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Logged out successfully".into(),
        },
    )
}

/// POST /auth/refresh
async fn handle_refresh<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody> {
    let identity = match authorize(&req, &state) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };

    let response = match state.authenticator.refresh(&identity).await {
        Ok(success) => json_response(StatusCode::OK, &AuthResponse::from(success)),
        Err(e) => error_response(&e),
    };
    with_auth_status(response, AuthStatus::Authorized)
}

/// POST /auth/change-password
async fn handle_change_password<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let identity = match authorize(&req, &state) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };

    let response = match parse_json_body::<ChangePasswordRequest, _>(req).await {
        Err(e) => error_response(&e),
        Ok(body) => match state
            .authenticator
            .change_password(&identity, &body.current_password, &body.new_password)
            .await
        {
            Ok(()) => json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Password changed".into(),
                },
            ),
            Err(e) => error_response(&e),
        },
    };
    with_auth_status(response, AuthStatus::Authorized)
}

/// GET /auth/me
async fn handle_me<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody> {
    let identity = match authorize(&req, &state) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };

    let response = json_response(
        StatusCode::OK,
        &MeResponse {
            issued_at: identity.raw_claims.iat,
            expires_at: identity.raw_claims.exp,
            expires_in: identity.raw_claims.time_remaining(),
            identifier: identity.subject,
            roles: identity.roles,
        },
    );
    with_auth_status(response, AuthStatus::Authorized)
}

// =============================================================================
// Router
// =============================================================================

/// Handle /auth/* requests; `None` for any other path
pub async fn handle_auth_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if path != "/auth" && !path.starts_with("/auth/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/auth/register") => handle_register(req, state).await,
        (&Method::POST, "/auth/login") => handle_login(req, state).await,
        (&Method::POST, "/auth/logout") => handle_logout().await,
        (&Method::POST, "/auth/refresh") => handle_refresh(req, state).await,
        (&Method::POST, "/auth/change-password") => handle_change_password(req, state).await,
        (&Method::GET, "/auth/me") => handle_me(req, state).await,

        (_, "/auth/register")
        | (_, "/auth/login")
        | (_, "/auth/logout")
        | (_, "/auth/refresh")
        | (_, "/auth/change-password")
        | (_, "/auth/me") => error_json(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None),

        _ => {
            info!(%method, %path, "Unknown auth endpoint");
            error_json(StatusCode::NOT_FOUND, "Auth endpoint not found", None)
        }
    };

    Some(response)
}
