//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::AuthorizationGuard;
use crate::config::Args;
use crate::credentials::Authenticator;
use crate::routes::{self, BoxBody};
use crate::types::GatehouseError;

/// Which credential store is backing the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mongo => "mongodb",
            Self::Memory => "memory",
        }
    }
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub guard: AuthorizationGuard,
    pub authenticator: Authenticator,
    pub store_backend: StoreBackend,
    pub started_at: Instant,
}

impl AppState {
    /// The guard validates with the same issuer the authenticator signs with
    pub fn new(args: Args, authenticator: Authenticator, store_backend: StoreBackend) -> Self {
        Self {
            guard: AuthorizationGuard::new(authenticator.issuer().clone()),
            args,
            authenticator,
            store_backend,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server; returns on Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<(), GatehouseError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Gatehouse listening on {} (store: {})",
        state.args.listen,
        state.store_backend.as_str()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .preserve_header_case(true)
                            .title_case_headers(true)
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(req, state).await)
}

/// Route a request to its handler
pub async fn route<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Auth routes consume the request
    if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
        return response;
    }

    match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(state),
        (Method::GET, "/version") => routes::version_info(),
        (Method::OPTIONS, _) => routes::cors_preflight(),
        _ => routes::not_found_response(&path),
    }
}
