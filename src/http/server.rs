//! Demo HTTP server.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handlers
//! - Wire up middleware (tracing, timeout)
//! - Give every request its own `MemoryHost` + `ResponseFacade`
//! - Turn the host into an axum response once the handler returns
//!
//! Axum owns the socket; handlers only touch the façade.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::FacadeConfig;
use crate::error::ResponseError;
use crate::host::{Host, MemoryHost};
use crate::http::cookie::CookieOptions;
use crate::http::response::ResponseFacade;

/// Name of the cookie set by `/login`.
pub const SESSION_COOKIE: &str = "session";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FacadeConfig>,
}

impl AppState {
    fn facade(&self) -> ResponseFacade<MemoryHost> {
        ResponseFacade::new(MemoryHost::new(), self.config.clone())
    }
}

type HandlerResult = Result<MemoryHost, ResponseError>;

/// HTTP server hosting the façade demo routes.
pub struct HttpServer {
    router: Router,
    config: Arc<FacadeConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: FacadeConfig) -> Self {
        let config = Arc::new(config);
        let state = AppState { config: config.clone() };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &FacadeConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/download/{name}", get(download))
            .route("/redirect", get(redirect))
            .route("/cache/{secs}", get(cache_for))
            .route("/login", get(login))
            .route("/logout", get(logout))
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        let status = match self {
            ResponseError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ResponseError::InvalidState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %self, status = %status, "Response rejected");
        (status, self.to_string()).into_response()
    }
}

async fn index(State(state): State<AppState>) -> HandlerResult {
    let mut res = state.facade();
    res.set_content_type("text/html", Some("utf-8"))?;
    res.set_expiration(None)?;
    res.host_mut()
        .write_body("<!DOCTYPE html>\n<html><body><p>response-facade demo</p></body></html>\n");
    Ok(res.into_host())
}

async fn download(State(state): State<AppState>, Path(name): Path<String>) -> HandlerResult {
    let mut res = state.facade();
    res.set_content_type("application/octet-stream", None)?;
    res.send_as_file(&name)?;
    res.host_mut().write_body(&format!("contents of {}\n", name));
    Ok(res.into_host())
}

#[derive(Debug, Deserialize)]
struct RedirectParams {
    to: String,
    code: Option<u16>,
}

async fn redirect(State(state): State<AppState>, Query(params): Query<RedirectParams>) -> HandlerResult {
    let mut res = state.facade();
    res.redirect_with(&params.to, params.code.unwrap_or(302))?;
    Ok(res.into_host())
}

async fn cache_for(State(state): State<AppState>, Path(secs): Path<u64>) -> HandlerResult {
    let mut res = state.facade();
    res.set_content_type("text/plain", Some("utf-8"))?;
    res.set_expiration(Some(Duration::from_secs(secs).into()))?;
    res.host_mut().write_body(&format!("cacheable for {} seconds\n", secs));
    Ok(res.into_host())
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    user: String,
}

async fn login(State(state): State<AppState>, Query(params): Query<LoginParams>) -> HandlerResult {
    let mut res = state.facade();
    let expires = res.host().now() + chrono::TimeDelta::hours(1);
    let options = CookieOptions::default()
        .expires(expires)
        .same_site(state.config.cookies.same_site);
    res.set_cookie(SESSION_COOKIE, &params.user, options)?;
    res.set_status(204, None)?;
    Ok(res.into_host())
}

async fn logout(State(state): State<AppState>) -> HandlerResult {
    let mut res = state.facade();
    let options = CookieOptions::default().same_site(state.config.cookies.same_site);
    res.delete_cookie(SESSION_COOKIE, options)?;
    res.set_status(204, None)?;
    Ok(res.into_host())
}

async fn not_found(State(state): State<AppState>) -> HandlerResult {
    let mut res = state.facade();
    res.set_status(404, None)?;
    res.set_content_type("text/plain", Some("utf-8"))?;
    res.host_mut().write_body("not found\n");
    Ok(res.into_host())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
