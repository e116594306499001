//! HTTP server for recipebox.
//!
//! Serves the recipe API under `/api/recipes` and everything else from the
//! public directory. Every response carries permissive cross-origin headers
//! and `OPTIONS` is answered directly with 204.

pub mod api;
pub mod assets;
pub mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::RecipeStore;

/// Allowed methods advertised to browsers.
pub const ALLOWED_METHODS: &str = "GET,POST,DELETE,OPTIONS";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The recipe catalog.
    pub store: Arc<RecipeStore>,
    /// Root directory for static assets.
    pub public_dir: Arc<PathBuf>,
}

impl AppState {
    /// Create handler state from a store and a public directory.
    #[must_use]
    pub fn new(store: RecipeStore, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(store),
            public_dir: Arc::new(public_dir.into()),
        }
    }

    /// Create handler state from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RecipeStore::new(config.catalog_path()),
            config.paths.public_dir.clone(),
        )
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let recipes = get(api::list_recipes)
        .post(api::create_recipe)
        .delete(api::delete_recipes);

    Router::new()
        .route("/api/recipes", recipes.clone())
        .route("/api/recipes/", recipes)
        .method_not_allowed_fallback(assets::serve_asset)
        .fallback(assets::serve_asset)
        .layer(middleware::from_fn(cross_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answer preflight requests and stamp cross-origin headers on every response.
async fn cross_origin(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Bind `host:base_port`, moving to the next port while the current one is taken.
///
/// At most `max_retries` extra ports are tried, pausing `delay` between
/// attempts.
///
/// # Errors
///
/// Returns [`Error::PortsExhausted`] when every port in the window is in
/// use, or [`Error::Bind`] for any other bind failure.
pub async fn bind_with_retry(
    host: &str,
    base_port: u16,
    max_retries: u32,
    delay: Duration,
) -> Result<TcpListener> {
    let mut port = base_port;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let addr = format!("{host}:{port}");

        match TcpListener::bind(&addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                warn!("Port {port} is in use");
                let next = port.checked_add(1).filter(|_| attempts <= max_retries);
                let Some(next) = next else {
                    return Err(Error::PortsExhausted {
                        base_port,
                        attempts,
                    });
                };
                info!("Trying port {next} ({attempts}/{max_retries})");
                tokio::time::sleep(delay).await;
                port = next;
            }
            Err(source) => return Err(Error::Bind { addr, source }),
        }
    }
}

/// Run the server until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if no port could be bound or the server fails.
pub async fn run(config: &Config) -> Result<()> {
    let state = AppState::from_config(config);
    if !state.public_dir.is_dir() {
        warn!(
            "Public directory {} does not exist; static requests will 404",
            state.public_dir.display()
        );
    }
    info!("Catalog file: {}", state.store.path().display());

    let listener = bind_with_retry(
        &config.server.host,
        config.server.port,
        config.server.max_port_retries,
        config.retry_delay(),
    )
    .await?;
    let addr = listener.local_addr()?;
    info!("Static server + API running at http://{addr}/");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve when the process is asked to stop.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
