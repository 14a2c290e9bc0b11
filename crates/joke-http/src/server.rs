//! axum host adapter
//!
//! Every request reaches a single fallback handler that converts it into a
//! [`JokeRequest`], runs [`Application::handle`] on the blocking pool and
//! converts the result back.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::Application;
use crate::errors::{JokeError, JokeResult};
use crate::logging::log_startup_info;
use crate::request::{HttpMethod, JokeRequest};

/// Largest request body read into memory
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Server {
    app: Arc<Application>,
}

impl Server {
    pub fn new(app: Application) -> Self {
        Self { app: Arc::new(app) }
    }

    pub fn from_shared(app: Arc<Application>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    /// The axum router serving the application
    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .fallback(handle_request)
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.app))
    }

    /// Listen on the configured host and port
    pub async fn run(self) -> JokeResult<()> {
        let address = self.app.config().bind_address();
        self.listen(&address).await
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn listen(self, address: &str) -> JokeResult<()> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| JokeError::internal(format!("Invalid bind address '{}': {}", address, e)))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| JokeError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

        log_startup_info(&self.app.config().name, address);
        info!("Server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| JokeError::internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }
}

async fn handle_request(State(app): State<Arc<Application>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let method = match HttpMethod::try_from(&parts.method) {
        Ok(method) => method,
        Err(error) => return error.into_response(),
    };
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(error) => {
            return JokeError::http(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Failed to read request body: {}", error),
            )
            .into_response()
        }
    };
    let target = parts
        .uri
        .path_and_query()
        .map(|target| target.as_str())
        .unwrap_or("/");
    let request = JokeRequest::from_parts(method, target, parts.headers, body);

    match tokio::task::spawn_blocking(move || app.handle(request)).await {
        Ok(response) => response.into_axum_response(),
        Err(error) => {
            tracing::error!(error = %error, "Request task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Body::from("Internal server error")).into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!("Failed to install signal handler: {}", error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            warn!("Received terminate signal, shutting down gracefully");
        },
    }
}
