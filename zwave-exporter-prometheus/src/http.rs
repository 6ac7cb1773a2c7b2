//! HTTP server for the Prometheus scrape endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::registry::{self, SharedRegistry};
use crate::subscriber::SubscriptionState;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    registry: SharedRegistry,
    subscription: watch::Receiver<SubscriptionState>,
}

/// Create the HTTP router.
fn create_router(
    registry: SharedRegistry,
    subscription: watch::Receiver<SubscriptionState>,
    metrics_path: &str,
) -> Router {
    let state = AppState {
        registry,
        subscription,
    };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = state.registry.render();

    (StatusCode::OK, [(CONTENT_TYPE, registry::CONTENT_TYPE)], body).into_response()
}

async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// Ready once the subscription is acknowledged and messages are flowing in.
async fn ready_handler(State(state): State<AppState>) -> Response {
    let subscription = *state.subscription.borrow();

    if subscription == SubscriptionState::Receiving {
        (StatusCode::OK, "ready\n").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("not ready - subscription {}\n", subscription),
        )
            .into_response()
    }
}

/// HTTP server configuration.
pub struct HttpServer {
    registry: SharedRegistry,
    subscription: watch::Receiver<SubscriptionState>,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(
        registry: SharedRegistry,
        subscription: watch::Receiver<SubscriptionState>,
        listen_addr: SocketAddr,
        metrics_path: String,
    ) -> Self {
        Self {
            registry,
            subscription,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        let router = create_router(self.registry, self.subscription, &self.metrics_path);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow_and_update() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
