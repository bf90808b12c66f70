//! HTTP serving boundary.
//!
//! Artifacts are loaded once by [`AppContext::load`]; handlers only read them. A failed load
//! does not stop the process: `/health` keeps answering and `/predict` reports the load error.

mod error;
mod handlers;

pub use error::PredictError;
pub use handlers::{PredictRequest, PredictResponse, RootResponse};

use crate::artifacts::Artifacts;
use crate::config::{ServerConfig, ServiceConfig, ServingConfig};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Artifact load outcome, fixed for the lifetime of the process.
pub enum ArtifactState {
    Ready(Artifacts),
    Unavailable(String),
}

struct Inner {
    artifacts: ArtifactState,
    serving: ServingConfig,
    strict_status: bool,
    started_at: DateTime<Utc>,
}

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Inner>,
}

impl AppContext {
    pub fn new(artifacts: ArtifactState, serving: ServingConfig, server: &ServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                artifacts,
                serving,
                strict_status: server.strict_status,
                started_at: Utc::now(),
            }),
        }
    }

    pub fn load(config: &ServiceConfig) -> Self {
        let state = match Artifacts::load(&config.artifacts) {
            Ok(a) => ArtifactState::Ready(a),
            Err(e) => {
                error!(kind = e.kind(), error = %e, "artifacts unavailable; /predict will report errors");
                ArtifactState::Unavailable(e.to_string())
            }
        };
        Self::new(state, config.serving.clone(), &config.server)
    }

    pub fn artifacts(&self) -> &ArtifactState {
        &self.inner.artifacts
    }

    pub fn serving(&self) -> &ServingConfig {
        &self.inner.serving
    }

    pub fn strict_status(&self) -> bool {
        self.inner.strict_status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }
}

pub fn router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(ctx: AppContext, server: &ServerConfig) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
