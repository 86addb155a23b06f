//! HTTP host surface.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all edge handler
//! - Wire up middleware (tracing)
//! - Bind the listener and serve with graceful shutdown
//! - Translate the raw hyper request into the pipeline's inbound shape
//! - Map selection failures to client-facing status codes
//! - Trigger a log dispatch cycle after each handled request

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::EmulatorConfig;
use crate::edge::pipeline::{EdgePipeline, InboundRequest, PipelineError};
use crate::http::body::EdgeBody;
use crate::http::headers::Headers;
use crate::invoke::FunctionRegistry;
use crate::logs::{LogStore, SubscriptionDispatcher};
use crate::origin::OriginClient;
use crate::routing::SelectionError;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EdgePipeline>,
    pub dispatcher: Arc<SubscriptionDispatcher>,
}

/// HTTP server hosting the edge pipeline.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new server over a validated configuration and a populated
    /// function registry.
    pub fn new(
        config: Arc<EmulatorConfig>,
        registry: Arc<FunctionRegistry>,
        store: Arc<LogStore>,
    ) -> Self {
        let pipeline = Arc::new(EdgePipeline::new(
            Arc::clone(&config),
            Arc::clone(&registry),
            Arc::new(OriginClient::new()),
        ));
        let dispatcher = Arc::new(SubscriptionDispatcher::new(
            config.subscriptions.clone(),
            store,
            registry,
        ));

        let state = AppState {
            pipeline,
            dispatcher,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Edge emulator listening");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Edge emulator stopped");
        Ok(())
    }
}

/// Catch-all handler: every path on every method enters the pipeline.
async fn edge_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let inbound = match read_inbound(remote_addr, request).await {
        Ok(inbound) => inbound,
        Err(response) => return response,
    };

    let response = match state.pipeline.handle(inbound).await {
        Ok(response) => response,
        Err(error) => selection_failure(error),
    };

    // Log lines accumulated while handling this request fan out in the
    // background; the client never waits on deliveries.
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move { dispatcher.dispatch().await });

    response
}

async fn read_inbound(
    remote_addr: SocketAddr,
    request: Request<Body>,
) -> Result<InboundRequest, Response> {
    let http_version = match request.version() {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
    .to_string();

    let method = request.method().to_string();
    let raw_path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| "/".to_string());

    let mut headers = Headers::new();
    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value);
        }
    }

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => EdgeBody::from_bytes(bytes.to_vec()),
        Err(error) => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("failed to read request body: {error}"),
            )
                .into_response());
        }
    };

    Ok(InboundRequest {
        remote_addr,
        secure: false,
        http_version,
        method,
        raw_path,
        headers,
        body,
    })
}

/// A request that never resolved to an origin gets a plain status, not the
/// formatted error page; it never entered the pipeline proper.
fn selection_failure(error: PipelineError) -> Response {
    let status = match &error {
        PipelineError::MissingHost => StatusCode::BAD_REQUEST,
        PipelineError::Selection(SelectionError::HostUnmatched(_)) => StatusCode::NOT_FOUND,
        PipelineError::Selection(SelectionError::PathUnmatched { .. }) => StatusCode::NOT_FOUND,
        PipelineError::Selection(SelectionError::OriginUnmatched { .. }) => StatusCode::BAD_GATEWAY,
    };

    tracing::warn!(error = %error, status = %status, "Request did not resolve");
    (status, error.to_string()).into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
