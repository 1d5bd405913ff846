mod api;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use std::future::Future;
use std::sync::Arc;

// Internal imports
use crate::api::{ApiError, TravelAgentResponse};
use travel_core::config::Settings;
use travel_core::flow::TravelAgentFlow;
use travel_core::llm::Brain;
use travel_core::registry::Registry;

// Application State: the flow owns the model client and the tool catalog,
// both built once and only read afterwards.
#[derive(Clone)]
struct AppState {
    flow: Arc<TravelAgentFlow>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Travel Agent Gateway Initializing...");

    let settings = Settings::from_env().inspect_err(|e| error!("Invalid configuration: {:#}", e))?;

    let brain = Brain::new(&settings.model);

    let registry = Arc::new(Registry::load());
    info!("Loaded {} tools available for the Brain.", registry.len());

    let flow = Arc::new(TravelAgentFlow::new(Arc::new(brain), registry));
    let app = app(AppState { flow });

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting travel agent server on port {}", settings.port);

    serve(listener, app, shutdown_signal()).await
}

async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

// Resolves on Ctrl-C, or SIGTERM on unix. In-flight requests are drained.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections...");
}

fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/travelAgent",
            post(travel_agent).fallback(method_not_allowed),
        )
        // Queries of any size reach the model.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- HANDLERS ---

// Any method but POST; the body is never read.
async fn method_not_allowed() -> ApiError {
    ApiError::Method
}

async fn travel_agent(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TravelAgentResponse>, ApiError> {
    let input = api::parse_request(&body)?;
    info!("Travel query received: {}", input.user_query);

    let result = state
        .flow
        .run(&input)
        .await
        .map_err(ApiError::ModelInvocation)?;

    Ok(Json(TravelAgentResponse { result }))
}
