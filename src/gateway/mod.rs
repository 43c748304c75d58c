//! REST gateway over the scanner's [`QueryFacade`]

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::facade::QueryFacade;
use crate::shutdown::ShutdownSignal;
use state::AppState;

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/current", get(handlers::get_current_block))
        .route("/subscribe", post(handlers::subscribe))
        .route("/transactions", get(handlers::get_transactions))
        .route("/health", get(handlers::health_check));

    Router::new()
        .nest("/api/v1", api_routes)
        .with_state(state)
        // stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve the gateway on an already bound listener until `shutdown` fires
pub async fn serve(
    listener: TcpListener,
    facade: Arc<dyn QueryFacade>,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    let app = router(Arc::new(AppState::new(facade)));

    if let Ok(addr) = listener.local_addr() {
        info!("Gateway listening on http://{}", addr);
        info!("API Docs: http://{}/docs", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.requested().await })
        .await
}

/// Bind `host:port` and serve until `shutdown` fires
pub async fn run_server(
    host: &str,
    port: u16,
    facade: Arc<dyn QueryFacade>,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, facade, shutdown).await
}
