//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::types::{
    CurrentBlockResponse, HealthResponse, SubscribeRequest, SubscribeResponse,
};
use crate::models::TransactionRecord;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Transaction Indexer API",
        version = "1.0.0",
        description = "Per-address transaction index fed by a JSON-RPC ledger scanner.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::get_current_block,
        crate::gateway::handlers::subscribe,
        crate::gateway::handlers::get_transactions,
    ),
    components(
        schemas(
            HealthResponse,
            CurrentBlockResponse,
            SubscribeRequest,
            SubscribeResponse,
            TransactionRecord,
        )
    ),
    tags(
        (name = "Indexer", description = "Cursor, subscriptions and per-address history"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
