//! REST handlers over the [`QueryFacade`](crate::facade::QueryFacade)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};

use super::state::{AppState, BUILD_VERSION};
use super::types::{
    AddressQuery, ApiError, ApiResponse, ApiResult, CurrentBlockResponse, HealthResponse,
    SubscribeRequest, SubscribeResponse, ok,
};
use crate::models::TransactionRecord;

/// Current ledger cursor
///
/// GET /api/v1/current
#[utoipa::path(
    get,
    path = "/api/v1/current",
    responses(
        (status = 200, description = "Last block processed by the forward scan", body = CurrentBlockResponse)
    ),
    tag = "Indexer"
)]
pub async fn get_current_block(State(state): State<Arc<AppState>>) -> ApiResult<CurrentBlockResponse> {
    ok(CurrentBlockResponse {
        block: state.facade.current_block(),
    })
}

/// Subscribe an address
///
/// POST /api/v1/subscribe
#[utoipa::path(
    post,
    path = "/api/v1/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "subscribed=false if already subscribed", body = SubscribeResponse),
        (status = 400, description = "Malformed body or missing address")
    ),
    tag = "Indexer"
)]
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> ApiResult<SubscribeResponse> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    if req.address.is_empty() {
        return ApiError::bad_request("missing address").into_err();
    }

    ok(SubscribeResponse {
        subscribed: state.facade.subscribe(&req.address),
    })
}

/// List transactions of a subscribed address
///
/// GET /api/v1/transactions?address=0x...
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(AddressQuery),
    responses(
        (status = 200, description = "Inbound and outbound records in arrival order", body = [TransactionRecord]),
        (status = 400, description = "Missing address")
    ),
    tag = "Indexer"
)]
pub async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<Vec<TransactionRecord>> {
    let address = query
        .address
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing address"))?;

    ok(state.facade.get_transactions(&address))
}

/// Health check endpoint
///
/// Always 200 while the process serves requests. A cursor that stops moving
/// is the signal to watch for RPC trouble.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
        current_block: state.facade.current_block(),
        subscriptions: state.facade.subscription_count(),
        version: BUILD_VERSION.to_string(),
    }))
}
