//! API routes and handlers

use crate::{
    engine::{ArbitrageExecutor, EngineStatus, ExecutionResult, GasEstimate, RevertReason},
    route::{AssetId, Identity, Route},
    settlement::TradeRecord,
    utils::format_units,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Trades returned when no limit is given
const DEFAULT_TRADES_LIMIT: usize = 50;
/// Largest page of trades served at once
const MAX_TRADES_LIMIT: usize = 500;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Engine behind every handler
    pub engine: Arc<ArbitrageExecutor>,
}

/// Create the API router
pub fn create_router(engine: Arc<ArbitrageExecutor>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/execute", post(execute_route))
        .route("/api/v1/gas/estimate", post(estimate_gas))
        .route("/api/v1/gas/price", get(gas_price))
        .route("/api/v1/balance", get(custody_balance))
        .route("/api/v1/status", get(engine_status))
        .route("/api/v1/trades", get(trade_history))
        .with_state(state)
}

// ===== Route Handlers =====

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: crate::APP_NAME.to_string(),
        version: crate::VERSION.to_string(),
        executing: state.engine.is_executing(),
    })
}

/// Submit a route. Settled routes answer 200, a route turned away because
/// another is in flight 409, any other revert 422.
async fn execute_route(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> (StatusCode, Json<ExecutionResult>) {
    let result = state.engine.submit_route(&request.caller, &request.route).await;
    let status = match result.revert_reason() {
        None => StatusCode::OK,
        Some(RevertReason::Reentrancy) => StatusCode::CONFLICT,
        Some(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(result))
}

async fn estimate_gas(
    State(state): State<AppState>,
    Json(request): Json<GasEstimateRequest>,
) -> Result<Json<GasEstimate>, ApiError> {
    let max_legs = state.engine.max_legs();
    if request.legs == 0 || request.legs > max_legs {
        return Err(ApiError::BadRequest(format!("legs must be between 1 and {}", max_legs)));
    }
    Ok(Json(state.engine.estimate_gas_cost(request.legs)))
}

async fn gas_price(State(state): State<AppState>) -> Json<GasPriceResponse> {
    let gas = state.engine.gas_config();
    Json(GasPriceResponse {
        gas_price: gas.gas_price,
        max_gas_price: gas.max_gas_price,
        unit: format!("{} base units per gas", state.engine.stable_asset()),
    })
}

async fn custody_balance(State(state): State<AppState>) -> Json<BalanceResponse> {
    let balance = state.engine.custody_balance().await;
    Json(BalanceResponse {
        stable_asset: state.engine.stable_asset().clone(),
        balance,
        formatted: format_units(balance, state.engine.stable_decimals()),
    })
}

async fn engine_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.status().await)
}

async fn trade_history(
    State(state): State<AppState>,
    Query(params): Query<TradesQuery>,
) -> Json<TradesResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_TRADES_LIMIT).min(MAX_TRADES_LIMIT);
    let trades = state.engine.trade_history(limit).await;
    Json(TradesResponse {
        count: trades.len(),
        trades,
    })
}

// ===== Request/Response Types =====

/// Body of `POST /api/v1/execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Identity submitting the route
    pub caller: Identity,
    /// Route to execute
    pub route: Route,
}

/// Body of `POST /api/v1/gas/estimate`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GasEstimateRequest {
    /// Number of legs in the route
    pub legs: usize,
}

#[derive(Deserialize)]
struct TradesQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    executing: bool,
}

#[derive(Serialize)]
struct GasPriceResponse {
    gas_price: u64,
    max_gas_price: u64,
    unit: String,
}

#[derive(Serialize)]
struct BalanceResponse {
    stable_asset: AssetId,
    balance: u128,
    formatted: String,
}

#[derive(Serialize)]
struct TradesResponse {
    count: usize,
    trades: Vec<TradeRecord>,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
