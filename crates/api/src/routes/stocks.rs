use crate::server::AppState;
use crate::types::ApiResponse;
use axum::extract::State;
use axum::Json;
use serde_json::json;

/// 列出全部受监控股票
#[utoipa::path(
    get,
    path = "/api/stocks",
    tag = "股票 (Stocks)",
    responses(
        (status = 200, description = "股票列表")
    )
)]
pub async fn list_stocks(State(state): State<AppState>) -> Json<ApiResponse> {
    let stocks = state.scheduler.list_stocks();
    Json(ApiResponse::ok(json!({
        "total": stocks.len(),
        "stocks": stocks,
    })))
}
