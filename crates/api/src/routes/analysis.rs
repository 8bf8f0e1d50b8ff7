use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{clamp_limit, ApiResponse, LimitQuery};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;

/// 单只股票的最新分析结果
#[utoipa::path(
    get,
    path = "/api/stock/{code}/latest",
    tag = "分析 (Analysis)",
    params(
        ("code" = String, Path, description = "6 位股票代码")
    ),
    responses(
        (status = 200, description = "最新分析结果，暂无结果时 data 为空"),
        (status = 404, description = "分析器不存在")
    )
)]
pub async fn latest_analysis(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let history = state.scheduler.history(&code, 1)?;
    match history.into_iter().next() {
        Some(result) => Ok(Json(ApiResponse::ok(json!(result)))),
        None => Ok(Json(ApiResponse::ok_msg("暂无分析结果", None))),
    }
}

/// 单只股票的历史分析记录
#[utoipa::path(
    get,
    path = "/api/stock/{code}/history",
    tag = "分析 (Analysis)",
    params(
        ("code" = String, Path, description = "6 位股票代码"),
        ("limit" = Option<i64>, Query, description = "返回条数（1-100，默认 20）")
    ),
    responses(
        (status = 200, description = "历史记录，最新在前"),
        (status = 404, description = "分析器不存在")
    )
)]
pub async fn analysis_history(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse>, ApiError> {
    let limit = clamp_limit(&query, 20, 100);
    let records = state.scheduler.history(&code, limit)?;
    Ok(Json(ApiResponse::ok(json!({
        "stock_code": code,
        "count": records.len(),
        "limit": limit,
        "records": records,
    }))))
}

/// 跨全部股票的最近分析记录（每只一条，最新在前）
#[utoipa::path(
    get,
    path = "/api/analysis/recent",
    tag = "分析 (Analysis)",
    params(
        ("limit" = Option<i64>, Query, description = "返回条数（1-50，默认 10）")
    ),
    responses(
        (status = 200, description = "最近分析记录")
    )
)]
pub async fn recent_analysis(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<ApiResponse> {
    let limit = clamp_limit(&query, 10, 50);
    let records = state.scheduler.recent_across_all(limit);
    Json(ApiResponse::ok(json!({
        "count": records.len(),
        "limit": limit,
        "records": records,
    })))
}

/// # Summary
/// 手动触发一次同步分析。交易时段检查照常生效：
/// 非交易时段触发会得到 400 与"非交易时段"信息。
#[utoipa::path(
    post,
    path = "/api/stock/{code}/analyze",
    tag = "分析 (Analysis)",
    params(
        ("code" = String, Path, description = "6 位股票代码")
    ),
    responses(
        (status = 200, description = "分析完成"),
        (status = 400, description = "触发分析失败"),
        (status = 404, description = "分析器不存在")
    )
)]
pub async fn trigger_analysis(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let result = state.scheduler.trigger_analysis(&code).await?;
    Ok(Json(ApiResponse::ok_msg("分析完成", Some(json!(result)))))
}
