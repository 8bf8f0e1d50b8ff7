use crate::error::ApiError;
use crate::middleware::auth::verify_token;
use crate::server::AppState;
use crate::types::{ApiResponse, RestartRequest};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// 重启响应后到信号投递之间的宽限期，保证响应先行返回
const RESTART_GRACE: Duration = Duration::from_secs(3);

/// 系统统计信息
#[utoipa::path(
    get,
    path = "/api/statistics",
    tag = "系统 (System)",
    responses(
        (status = 200, description = "统计数据")
    )
)]
pub async fn statistics(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(ApiResponse::ok(json!({
        "total_stocks": state.scheduler.stock_count(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    })))
}

/// # Summary
/// 请求重启后端进程（需要 Token 认证）。
///
/// # Logic
/// 1. 校验 `X-API-Token` 请求头或请求体 `{token}`：缺失 401，不符 403。
/// 2. 先返回 200，3 秒后向主循环投递重启信号。
/// 3. 主循环停止全部调度器并以退出码 0 退出，由外部进程管理器拉起。
#[utoipa::path(
    post,
    path = "/api/system/restart",
    tag = "系统 (System)",
    request_body = RestartRequest,
    responses(
        (status = 200, description = "重启指令已接收"),
        (status = 401, description = "未提供 Token"),
        (status = 403, description = "Token 不符")
    )
)]
pub async fn restart(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RestartRequest>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let body_token = body.as_ref().and_then(|b| b.token.as_deref());
    verify_token(&headers, body_token, &state.api_token)?;

    info!("🔄 收到重启请求，准备重启服务...");

    let restart_tx = state.restart_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(RESTART_GRACE).await;
        info!("🔄 开始执行重启...");
        let _ = restart_tx.send(()).await;
    });

    Ok(Json(ApiResponse::ok_msg(
        "重启指令已接收，服务将在3秒后重启",
        None,
    )))
}
