use crate::error::ApiError;
use crate::server::AppState;
use crate::types::ApiResponse;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// 读取当前配置文件内容
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "配置 (Config)",
    responses(
        (status = 200, description = "配置 JSON"),
        (status = 500, description = "配置文件读取失败")
    )
)]
pub async fn get_config(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let raw = state.config_store.raw().await?;
    Ok(Json(ApiResponse::ok(raw)))
}

/// # Summary
/// 替换配置文件。旧文件改名为带时间戳的备份；新配置重启后生效。
#[utoipa::path(
    post,
    path = "/api/config",
    tag = "配置 (Config)",
    responses(
        (status = 200, description = "保存成功，需重启生效"),
        (status = 500, description = "配置持久化失败")
    )
)]
pub async fn save_config(
    State(state): State<AppState>,
    Json(config): Json<Value>,
) -> Result<Json<ApiResponse>, ApiError> {
    let backup = state.config_store.save(&config).await?;
    Ok(Json(ApiResponse::ok_msg(
        "配置保存成功，请重启程序使配置生效",
        Some(json!({ "backup_file": backup })),
    )))
}
