use axum::Json;
use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use serde_json::{json, Value};

/// 健康检查
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "系统 (System)",
    responses(
        (status = 200, description = "服务存活")
    )
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": Utc::now()
            .with_timezone(&Shanghai)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    }))
}
