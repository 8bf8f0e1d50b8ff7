//! # 自检接口
//!
//! 面向运维的联通性与配置完整性检查：配置文件、行情服务、AI 配置、
//! 分析器状态，以及单只股票的端到端试分析。

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::ApiResponse;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use serde_json::{json, Value};

/// 已知的占位密钥，视为未配置
const PLACEHOLDER_KEY: &str = "sk-test-key-placeholder";

/// 单项检查：配置文件可读且为合法 JSON
async fn check_config_file(state: &AppState) -> Value {
    match state.config_store.raw().await {
        Ok(_) => json!({
            "name": "配置文件检查",
            "status": "passed",
            "message": "配置文件存在且可读",
        }),
        Err(e) => json!({
            "name": "配置文件检查",
            "status": "failed",
            "message": format!("配置文件不存在或无法读取: {}", e),
        }),
    }
}

/// 单项检查：行情服务连通性
async fn check_tdx(state: &AppState) -> Value {
    let url = state
        .config_store
        .raw()
        .await
        .ok()
        .and_then(|cfg| cfg.get("tdx_api_url").and_then(Value::as_str).map(String::from))
        .unwrap_or_default();

    match state.market.ping().await {
        Ok(()) => json!({
            "name": "TDX API连接",
            "status": "passed",
            "message": "TDX API连接正常",
            "data": { "url": url },
        }),
        Err(e) => json!({
            "name": "TDX API连接",
            "status": "failed",
            "message": format!("无法连接到TDX API ({}): {}", url, e),
            "data": { "url": url },
        }),
    }
}

/// 单项检查：AI 提供商与密钥配置
async fn check_ai(state: &AppState) -> Value {
    let cfg = match state.config_store.raw().await {
        Ok(cfg) => cfg,
        Err(e) => {
            return json!({
                "name": "AI配置检查",
                "status": "failed",
                "message": format!("无法读取配置文件: {}", e),
            });
        }
    };

    let Some(ai) = cfg.get("ai_config").and_then(Value::as_object) else {
        return json!({
            "name": "AI配置检查",
            "status": "failed",
            "message": "AI配置项不存在",
        });
    };

    let provider = ai.get("provider").and_then(Value::as_str).unwrap_or("");
    if provider.is_empty() {
        return json!({
            "name": "AI配置检查",
            "status": "failed",
            "message": "AI提供商未配置",
        });
    }

    let key_of = |field: &str| {
        ai.get(field)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    let has_key = match provider {
        "deepseek" => {
            let key = key_of("deepseek_key");
            !key.is_empty() && key != PLACEHOLDER_KEY
        }
        "qwen" => !key_of("qwen_key").is_empty(),
        "custom" => {
            !key_of("custom_api_url").is_empty()
                && !key_of("custom_api_key").is_empty()
                && !key_of("custom_model_name").is_empty()
        }
        _ => false,
    };

    if !has_key {
        return json!({
            "name": "AI配置检查",
            "status": "warning",
            "message": format!("AI提供商已配置 ({})，但API密钥未配置或为测试值", provider),
            "data": { "provider": provider },
        });
    }

    json!({
        "name": "AI配置检查",
        "status": "passed",
        "message": format!("AI配置正常 ({})", provider),
        "data": { "provider": provider },
    })
}

/// 单项检查：分析器注册状态
fn check_analyzers(state: &AppState) -> Value {
    let count = state.scheduler.stock_count();
    if count > 0 {
        json!({
            "name": "分析器状态",
            "status": "passed",
            "message": format!("共有 {} 个分析器正在运行", count),
            "data": { "count": count },
        })
    } else {
        json!({
            "name": "分析器状态",
            "status": "failed",
            "message": "没有正在运行的分析器",
        })
    }
}

/// # Summary
/// 完整系统自检：配置文件、行情服务、AI 配置、分析器状态。
#[utoipa::path(
    post,
    path = "/api/test",
    tag = "自检 (SelfTest)",
    responses(
        (status = 200, description = "自检结果汇总")
    )
)]
pub async fn system_test(State(state): State<AppState>) -> Json<ApiResponse> {
    let tests = vec![
        check_config_file(&state).await,
        check_tdx(&state).await,
        check_ai(&state).await,
        check_analyzers(&state),
    ];

    let total = tests.len();
    let passed = tests.iter().filter(|t| t["status"] == "passed").count();
    let failed = total - passed;

    Json(ApiResponse::ok_msg(
        "系统测试完成",
        Some(json!({
            "timestamp": Utc::now()
                .with_timezone(&Shanghai)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            "tests": tests,
            "passed": passed,
            "failed": failed,
            "total": total,
            "success": failed == 0,
        })),
    ))
}

/// 行情服务连通性测试
#[utoipa::path(
    post,
    path = "/api/test/tdx",
    tag = "自检 (SelfTest)",
    responses(
        (status = 200, description = "测试结果")
    )
)]
pub async fn test_tdx(State(state): State<AppState>) -> Json<ApiResponse> {
    let result = check_tdx(&state).await;
    Json(ApiResponse::ok_msg("TDX连接测试完成", Some(result)))
}

/// AI 配置完整性测试
#[utoipa::path(
    post,
    path = "/api/test/ai",
    tag = "自检 (SelfTest)",
    responses(
        (status = 200, description = "测试结果")
    )
)]
pub async fn test_ai(State(state): State<AppState>) -> Json<ApiResponse> {
    let result = check_ai(&state).await;
    Json(ApiResponse::ok_msg("AI配置测试完成", Some(result)))
}

/// 单只股票的端到端试分析
#[utoipa::path(
    post,
    path = "/api/test/stock/{code}",
    tag = "自检 (SelfTest)",
    params(
        ("code" = String, Path, description = "6 位股票代码")
    ),
    responses(
        (status = 200, description = "测试完成"),
        (status = 400, description = "测试分析失败")
    )
)]
pub async fn test_stock(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    match state.scheduler.trigger_analysis(&code).await {
        Ok(result) => Ok(Json(ApiResponse::ok_msg(
            "股票分析测试完成",
            Some(json!({
                "stock_code": code,
                "result": result,
                "success": true,
            })),
        ))),
        Err(e) => Err(ApiError::BadRequest(format!("测试分析失败: {}", e))),
    }
}
