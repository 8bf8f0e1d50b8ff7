//! # API 统一错误处理
//!
//! 将下层各 crate 的错误类型统一映射到 HTTP 状态码与信封响应体。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kanpan_core::scheduler::error::SchedulerError;
use kanpan_store::config::StoreError;
use thiserror::Error;

use crate::types::ApiResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 认证缺失 (401)
    #[error("认证失败: {0}")]
    Unauthorized(String),

    /// 认证不通过 (403)
    #[error("权限不足: {0}")]
    Forbidden(String),

    /// 资源未找到 (404)
    #[error("{0}")]
    NotFound(String),

    /// 请求参数或业务前置条件错误 (400)
    #[error("{0}")]
    BadRequest(String),

    /// 下层内部错误 (500)
    #[error("{0}")]
    Internal(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(msg) => {
                tracing::error!("内部服务错误: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ApiResponse::err(self.to_string()));
        (status, body).into_response()
    }
}

/// 从 `SchedulerError` 转换：分析器缺失为 404，触发失败为 400
impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match &err {
            SchedulerError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SchedulerError::Analyze(_) => {
                ApiError::BadRequest(format!("触发分析失败: {}", err))
            }
        }
    }
}

/// 从 `StoreError` 转换：配置持久化失败一律 500
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
