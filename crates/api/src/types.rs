//! # 响应信封与请求 DTO
//!
//! 所有接口共用 `{code, message, data}` 信封，`code = 0` 表示成功，
//! `-1` 表示失败。`data` 的具体形状由各接口自行约定。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 统一 API 响应信封
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    /// 0 = 成功，-1 = 失败
    pub code: i64,
    /// 结果描述
    pub message: String,
    /// 数据载荷（接口自定义形状）
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// 构建成功响应
    pub fn ok(data: Value) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// 构建带自定义消息的成功响应
    pub fn ok_msg(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            data,
        }
    }

    /// 构建失败响应
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            code: -1,
            message: message.into(),
            data: None,
        }
    }
}

/// 重启请求体（Token 也可经 `X-API-Token` 请求头传递）
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RestartRequest {
    /// API Token
    #[schema(example = "1122334455667788")]
    pub token: Option<String>,
}

/// 历史查询参数
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LimitQuery {
    /// 返回条数上限
    pub limit: Option<i64>,
}

/// 把 limit 参数钳制到 [1, max]，非法或缺省时取 `default`
pub fn clamp_limit(query: &LimitQuery, default: usize, max: usize) -> usize {
    match query.limit {
        Some(v) if v >= 1 && v <= max as i64 => v as usize,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped_to_range() {
        let q = |v: Option<i64>| LimitQuery { limit: v };
        assert_eq!(clamp_limit(&q(None), 20, 100), 20);
        assert_eq!(clamp_limit(&q(Some(50)), 20, 100), 50);
        assert_eq!(clamp_limit(&q(Some(0)), 20, 100), 20);
        assert_eq!(clamp_limit(&q(Some(-5)), 20, 100), 20);
        assert_eq!(clamp_limit(&q(Some(1000)), 20, 100), 20);
        assert_eq!(clamp_limit(&q(Some(100)), 20, 100), 100);
    }

    #[test]
    fn envelope_omits_null_data() {
        let body = serde_json::to_value(ApiResponse::err("失败")).unwrap();
        assert_eq!(body["code"], -1);
        assert!(body.get("data").is_none());
    }
}
