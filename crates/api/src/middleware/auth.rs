//! # Token 鉴权
//!
//! 系统控制类接口（重启）使用单一静态 API Token 认证。
//! Token 可经请求头 `X-API-Token` 或请求体 `{token}` 传递。

use crate::error::ApiError;
use axum::http::HeaderMap;

/// 自定义 Token 请求头
pub const TOKEN_HEADER: &str = "X-API-Token";

/// # Summary
/// 校验请求携带的 API Token。
///
/// # Logic
/// 1. 优先取请求头 `X-API-Token`，缺省时回退到请求体字段。
/// 2. 两处都未提供 → 401。
/// 3. 提供但与配置不符 → 403。
///
/// # Arguments
/// * `headers` - 请求头。
/// * `body_token` - 请求体中的 token 字段。
/// * `expected` - 配置的 API Token。
pub fn verify_token(
    headers: &HeaderMap,
    body_token: Option<&str>,
    expected: &str,
) -> Result<(), ApiError> {
    let header_token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let token = match header_token.or(body_token.filter(|v| !v.is_empty())) {
        Some(t) => t,
        None => {
            tracing::warn!("重启请求未提供API Token");
            return Err(ApiError::Unauthorized(
                "未提供API Token，请在请求头中添加 'X-API-Token' 或在请求体中提供 'token' 字段"
                    .into(),
            ));
        }
    };

    if !expected.is_empty() && token != expected {
        tracing::warn!("API Token验证失败");
        return Err(ApiError::Forbidden("API Token验证失败".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_token_is_unauthorized() {
        let headers = HeaderMap::new();
        let err = verify_token(&headers, None, "secret").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn wrong_token_is_forbidden() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("nope"));
        let err = verify_token(&headers, None, "secret").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn header_token_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("secret"));
        assert!(verify_token(&headers, None, "secret").is_ok());
    }

    #[test]
    fn body_token_is_a_fallback() {
        let headers = HeaderMap::new();
        assert!(verify_token(&headers, Some("secret"), "secret").is_ok());
        assert!(verify_token(&headers, Some("wrong"), "secret").is_err());
    }
}
