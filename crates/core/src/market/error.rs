use thiserror::Error;

/// # Summary
/// 行情服务错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum MarketError {
    /// 网络连接、超时或非 2xx 状态
    #[error("Network error: {0}")]
    Network(String),

    /// 响应体解码失败
    #[error("Parse error: {0}")]
    Parse(String),

    /// 行情服务未返回目标数据
    #[error("Data not found")]
    NotFound,

    /// 行情服务返回的业务错误
    #[error("Upstream error: {0}")]
    Upstream(String),
}
