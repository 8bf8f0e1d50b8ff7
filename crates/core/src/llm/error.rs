use thiserror::Error;

/// # Summary
/// 大模型调用错误枚举。
#[derive(Error, Debug)]
pub enum LlmError {
    /// 网络连接、超时或请求构建失败
    #[error("Network error: {0}")]
    Network(String),

    /// 服务端返回非 2xx 状态
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// 响应解码失败
    #[error("Parse error: {0}")]
    Parse(String),

    /// 响应中没有可用的回复内容
    #[error("Empty completion content")]
    EmptyContent,
}
