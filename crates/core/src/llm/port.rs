use crate::llm::error::LlmError;
use async_trait::async_trait;

/// # Summary
/// 大模型对话接口。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 返回值为模型的原始回复文本，不做任何结构化处理。
#[async_trait]
pub trait LlmPort: Send + Sync {
    /// # Summary
    /// 发送一轮 system + user 对话并返回助手回复。
    ///
    /// # Arguments
    /// * `system` - 系统提示词。
    /// * `user` - 用户提示词。
    ///
    /// # Returns
    /// * 成功返回回复文本，失败返回 `LlmError`。
    async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// 供自检接口展示的提供商名称
    fn provider_name(&self) -> &str;
}
