use crate::notify::entity::TradingSignal;
use crate::notify::error::NotifyError;
use async_trait::async_trait;

/// # Summary
/// 发送通知到外部系统的接口定义。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Summary
    /// 推送一条交易信号（渠道自行决定富文本格式）。
    ///
    /// # Arguments
    /// * `signal` - 待推送的信号载荷。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`，失败返回 `NotifyError`。
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError>;

    /// # Summary
    /// 推送一条纯文本消息。
    ///
    /// # Arguments
    /// * `message` - 文本内容。
    async fn send_message(&self, message: &str) -> Result<(), NotifyError>;
}
