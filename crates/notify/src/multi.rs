use async_trait::async_trait;
use kanpan_core::notify::entity::TradingSignal;
use kanpan_core::notify::error::NotifyError;
use kanpan_core::notify::port::Notifier;
use std::sync::Arc;
use tracing::error;

/// # Summary
/// 多路通知器：把同一条消息扇出到全部渠道。
///
/// # Invariants
/// - 任一渠道失败不影响其余渠道的尝试（至少一次语义）。
/// - 全部渠道尝试完毕后，失败聚合为一个 `NotifyError::Partial` 返回。
pub struct MultiNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// 聚合各渠道错误；无错误返回 Ok
    fn aggregate(errors: Vec<NotifyError>) -> Result<(), NotifyError> {
        if errors.is_empty() {
            return Ok(());
        }
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(NotifyError::Partial(format!(
            "部分通知器发送失败: {}",
            joined
        )))
    }
}

#[async_trait]
impl Notifier for MultiNotifier {
    /// # Summary
    /// 向所有渠道推送信号。
    ///
    /// # Logic
    /// 1. 逐个渠道调用 `send_signal`，失败记录日志并收集错误。
    /// 2. 全部尝试后聚合返回。本层不做重试。
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError> {
        let mut errors = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.send_signal(signal).await {
                error!("通知渠道发送失败: {}", e);
                errors.push(e);
            }
        }
        Self::aggregate(errors)
    }

    /// 向所有渠道推送纯文本消息
    async fn send_message(&self, message: &str) -> Result<(), NotifyError> {
        let mut errors = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.send_message(message).await {
                error!("通知渠道发送失败: {}", e);
                errors.push(e);
            }
        }
        Self::aggregate(errors)
    }
}
