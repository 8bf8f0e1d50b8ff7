use crate::analysis::entity::AnalysisResult;
use crate::scheduler::error::SchedulerError;
use async_trait::async_trait;
use serde::Serialize;

/// 受监控股票的概要信息，控制面列表接口使用
#[derive(Debug, Clone, Serialize)]
pub struct StockSummary {
    pub code: String,
    pub name: String,
    pub enabled: bool,
}

/// # Summary
/// 调度器对控制面暴露的操作集合。
/// HTTP 层仅持有本接口句柄，不感知调度器的并发实现。
///
/// # Invariants
/// - 读操作不得阻塞正在进行的分析。
/// - `trigger_analysis` 在调用方上下文同步执行完整分析流水线。
#[async_trait]
pub trait SchedulerPort: Send + Sync {
    /// 列出全部受监控股票
    fn list_stocks(&self) -> Vec<StockSummary>;

    /// 受监控股票数量（统计接口）
    fn stock_count(&self) -> usize;

    /// # Summary
    /// 手动触发一次完整分析，成功时写入历史记录并返回结果。
    ///
    /// # Arguments
    /// * `code` - 6 位股票代码。
    async fn trigger_analysis(&self, code: &str) -> Result<AnalysisResult, SchedulerError>;

    /// # Summary
    /// 读取某只股票最近的分析记录，最新在前。
    ///
    /// # Arguments
    /// * `code` - 6 位股票代码。
    /// * `limit` - 返回条数上限。
    ///
    /// # Returns
    /// * 分析器不存在时返回 `SchedulerError::NotFound`。
    fn history(&self, code: &str, limit: usize) -> Result<Vec<AnalysisResult>, SchedulerError>;

    /// 跨全部股票取每只的最新一条，按时间倒序，截断到 `limit`
    fn recent_across_all(&self, limit: usize) -> Vec<AnalysisResult>;

    /// 关闭所有调度循环（优雅停止，不打断进行中的分析）
    fn stop_all(&self);
}
