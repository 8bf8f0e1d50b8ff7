use crate::common::KlinePeriod;
use crate::market::entity::{KlineSeries, MinuteSeries, Quote};
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 市场行情数据源接口。
///
/// # Invariants
/// - 必须实现 `Send` 和 `Sync` 以支持跨线程异步调用。
/// - `get_kline` 返回的序列严格按时间升序排列（最旧在前）。
#[async_trait]
pub trait MarketData: Send + Sync {
    /// # Summary
    /// 获取实时行情与五档盘口。
    ///
    /// # Arguments
    /// * `code`: 6 位股票代码。
    ///
    /// # Returns
    /// 成功返回行情快照，失败返回 `MarketError`。
    async fn get_quote(&self, code: &str) -> Result<Quote, MarketError>;

    /// # Summary
    /// 获取指定周期的最近 `count` 根 K 线。
    ///
    /// # Arguments
    /// * `code`: 6 位股票代码。
    /// * `period`: K 线周期。
    /// * `count`: 数量上限。
    ///
    /// # Returns
    /// 成功返回按时间升序的 K 线序列，失败返回 `MarketError`。
    async fn get_kline(
        &self,
        code: &str,
        period: KlinePeriod,
        count: usize,
    ) -> Result<KlineSeries, MarketError>;

    /// # Summary
    /// 获取当日（或指定日期）的分时成交序列。
    ///
    /// # Arguments
    /// * `code`: 6 位股票代码。
    /// * `date`: "YYYY-MM-DD"，None 表示当日。
    async fn get_minute(
        &self,
        code: &str,
        date: Option<&str>,
    ) -> Result<MinuteSeries, MarketError>;

    /// 行情服务连通性探测，用于自检接口
    async fn ping(&self) -> Result<(), MarketError>;
}
