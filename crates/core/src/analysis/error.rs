use crate::llm::error::LlmError;
use crate::market::error::MarketError;
use thiserror::Error;

/// # Summary
/// 单次分析的错误枚举。
///
/// # Invariants
/// - `NotTradingWindow` 是预期内的跳过信号，不应按故障处理。
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// 当前处于非交易时段，本轮分析跳过
    #[error("非交易时段")]
    NotTradingWindow,

    /// 行情数据获取失败
    #[error("获取行情失败: {0}")]
    Market(#[from] MarketError),

    /// 大模型调用失败
    #[error("AI分析失败: {0}")]
    Llm(#[from] LlmError),
}
