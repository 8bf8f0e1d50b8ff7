use crate::analysis::entity::{AnalysisResult, HoldingInfo, IndicatorSnapshot};
use crate::common::Signal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 推送给外部渠道的交易信号载荷。
///
/// # Invariants
/// - 与 `AnalysisResult` 一一对应，推送层不再回读历史记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub stock_code: String,
    pub stock_name: String,
    pub signal: Signal,
    // 当前价格（元）
    pub price: f64,
    // 信心度 (0-100)
    pub confidence: i64,
    pub reasoning: String,
    pub target_price: f64,
    pub stop_loss: f64,
    pub risk_reward: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_data: Option<IndicatorSnapshot>,
    // 持仓止盈价（持仓模式下有效）
    #[serde(default)]
    pub position_profit_target: f64,
    // 持仓止损价（持仓模式下有效）
    #[serde(default)]
    pub position_stop_loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_info: Option<HoldingInfo>,
}

impl From<&AnalysisResult> for TradingSignal {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            stock_code: result.stock_code.clone(),
            stock_name: result.stock_name.clone(),
            signal: result.signal,
            price: result.current_price,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
            target_price: result.target_price,
            stop_loss: result.stop_loss,
            risk_reward: result.risk_reward.clone(),
            timestamp: result.timestamp,
            technical_data: Some(result.technical_data.clone()),
            position_profit_target: result.position_profit_target,
            position_stop_loss: result.position_stop_loss,
            position_info: result.position_info.clone(),
        }
    }
}
