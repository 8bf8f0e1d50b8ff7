use crate::common::Signal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_empty(s: &String) -> bool {
    s.is_empty()
}

/// # Summary
/// 技术指标快照。字段缺省即表示对应前置条件不满足（如 K 线根数不足），
/// 序列化时与原始 JSON 形状保持一致：缺省字段直接省略。
///
/// # Invariants
/// - 所有价格字段以元为单位。
/// - 带格式的字段（涨跌幅、RSI 等）已按展示精度渲染为字符串。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    // 最新价（元）
    pub current_price: f64,
    // 今开（元）
    pub open_price: f64,
    // 最高（元）
    pub high_price: f64,
    // 最低（元）
    pub low_price: f64,
    // 昨收（元）
    pub prev_close: f64,
    /// 涨跌幅 "%.2f%%"，昨收为 0 时缺省
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<String>,
    /// 涨跌率 "%.2f%%"，行情未提供时以涨跌幅回填，两者均不可得时为 "0.00%"
    pub rate: String,
    // 成交量（股）
    pub volume: i64,
    // 成交额（元）
    pub amount: f64,
    /// 外盘占比 "%.1f%%"，内外盘合计为 0 时缺省
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_ratio: Option<String>,
    /// 买卖盘比 "%.2f"，任一侧盘口为空时缺省
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_sell_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma20: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma60: Option<f64>,
    /// RSI(14) "%.2f"，日 K 少于 15 根时缺省
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi14: Option<String>,
    /// 近 20 日波动率 "%.2f%%"，日 K 少于 21 根时缺省
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility_20d: Option<String>,
}

/// # Summary
/// 持仓信息，持仓模式下由当前价与建仓成本推导。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingInfo {
    pub stock_code: String,
    pub stock_name: String,
    // 持仓数量（股）
    pub quantity: i64,
    // 购买价格（元/股）
    pub buy_price: f64,
    // 购买日期（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_date: Option<NaiveDate>,
    // 当前价格（元/股）
    pub current_price: f64,
    // 持仓成本（元）
    pub total_cost: f64,
    // 市值（元）
    pub market_value: f64,
    // 浮动盈亏（元）
    pub profit_loss: f64,
    // 盈亏比例（%）
    pub profit_loss_percent: f64,
}

impl HoldingInfo {
    /// # Summary
    /// 计算持仓衍生指标。
    ///
    /// # Logic
    /// 1. 成本 = 买价 × 数量，市值 = 现价 × 数量。
    /// 2. 盈亏 = 市值 − 成本，比例 = (现价 − 买价) / 买价 × 100。
    pub fn calculate(
        code: &str,
        name: &str,
        quantity: i64,
        buy_price: f64,
        current_price: f64,
        buy_date: Option<NaiveDate>,
    ) -> Self {
        let total_cost = buy_price * quantity as f64;
        let market_value = current_price * quantity as f64;
        let profit_loss = market_value - total_cost;
        let profit_loss_percent = if buy_price > 0.0 {
            (current_price - buy_price) / buy_price * 100.0
        } else {
            0.0
        };

        Self {
            stock_code: code.to_string(),
            stock_name: name.to_string(),
            quantity,
            buy_price,
            buy_date,
            current_price,
            total_cost,
            market_value,
            profit_loss,
            profit_loss_percent,
        }
    }

    /// 盈亏展示文本，如 "+500.00元 (4.17%)"
    pub fn format_profit_loss(&self) -> String {
        let sign = if self.profit_loss < 0.0 { "" } else { "+" };
        format!(
            "{}{:.2}元 ({:.2}%)",
            sign, self.profit_loss, self.profit_loss_percent
        )
    }
}

/// # Summary
/// 从 AI 回复中解析出的结构化决策。
///
/// # Invariants
/// - `confidence` 取值范围 [0, 100]。
/// - 可选价格字段缺省时记为 0（监控模式下持仓止盈/止损恒为 0）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub signal: Signal,
    pub confidence: i64,
    pub reasoning: String,
    #[serde(default)]
    pub target_price: f64,
    #[serde(default)]
    pub stop_loss: f64,
    #[serde(default)]
    pub risk_reward: String,
    #[serde(default)]
    pub position_profit_target: f64,
    #[serde(default)]
    pub position_stop_loss: f64,
}

/// # Summary
/// 单次分析的完整产出。由分析器生成，插入历史记录后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub stock_code: String,
    pub stock_name: String,
    pub current_price: f64,
    pub signal: Signal,
    pub confidence: i64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub target_price: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stop_loss: f64,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub risk_reward: String,
    pub technical_data: IndicatorSnapshot,
    pub timestamp: DateTime<Utc>,
    /// 持仓止盈价（持仓模式下有效）
    #[serde(default, skip_serializing_if = "is_zero")]
    pub position_profit_target: f64,
    /// 持仓止损价（持仓模式下有效）
    #[serde(default, skip_serializing_if = "is_zero")]
    pub position_stop_loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_info: Option<HoldingInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_info_arithmetic() {
        let info = HoldingInfo::calculate("000001", "平安银行", 1000, 12.0, 12.5, None);
        assert_eq!(info.total_cost, 12000.0);
        assert_eq!(info.market_value, 12500.0);
        assert_eq!(info.profit_loss, 500.0);
        assert!((info.profit_loss_percent - 4.1666).abs() < 0.01);
        assert!(info.format_profit_loss().starts_with("+500.00元"));
    }

    #[test]
    fn snapshot_omits_unset_fields() {
        let snapshot = IndicatorSnapshot {
            current_price: 12.5,
            rate: "0.81%".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("ma5").is_none());
        assert!(json.get("rsi14").is_none());
        assert_eq!(json["current_price"], 12.5);
    }
}
