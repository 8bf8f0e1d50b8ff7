use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod clock;

/// # Summary
/// 操作信号枚举，AI 决策的三种可能输出。
///
/// # Invariants
/// - 序列化形式固定为大写 "BUY" / "SELL" / "HOLD"。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Signal {
    // 建议买入 / 加仓
    #[serde(rename = "BUY")]
    Buy,
    // 建议卖出
    #[serde(rename = "SELL")]
    Sell,
    // 建议持有 / 观望
    #[serde(rename = "HOLD")]
    Hold,
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

impl Signal {
    /// 信号的中文展示文本（用于通知标题等场景）
    pub fn label_cn(&self) -> &'static str {
        match self {
            Signal::Buy => "买入",
            Signal::Sell => "卖出",
            Signal::Hold => "持有",
        }
    }
}

/// # Summary
/// K 线周期枚举，约定与行情服务交互时的周期标识。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum KlinePeriod {
    // 日线
    Day,
    // 30 分钟线
    Minute30,
    // 5 分钟线
    Minute5,
}

impl KlinePeriod {
    /// 行情服务识别的周期参数值
    pub fn as_query(&self) -> &'static str {
        match self {
            KlinePeriod::Day => "day",
            KlinePeriod::Minute30 => "minute30",
            KlinePeriod::Minute5 => "minute5",
        }
    }
}

impl std::fmt::Display for KlinePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query())
    }
}

/// # Summary
/// 调度模式枚举，决定分析任务的并发策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    // 智能模式：按股票数量自动选择并发或轮询
    Smart,
    // 并发模式：每只股票独立调度，受全局并发上限约束
    Concurrent,
    // 轮询模式：全部股票严格顺序执行
    Polling,
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smart" => Ok(AnalysisMode::Smart),
            "concurrent" => Ok(AnalysisMode::Concurrent),
            "polling" => Ok(AnalysisMode::Polling),
            _ => Err(format!("Unknown analysis mode: {}", s)),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Smart => write!(f, "smart"),
            AnalysisMode::Concurrent => write!(f, "concurrent"),
            AnalysisMode::Polling => write!(f, "polling"),
        }
    }
}

/// 分价格转换为元。行情服务的价格字段统一以"分"为整数单位传输。
pub fn price_to_yuan(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// 分金额转换为元
pub fn amount_to_yuan(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// 手数转换为股数（A 股 1 手 = 100 股）
pub fn hands_to_shares(hands: i64) -> i64 {
    hands * 100
}
