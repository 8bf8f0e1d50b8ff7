use crate::common::{amount_to_yuan, price_to_yuan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 盘口单档报价，价格以分为单位。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLevel {
    // 挂单价格（分）
    pub price: i64,
    // 挂单数量（股）
    pub number: i64,
}

/// 当日实时行情的价格栏位，全部以分为单位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteBar {
    // 最新价
    pub close: i64,
    // 今开
    pub open: i64,
    // 最高
    pub high: i64,
    // 最低
    pub low: i64,
    // 昨收
    pub last: i64,
}

/// # Summary
/// 实时行情快照，含五档盘口。
///
/// # Invariants
/// - `buy_level` / `sell_level` 按档位顺序排列（买一在前），长度至多为 5。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    // 股票代码
    pub code: String,
    // 价格栏位
    pub k: QuoteBar,
    // 总成交量（手）
    pub total_hand: i64,
    // 总成交额（分）
    pub amount: i64,
    // 内盘量（手）
    pub inside_dish: i64,
    // 外盘量（手）
    pub outer_disc: i64,
    // 现量（手）
    pub intuition: i64,
    // 涨跌率（%），行情服务可能不提供，为 0 时由指标层自行计算
    #[serde(default)]
    pub rate: f64,
    // 买五档
    pub buy_level: Vec<OrderLevel>,
    // 卖五档
    pub sell_level: Vec<OrderLevel>,
}

impl Quote {
    /// 最新价（元）
    pub fn current_price(&self) -> f64 {
        price_to_yuan(self.k.close)
    }

    /// 总成交额（元）
    pub fn amount_yuan(&self) -> f64 {
        amount_to_yuan(self.amount)
    }
}

/// 单根 K 线，价格与金额以分为单位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KlineItem {
    // K 线开始时间
    pub time: DateTime<Utc>,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    // 成交量（手）
    pub volume: i64,
    // 成交额（分）
    pub amount: i64,
}

/// # Summary
/// K 线序列。
///
/// # Invariants
/// - `list` 严格按时间升序排列：`list[0]` 最旧，`list[len-1]` 最新。
///   下游的均线、RSI、波动率窗口一律从尾部截取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KlineSeries {
    pub code: String,
    pub list: Vec<KlineItem>,
}

impl KlineSeries {
    /// 尾部最近 n 根 K 线（不足 n 根时返回全部）
    pub fn tail(&self, n: usize) -> &[KlineItem] {
        let len = self.list.len();
        &self.list[len.saturating_sub(n)..]
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// 分时数据单点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutePoint {
    // 时间（"HH:MM" 形式，由行情服务给出）
    pub time: String,
    // 成交价（分）
    pub price: i64,
    // 成交量（手）
    pub number: i64,
}

/// 当日分时序列，按时间升序
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinuteSeries {
    pub code: String,
    pub list: Vec<MinutePoint>,
}
