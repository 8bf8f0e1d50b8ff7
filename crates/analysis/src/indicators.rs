//! 技术指标计算。纯函数，不做任何 I/O。
//!
//! K 线序列按时间升序排列，所有窗口一律从尾部截取。

use kanpan_core::analysis::entity::IndicatorSnapshot;
use kanpan_core::common::{amount_to_yuan, hands_to_shares, price_to_yuan};
use kanpan_core::market::entity::{KlineItem, KlineSeries, Quote};

/// # Summary
/// 基于实时行情与日 K 线计算技术指标快照。
///
/// # Logic
/// 1. 价格栏位直接取自行情快照，换算为元。
/// 2. 涨跌幅、内外盘比、买卖盘比按前置条件计算，不满足则缺省。
/// 3. MA5/10/20/60、RSI(14)、20 日波动率取日 K 尾部窗口，根数不足则缺省。
///
/// # Arguments
/// * `quote` - 实时行情快照。
/// * `day_kline` - 日 K 线（时间升序）。
/// * `_min30_kline` - 30 分钟 K 线，当前指标集未使用，保留以便扩展短周期指标。
pub fn compute_indicators(
    quote: &Quote,
    day_kline: &KlineSeries,
    _min30_kline: &KlineSeries,
) -> IndicatorSnapshot {
    let mut data = IndicatorSnapshot {
        current_price: price_to_yuan(quote.k.close),
        open_price: price_to_yuan(quote.k.open),
        high_price: price_to_yuan(quote.k.high),
        low_price: price_to_yuan(quote.k.low),
        prev_close: price_to_yuan(quote.k.last),
        volume: hands_to_shares(quote.total_hand),
        amount: amount_to_yuan(quote.amount),
        rate: "0.00%".to_string(),
        ..Default::default()
    };

    // 涨跌幅
    if quote.k.last > 0 {
        let change = (quote.k.close - quote.k.last) as f64 / quote.k.last as f64 * 100.0;
        data.change_percent = Some(format!("{:.2}%", change));
    }

    // 涨跌率：优先使用行情服务给出的 rate，缺省时回退为自行计算
    if quote.rate != 0.0 {
        data.rate = format!("{:.2}%", quote.rate);
    } else if quote.k.last > 0 {
        let rate = (quote.k.close - quote.k.last) as f64 / quote.k.last as f64 * 100.0;
        data.rate = format!("{:.2}%", rate);
    }

    // 内外盘比
    if quote.inside_dish + quote.outer_disc > 0 {
        let outer_ratio =
            quote.outer_disc as f64 / (quote.inside_dish + quote.outer_disc) as f64 * 100.0;
        data.outer_ratio = Some(format!("{:.1}%", outer_ratio));
    }

    // 买卖盘力度
    if !quote.buy_level.is_empty() && !quote.sell_level.is_empty() {
        let buy_power: i64 = quote.buy_level.iter().map(|l| l.number).sum();
        let sell_power: i64 = quote.sell_level.iter().map(|l| l.number).sum();
        if sell_power > 0 {
            data.buy_sell_ratio = Some(format!("{:.2}", buy_power as f64 / sell_power as f64));
        }
    }

    // 均线
    data.ma5 = moving_average(day_kline, 5);
    data.ma10 = moving_average(day_kline, 10);
    data.ma20 = moving_average(day_kline, 20);
    data.ma60 = moving_average(day_kline, 60);

    // RSI(14)：需要 15 根日 K 才能构成 14 个涨跌差
    if day_kline.len() >= 15 {
        data.rsi14 = Some(format!("{:.2}", rsi(&day_kline.list, 14)));
    }

    // 近 20 日波动率：需要 21 根日 K 才能构成 20 个日收益率
    if day_kline.len() >= 21 {
        data.volatility_20d = Some(format!("{:.2}%", volatility(&day_kline.list, 20) * 100.0));
    }

    data
}

/// 尾部 n 日均价（元），根数不足时返回 None
fn moving_average(kline: &KlineSeries, n: usize) -> Option<f64> {
    if kline.len() < n {
        return None;
    }
    let sum: i64 = kline.tail(n).iter().map(|k| k.close).sum();
    Some(sum as f64 / n as f64 / 100.0)
}

/// # Summary
/// 简化版 RSI：尾部 `period` 个收盘差的多空强度比。
///
/// # Logic
/// 1. 累加窗口内的正向与负向收盘差。
/// 2. 无任何波动时返回中性值 50。
/// 3. 无下跌时返回 100，否则按 100 − 100/(1+RS) 计算。
fn rsi(klines: &[KlineItem], period: usize) -> f64 {
    let len = klines.len();
    if len < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in (len - period)..len {
        let change = (klines[i].close - klines[i - 1].close) as f64;
        if change > 0.0 {
            gains += change;
        } else {
            losses += -change;
        }
    }

    if gains == 0.0 && losses == 0.0 {
        // 完全无波动，多空强度未定义，取中点
        return 50.0;
    }
    if losses == 0.0 {
        return 100.0;
    }

    let rs = gains / losses;
    100.0 - 100.0 / (1.0 + rs)
}

/// 尾部 `period` 个日简单收益率的标准差
fn volatility(klines: &[KlineItem], period: usize) -> f64 {
    let len = klines.len();
    if len < period + 1 {
        return 0.0;
    }

    let mut returns = Vec::with_capacity(period);
    for i in 0..period {
        let idx = len - period + i;
        let prev = klines[idx - 1].close;
        if prev != 0 {
            returns.push((klines[idx].close - prev) as f64 / prev as f64);
        } else {
            returns.push(0.0);
        }
    }

    let mean: f64 = returns.iter().sum::<f64>() / period as f64;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / period as f64;
    variance.sqrt()
}
