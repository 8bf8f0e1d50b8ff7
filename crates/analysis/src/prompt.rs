//! AI 分析提示词模板。
//!
//! 提示词是与模型之间的契约：输出形状、模式选择与统一的判定口径只在
//! 这里表达。模板改动应保持可审阅，所有替换槽位集中在本模块。

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Shanghai;
use kanpan_core::analysis::entity::{HoldingInfo, IndicatorSnapshot};
use kanpan_core::common::{amount_to_yuan, price_to_yuan};
use kanpan_core::market::entity::{KlineSeries, MinuteSeries, Quote};

/// 系统提示词
pub const SYSTEM_PROMPT: &str = "你是一位专业的A股分析师，精通技术分析和市场研判。";

/// 分时数据最多渲染的行数
const MAX_TICK_ROWS: usize = 20;

fn fmt_opt_price(v: Option<f64>) -> String {
    match v {
        Some(p) => format!("{:.2}元", p),
        None => "数据不足".to_string(),
    }
}

fn fmt_opt_text(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("数据不足")
}

/// # Summary
/// 组装单次分析的用户提示词。
///
/// # Logic
/// 1. 头部：代码、名称、分析时间（上海时区）。
/// 2. 实时行情块 + 五档盘口 + 技术指标块。
/// 3. 持仓模式下追加持仓信息块。
/// 4. K 线概况：近 5 日日 K（从新到旧）、最近 10 条 30 分钟 K、
///    当日分时（降采样至至多 20 个点，另附最新一笔）。
/// 5. 分析要求清单与严格 JSON 输出格式（按模式二选一）。
///
/// # Arguments
/// * `holding` - 持仓信息，Some 时生成持仓模式提示词。
#[allow(clippy::too_many_arguments)]
pub fn build_analysis_prompt(
    code: &str,
    name: &str,
    quote: &Quote,
    day_kline: &KlineSeries,
    min30_kline: &KlineSeries,
    minute: Option<&MinuteSeries>,
    technical: &IndicatorSnapshot,
    holding: Option<&HoldingInfo>,
    now: DateTime<Utc>,
) -> String {
    let mut prompt = format!(
        r#"# 股票深度分析任务

你是一位专业的A股分析师，请对以下股票进行深度技术分析，并给出明确的操作建议。

## 基本信息
- **股票代码**: {code}
- **股票名称**: {name}
- **分析时间**: {time}

## 实时行情数据
- **当前价格**: {current:.2}元
- **今日开盘**: {open:.2}元
- **最高价**: {high:.2}元
- **最低价**: {low:.2}元
- **昨收价**: {prev:.2}元
- **涨跌幅**: {change}
- **涨跌率**: {rate}
- **现量**: {intuition}手（当前成交的成交量）
- **成交量**: {volume}股
- **成交额**: {amount:.2}万元
- **外盘占比**: {outer}（外盘越高说明买盘越强）
- **买卖盘比**: {ratio}（>1说明买盘强于卖盘）

## 五档盘口
**买盘**:
"#,
        code = code,
        name = name,
        time = now.with_timezone(&Shanghai).format("%Y-%m-%d %H:%M:%S"),
        current = technical.current_price,
        open = technical.open_price,
        high = technical.high_price,
        low = technical.low_price,
        prev = technical.prev_close,
        change = fmt_opt_text(&technical.change_percent),
        rate = technical.rate,
        intuition = quote.intuition,
        volume = technical.volume,
        amount = technical.amount / 10000.0,
        outer = fmt_opt_text(&technical.outer_ratio),
        ratio = fmt_opt_text(&technical.buy_sell_ratio),
    );

    for (i, level) in quote.buy_level.iter().enumerate() {
        prompt.push_str(&format!(
            "- 买{}: {:.2}元 x {}股\n",
            i + 1,
            price_to_yuan(level.price),
            level.number
        ));
    }

    prompt.push_str("\n**卖盘**:\n");
    for (i, level) in quote.sell_level.iter().enumerate() {
        prompt.push_str(&format!(
            "- 卖{}: {:.2}元 x {}股\n",
            i + 1,
            price_to_yuan(level.price),
            level.number
        ));
    }

    prompt.push_str(&format!(
        r#"
## 技术指标
- **MA5**: {ma5}
- **MA10**: {ma10}
- **MA20**: {ma20}
- **MA60**: {ma60}（季线）
- **RSI(14)**: {rsi}
- **近20日波动率**: {vol}

"#,
        ma5 = fmt_opt_price(technical.ma5),
        ma10 = fmt_opt_price(technical.ma10),
        ma20 = fmt_opt_price(technical.ma20),
        ma60 = fmt_opt_price(technical.ma60),
        rsi = fmt_opt_text(&technical.rsi14),
        vol = fmt_opt_text(&technical.volatility_20d),
    ));

    if let Some(info) = holding {
        prompt.push_str(&format!(
            r#"
## 持仓信息
- **持仓数量**: {quantity}股
- **购买价格**: {buy:.2}元/股
- **持仓成本**: {cost:.2}元
- **当前价格**: {current:.2}元/股
- **市值**: {value:.2}元
- **浮动盈亏**: {pnl}

"#,
            quantity = info.quantity,
            buy = info.buy_price,
            cost = info.total_cost,
            current = info.current_price,
            value = info.market_value,
            pnl = info.format_profit_loss(),
        ));
    }

    prompt.push_str(&format!(
        "## K线数据概况\n- **日K线**: 最近{}个交易日数据\n- **30分钟K线**: 最近{}条数据\n",
        day_kline.len(),
        min30_kline.len(),
    ));

    // 近 5 日日 K，从新到旧
    if day_kline.len() >= 5 {
        prompt.push_str("\n**近5日K线数据（OHLC）**:\n");
        for kline in day_kline.tail(5).iter().rev() {
            prompt.push_str(&format!(
                "- {}: 开{:.2} 高{:.2} 低{:.2} 收{:.2}元 | 成交量: {}手 | 成交额: {:.2}万元\n",
                kline.time.with_timezone(&Shanghai).format("%m-%d"),
                price_to_yuan(kline.open),
                price_to_yuan(kline.high),
                price_to_yuan(kline.low),
                price_to_yuan(kline.close),
                kline.volume,
                amount_to_yuan(kline.amount) / 10000.0,
            ));
        }
    }

    // 最近 10 条 30 分钟 K，从旧到新
    if !min30_kline.is_empty() {
        prompt.push_str("\n**近期30分钟K线走势（最近10条）**:\n");
        for kline in min30_kline.tail(10) {
            prompt.push_str(&format!(
                "- {}: 开{:.2} 高{:.2} 低{:.2} 收{:.2}元 | 成交量: {}手\n",
                kline.time.with_timezone(&Shanghai).format("%m-%d %H:%M"),
                price_to_yuan(kline.open),
                price_to_yuan(kline.high),
                price_to_yuan(kline.low),
                price_to_yuan(kline.close),
                kline.volume,
            ));
        }
    }

    // 当日分时，降采样后渲染
    if let Some(minute) = minute {
        if !minute.list.is_empty() {
            prompt.push_str("\n**今日分时走势（最近20个时间点）**:\n");
            let len = minute.list.len();
            let start = len.saturating_sub(MAX_TICK_ROWS);
            // 点数过多时隔点取样，避免提示词膨胀
            let step = if len > MAX_TICK_ROWS * 2 {
                len / MAX_TICK_ROWS
            } else {
                1
            };
            let mut i = start;
            while i < len {
                let item = &minute.list[i];
                prompt.push_str(&format!(
                    "- {}: {:.2}元 (成交量: {}手)\n",
                    item.time,
                    price_to_yuan(item.price),
                    item.number
                ));
                i += step;
            }
            let latest = &minute.list[len - 1];
            prompt.push_str(&format!(
                "- **最新**: {} {:.2}元\n",
                latest.time,
                price_to_yuan(latest.price)
            ));
        }
    }

    if holding.is_some() {
        prompt.push_str(HOLDING_REQUIREMENTS);
    } else {
        prompt.push_str(MONITORING_REQUIREMENTS);
    }

    prompt
}

/// 持仓模式的分析要求与输出格式
const HOLDING_REQUIREMENTS: &str = r#"
## 分析要求

请基于以上数据（包括持仓信息、K线OHLC、30分钟K线、分时数据）进行**全面的技术分析和持仓评估**，并给出明确的操作建议。分析时请考虑：

1. **趋势分析**:
   - 当前价格与均线的关系，是否处于上升/下降/盘整趋势
   - 日K线OHLC形态（如阳线、阴线、十字星等）的含义
   - 30分钟K线显示的短期趋势方向
   - 分时走势是否配合日线趋势

2. **量价关系**:
   - 成交量的变化是否支持价格走势
   - 近期成交额的增减情况
   - 现量（当前成交量）是否异常
   - 量价背离现象

3. **盘口分析**:
   - 买卖盘力量对比，五档挂单情况
   - 外盘内盘占比反映的多空力量
   - 大单情况分析

4. **技术指标**:
   - RSI是否超买超卖（>70超买，<30超卖）
   - 均线排列情况（多头/空头排列）
   - 波动率是否异常

5. **K线形态分析**:
   - 近5日K线的实体大小、上下影线长度
   - 是否有明显的反转形态（如锤子线、上吊线等）
   - 30分钟K线的短期趋势是否与日线一致

6. **持仓评估**:
   - 当前盈亏情况是否达到预期
   - 是否应该止盈或止损
   - 是否应该加仓或减仓
   - 持仓成本价与当前价格的关系
   - 结合技术分析判断最佳止盈止损位置

7. **风险评估**: 当前位置的风险收益比

**特别要求**: 如果建议卖出或持有，请根据持仓成本价和技术分析（包括K线形态、趋势、支撑阻力位），明确给出：
- **持仓止盈价**: 建议的止盈价格（元），应结合技术阻力位和持仓成本
- **持仓止损价**: 建议的止损价格（元），应结合技术支撑位和持仓成本

## 输出格式

请严格按照以下JSON格式输出（只输出JSON，不要其他文字）:

```json
{
  "signal": "BUY 或 SELL 或 HOLD",
  "confidence": 0-100的整数（信心度，越高越确定）,
  "reasoning": "详细的分析理由，包含关键技术指标、持仓评估和逻辑",
  "target_price": 目标价格（元，数字），如果是SELL或HOLD可以为0,
  "stop_loss": 止损价格（元，数字），如果是HOLD可以为0,
  "risk_reward": "风险回报比，例如 1:2 或 1:3",
  "position_profit_target": 持仓止盈价格（元，数字），基于持仓成本价和技术分析给出,
  "position_stop_loss": 持仓止损价格（元，数字），基于持仓成本价和技术分析给出
}
```

**注意事项**:
- signal: BUY（建议买入/加仓）、SELL（建议卖出）、HOLD（建议持有）
- position_profit_target: 持仓止盈价，应该高于购买价格（如果盈利）或当前价格（如果亏损但看涨）
- position_stop_loss: 持仓止损价，应该低于购买价格（如果盈利）或当前价格（如果亏损）
- 如果是当前有持仓且盈利，应谨慎评估是否需要止盈
- 如果是当前有持仓且亏损，应评估是否需要止损或加仓摊低成本
"#;

/// 监控模式的分析要求与输出格式
const MONITORING_REQUIREMENTS: &str = r#"
## 分析要求

请基于以上数据（包括K线OHLC、30分钟K线、分时数据）进行**全面的技术分析**，并给出明确的操作建议。分析时请考虑：

1. **趋势分析**:
   - 当前价格与均线的关系，是否处于上升/下降/盘整趋势
   - 日K线OHLC形态（如阳线、阴线、十字星等）的含义
   - 30分钟K线显示的短期趋势方向
   - 分时走势是否配合日线趋势

2. **量价关系**:
   - 成交量的变化是否支持价格走势
   - 近期成交额的增减情况
   - 现量（当前成交量）是否异常
   - 量价背离现象

3. **盘口分析**:
   - 买卖盘力量对比，五档挂单情况
   - 外盘内盘占比反映的多空力量
   - 大单情况分析

4. **技术指标**:
   - RSI是否超买超卖（>70超买，<30超卖）
   - 均线排列情况（多头/空头排列）
   - 波动率是否异常

5. **K线形态分析**:
   - 近5日K线的实体大小、上下影线长度
   - 是否有明显的反转形态（如锤子线、上吊线等）
   - 30分钟K线的短期趋势是否与日线一致

6. **风险评估**: 当前位置的风险收益比

## 输出格式

请严格按照以下JSON格式输出（只输出JSON，不要其他文字）:

```json
{
  "signal": "BUY 或 SELL 或 HOLD",
  "confidence": 0-100的整数（信心度，越高越确定）,
  "reasoning": "详细的分析理由，包含关键技术指标和逻辑",
  "target_price": 目标价格（元，数字），如果是SELL或HOLD可以为0,
  "stop_loss": 止损价格（元，数字），如果是HOLD可以为0,
  "risk_reward": "风险回报比，例如 1:2 或 1:3",
  "position_profit_target": 0,
  "position_stop_loss": 0
}
```

**注意事项**:
- signal只能是 "BUY"、"SELL" 或 "HOLD" 三个值之一
- confidence是0-100的整数，代表你的信心程度
- reasoning要详细说明你的分析逻辑和关键依据
- 如果是BUY信号，必须给出target_price和stop_loss
- 如果是SELL信号，应该给出止损建议
- 如果是HOLD，说明原因（如趋势不明、等待突破等）
- position_profit_target 和 position_stop_loss 在监控模式下为0
"#;
