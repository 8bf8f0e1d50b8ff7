use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Asia::Shanghai;
use kanpan_core::common::KlinePeriod;
use kanpan_core::market::entity::{
    KlineItem, KlineSeries, MinutePoint, MinuteSeries, OrderLevel, Quote, QuoteBar,
};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::MarketData;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// # Summary
/// TDX 行情服务客户端。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，单次请求 10 秒超时。
/// - 价格、金额字段以分为整数单位透传，不在传输层做换算。
#[derive(Clone)]
pub struct TdxClient {
    /// 行情服务基地址（不含末尾斜杠）
    base_url: String,
    /// 内部使用的 HTTP 客户端
    client: Client,
}

impl TdxClient {
    /// # Summary
    /// 创建一个新的 TdxClient 实例。
    ///
    /// # Logic
    /// 1. 规范化基地址（去掉末尾斜杠）。
    /// 2. 配置 10 秒超时并初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `base_url`: 行情服务基地址，如 "http://127.0.0.1:7700"。
    ///
    /// # Returns
    /// 返回初始化后的 TdxClient。
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// 发起 GET 请求并解包行情服务的统一响应信封
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MarketError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketError::Network(format!("HTTP {}", resp.status())));
        }

        let envelope: TdxEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        if envelope.code != 0 {
            return Err(MarketError::Upstream(envelope.message));
        }

        envelope.data.ok_or(MarketError::NotFound)
    }
}

/// # Summary
/// 行情服务统一响应信封，`code != 0` 表示业务失败。
#[derive(Deserialize, Debug)]
struct TdxEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// 实时行情响应结构
#[derive(Deserialize, Debug)]
struct TdxQuote {
    code: String,
    k: TdxQuoteBar,
    total_hand: i64,
    amount: i64,
    #[serde(default)]
    inside_dish: i64,
    #[serde(default)]
    outer_disc: i64,
    #[serde(default)]
    intuition: i64,
    #[serde(default)]
    rate: f64,
    #[serde(default)]
    buy_level: Vec<TdxLevel>,
    #[serde(default)]
    sell_level: Vec<TdxLevel>,
}

/// 实时价格栏位（分）
#[derive(Deserialize, Debug)]
struct TdxQuoteBar {
    open: i64,
    high: i64,
    low: i64,
    close: i64,
    last: i64,
}

/// 盘口单档
#[derive(Deserialize, Debug)]
struct TdxLevel {
    price: i64,
    number: i64,
}

/// K 线响应结构
#[derive(Deserialize, Debug)]
struct TdxKline {
    code: String,
    #[serde(default)]
    list: Vec<TdxKlineItem>,
}

/// 单根 K 线，时间为行情服务本地时间 "YYYY-MM-DD HH:MM:SS"
#[derive(Deserialize, Debug)]
struct TdxKlineItem {
    time: String,
    open: i64,
    high: i64,
    low: i64,
    close: i64,
    volume: i64,
    #[serde(default)]
    amount: i64,
}

/// 分时响应结构
#[derive(Deserialize, Debug)]
struct TdxMinute {
    code: String,
    #[serde(default)]
    list: Vec<TdxMinutePoint>,
}

#[derive(Deserialize, Debug)]
struct TdxMinutePoint {
    time: String,
    price: i64,
    number: i64,
}

/// 把行情服务的本地时间字符串解析为 UTC 时刻（行情时间按上海时区解释）
fn parse_market_time(text: &str) -> Result<chrono::DateTime<chrono::Utc>, MarketError> {
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&format!("{} 00:00:00", text), "%Y-%m-%d %H:%M:%S")
        })
        .map_err(|e| MarketError::Parse(format!("bad kline time '{}': {}", text, e)))?;
    Shanghai
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .ok_or_else(|| MarketError::Parse(format!("ambiguous kline time '{}'", text)))
}

#[async_trait]
impl MarketData for TdxClient {
    /// # Summary
    /// 获取实时行情与五档盘口。
    ///
    /// # Logic
    /// 1. GET /api/quote?code=。
    /// 2. 解包信封并映射到领域实体，盘口档位顺序原样保留。
    async fn get_quote(&self, code: &str) -> Result<Quote, MarketError> {
        let raw: TdxQuote = self.get_data("/api/quote", &[("code", code)]).await?;

        Ok(Quote {
            code: raw.code,
            k: QuoteBar {
                close: raw.k.close,
                open: raw.k.open,
                high: raw.k.high,
                low: raw.k.low,
                last: raw.k.last,
            },
            total_hand: raw.total_hand,
            amount: raw.amount,
            inside_dish: raw.inside_dish,
            outer_disc: raw.outer_disc,
            intuition: raw.intuition,
            rate: raw.rate,
            buy_level: raw
                .buy_level
                .into_iter()
                .map(|l| OrderLevel {
                    price: l.price,
                    number: l.number,
                })
                .collect(),
            sell_level: raw
                .sell_level
                .into_iter()
                .map(|l| OrderLevel {
                    price: l.price,
                    number: l.number,
                })
                .collect(),
        })
    }

    /// # Summary
    /// 获取指定周期的最近 `count` 根 K 线。
    ///
    /// # Logic
    /// 1. GET /api/kline?code=&period=&count=。
    /// 2. 解析时间字符串（上海时区）并映射到领域实体。
    /// 3. 按时间升序排序。下游窗口计算依赖"最旧在前"这一约定，
    ///    此处不信任上游顺序，统一强制。
    async fn get_kline(
        &self,
        code: &str,
        period: KlinePeriod,
        count: usize,
    ) -> Result<KlineSeries, MarketError> {
        let count_str = count.to_string();
        let raw: TdxKline = self
            .get_data(
                "/api/kline",
                &[
                    ("code", code),
                    ("period", period.as_query()),
                    ("count", count_str.as_str()),
                ],
            )
            .await?;

        let mut list = Vec::with_capacity(raw.list.len());
        for item in raw.list {
            list.push(KlineItem {
                time: parse_market_time(&item.time)?,
                open: item.open,
                high: item.high,
                low: item.low,
                close: item.close,
                volume: item.volume,
                amount: item.amount,
            });
        }
        list.sort_by_key(|k| k.time);

        Ok(KlineSeries {
            code: raw.code,
            list,
        })
    }

    /// # Summary
    /// 获取当日（或指定日期）分时成交序列。
    async fn get_minute(
        &self,
        code: &str,
        date: Option<&str>,
    ) -> Result<MinuteSeries, MarketError> {
        let mut query: Vec<(&str, &str)> = vec![("code", code)];
        if let Some(d) = date {
            query.push(("date", d));
        }
        let raw: TdxMinute = self.get_data("/api/minute", &query).await?;

        Ok(MinuteSeries {
            code: raw.code,
            list: raw
                .list
                .into_iter()
                .map(|p| MinutePoint {
                    time: p.time,
                    price: p.price,
                    number: p.number,
                })
                .collect(),
        })
    }

    /// # Summary
    /// 连通性探测：拉取一只基准股票的实时行情。
    async fn ping(&self) -> Result<(), MarketError> {
        self.get_quote("000001").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_payload_deserializes() {
        let body = r#"{
            "code": 0,
            "message": "success",
            "data": {
                "code": "000001",
                "k": {"open": 1240, "high": 1260, "low": 1230, "close": 1250, "last": 1240},
                "total_hand": 352000,
                "amount": 4400000000,
                "inside_dish": 150000,
                "outer_disc": 202000,
                "intuition": 120,
                "rate": 0.81,
                "buy_level": [{"price": 1249, "number": 3200}],
                "sell_level": [{"price": 1250, "number": 2100}]
            }
        }"#;
        let envelope: TdxEnvelope<TdxQuote> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.code, 0);
        let quote = envelope.data.unwrap();
        assert_eq!(quote.k.close, 1250);
        assert_eq!(quote.buy_level.len(), 1);
    }

    #[test]
    fn market_time_accepts_date_only() {
        let dt = parse_market_time("2026-07-27").unwrap();
        let local = dt.with_timezone(&Shanghai);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2026-07-27 00:00");
    }

    #[test]
    fn upstream_business_error_is_surfaced() {
        let body = r#"{"code": -1, "message": "股票不存在", "data": null}"#;
        let envelope: TdxEnvelope<TdxQuote> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.code, -1);
        assert!(envelope.data.is_none());
    }
}
