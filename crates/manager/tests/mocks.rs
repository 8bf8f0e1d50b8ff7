//! 调度器测试用的端口桩实现。

use async_trait::async_trait;
use kanpan_analysis::analyzer::{AnalysisConfig, StockAnalyzer};
use kanpan_core::common::KlinePeriod;
use kanpan_core::llm::error::LlmError;
use kanpan_core::llm::port::LlmPort;
use kanpan_core::market::entity::{
    KlineItem, KlineSeries, MinuteSeries, OrderLevel, Quote, QuoteBar,
};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::MarketData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 返回固定行情数据的桩实现
pub struct MockMarket;

#[async_trait]
impl MarketData for MockMarket {
    async fn get_quote(&self, code: &str) -> Result<Quote, MarketError> {
        Ok(Quote {
            code: code.to_string(),
            k: QuoteBar {
                close: 1250,
                open: 1240,
                high: 1260,
                low: 1230,
                last: 1240,
            },
            total_hand: 10_000,
            amount: 12_500_000,
            inside_dish: 4_000,
            outer_disc: 6_000,
            intuition: 50,
            rate: 0.0,
            buy_level: vec![OrderLevel {
                price: 1249,
                number: 100,
            }],
            sell_level: vec![OrderLevel {
                price: 1250,
                number: 100,
            }],
        })
    }

    async fn get_kline(
        &self,
        code: &str,
        _period: KlinePeriod,
        count: usize,
    ) -> Result<KlineSeries, MarketError> {
        let base = chrono::Utc::now() - chrono::Duration::days(count as i64);
        Ok(KlineSeries {
            code: code.to_string(),
            list: (0..count)
                .map(|i| KlineItem {
                    time: base + chrono::Duration::days(i as i64),
                    open: 1240,
                    high: 1260,
                    low: 1230,
                    close: 1250,
                    volume: 1000,
                    amount: 1_250_000,
                })
                .collect(),
        })
    }

    async fn get_minute(
        &self,
        code: &str,
        _date: Option<&str>,
    ) -> Result<MinuteSeries, MarketError> {
        Ok(MinuteSeries {
            code: code.to_string(),
            list: vec![],
        })
    }

    async fn ping(&self) -> Result<(), MarketError> {
        Ok(())
    }
}

/// # Summary
/// 记录在途并发数的 AI 桩实现，用于断言调度器的并发上限。
pub struct TrackingLlm {
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub delay: Duration,
}

impl TrackingLlm {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn observed_max(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmPort for TrackingLlm {
    async fn chat(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(r#"{"signal":"HOLD","confidence":55,"reasoning":"盘整中"}"#.to_string())
    }

    fn provider_name(&self) -> &str {
        "tracking-mock"
    }
}

/// 构建一个注入桩端口的分析器
pub fn stub_analyzer(code: &str, llm: Arc<TrackingLlm>) -> Arc<StockAnalyzer> {
    Arc::new(StockAnalyzer::new(
        Arc::new(MockMarket),
        llm,
        None,
        None,
        AnalysisConfig {
            stock_code: code.to_string(),
            stock_name: format!("股票{}", code),
            scan_interval: Duration::from_secs(60),
            enable_notification: false,
            min_confidence: 70,
            position_quantity: 0,
            buy_price: 0.0,
            buy_date: None,
        },
    ))
}
