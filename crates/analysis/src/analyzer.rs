use crate::decision::{append_warnings, parse_decision, validate_decision};
use crate::indicators::compute_indicators;
use crate::prompt::{build_analysis_prompt, SYSTEM_PROMPT};
use chrono::{NaiveDate, Utc};
use kanpan_core::analysis::entity::{AnalysisResult, HoldingInfo, IndicatorSnapshot};
use kanpan_core::analysis::error::AnalyzeError;
use kanpan_core::common::clock::TradingClock;
use kanpan_core::common::{KlinePeriod, Signal};
use kanpan_core::config::StockItem;
use kanpan_core::llm::port::LlmPort;
use kanpan_core::market::port::MarketData;
use kanpan_core::notify::entity::TradingSignal;
use kanpan_core::notify::port::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 日 K 回溯根数
const DAY_KLINE_COUNT: usize = 60;
/// 30 分钟 K 回溯根数
const MIN30_KLINE_COUNT: usize = 100;

/// # Summary
/// 单只股票的分析配置。
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub stock_code: String,
    pub stock_name: String,
    // 扫描间隔
    pub scan_interval: Duration,
    // 是否启用通知
    pub enable_notification: bool,
    // 最小信心度阈值（低于此值不发送通知）
    pub min_confidence: i64,
    // 持仓数量（股），0 表示监控模式
    pub position_quantity: i64,
    // 购买价格（元/股），0 表示监控模式
    pub buy_price: f64,
    // 购买日期（可选）
    pub buy_date: Option<NaiveDate>,
}

impl AnalysisConfig {
    /// # Summary
    /// 从股票配置项构建分析配置。
    ///
    /// # Logic
    /// 1. 扫描间隔与阈值直接取自配置项（默认值已在校验期填充）。
    /// 2. 购买日期按 "YYYY-MM-DD" 解析，失败时告警并忽略该字段。
    pub fn from_stock_item(item: &StockItem, notifications_enabled: bool) -> Self {
        let buy_date = if item.buy_date.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(&item.buy_date, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("解析购买日期失败: {}，将忽略该字段", e);
                    None
                }
            }
        };

        Self {
            stock_code: item.code.clone(),
            stock_name: item.name.clone(),
            scan_interval: item.scan_interval(),
            enable_notification: notifications_enabled,
            min_confidence: item.min_confidence,
            position_quantity: item.position_quantity,
            buy_price: item.buy_price,
            buy_date,
        }
    }

    /// 是否为持仓模式
    pub fn is_holding_mode(&self) -> bool {
        self.position_quantity > 0 && self.buy_price > 0.0
    }
}

/// # Summary
/// 单只股票的分析器，组合行情、AI、通知与交易时钟完成一次完整分析。
///
/// # Invariants
/// - 一次 `analyze()` 调用对应一次完整流水线执行，无内部重试。
/// - 解析失败不视为错误：降级为 HOLD/30 的观望结果，保证调度器有记录可存。
pub struct StockAnalyzer {
    market: Arc<dyn MarketData>,
    llm: Arc<dyn LlmPort>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<TradingClock>,
    pub config: AnalysisConfig,
}

impl StockAnalyzer {
    pub fn new(
        market: Arc<dyn MarketData>,
        llm: Arc<dyn LlmPort>,
        notifier: Option<Arc<dyn Notifier>>,
        clock: Option<TradingClock>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            market,
            llm,
            notifier,
            clock,
            config,
        }
    }

    /// # Summary
    /// 执行单次分析。
    ///
    /// # Logic
    /// 1. 交易时段检查，不在时段内返回 `NotTradingWindow`。
    /// 2. 拉取实时行情、60 根日 K、100 根 30 分钟 K；分时失败降级为无分时。
    /// 3. 计算技术指标，持仓模式下推导持仓信息。
    /// 4. 组装提示词并调用 AI。
    /// 5. 解析并校验决策，组装分析结果。
    /// 6. 启用通知且信心度达到阈值时推送（三种信号均可推送，仅由阈值把关）。
    ///
    /// # Returns
    /// * 行情或 AI 失败返回对应错误（不产生结果）；解析失败仍返回降级结果。
    pub async fn analyze(&self) -> Result<AnalysisResult, AnalyzeError> {
        let now = Utc::now();
        if let Some(clock) = &self.clock {
            if !clock.is_trading(now) {
                let status = clock.status(now);
                info!(
                    "非交易时段，跳过分析 | 下次交易时间: {}",
                    status.next_trading_time.as_deref().unwrap_or("未知")
                );
                return Err(AnalyzeError::NotTradingWindow);
            }
        }

        info!(
            "📊 开始分析股票 {}({})...",
            self.config.stock_name, self.config.stock_code
        );

        let code = self.config.stock_code.as_str();
        let quote = self.market.get_quote(code).await?;
        let day_kline = self
            .market
            .get_kline(code, KlinePeriod::Day, DAY_KLINE_COUNT)
            .await?;
        let min30_kline = self
            .market
            .get_kline(code, KlinePeriod::Minute30, MIN30_KLINE_COUNT)
            .await?;

        // 分时数据在非交易时间可能取不到，降级为无分时继续分析
        let minute = match self.market.get_minute(code, None).await {
            Ok(series) => Some(series),
            Err(e) => {
                warn!("获取分时数据失败（可能非交易时间）: {}", e);
                None
            }
        };

        let technical = compute_indicators(&quote, &day_kline, &min30_kline);

        let holding = if self.config.is_holding_mode() {
            Some(HoldingInfo::calculate(
                &self.config.stock_code,
                &self.config.stock_name,
                self.config.position_quantity,
                self.config.buy_price,
                technical.current_price,
                self.config.buy_date,
            ))
        } else {
            None
        };

        let prompt = build_analysis_prompt(
            &self.config.stock_code,
            &self.config.stock_name,
            &quote,
            &day_kline,
            &min30_kline,
            minute.as_ref(),
            &technical,
            holding.as_ref(),
            now,
        );

        info!("🤖 调用AI进行深度分析...");
        let reply = self.llm.chat(SYSTEM_PROMPT, &prompt).await?;

        let result = self.build_result(&reply, technical, holding);

        if self.config.enable_notification && result.confidence >= self.config.min_confidence {
            self.send_notification(&result).await;
        }

        Ok(result)
    }

    /// # Summary
    /// 从 AI 回复组装分析结果。
    ///
    /// # Logic
    /// 1. 解析失败：记录原始回复并降级为 HOLD/30 观望结果。
    /// 2. 解析成功：执行价格合理性校验，警告追加到 reasoning。
    fn build_result(
        &self,
        reply: &str,
        technical: IndicatorSnapshot,
        holding: Option<HoldingInfo>,
    ) -> AnalysisResult {
        let current_price = technical.current_price;

        let mut decision = match parse_decision(reply) {
            Ok(decision) => decision,
            Err(e) => {
                warn!("AI响应解析失败: {}", e);
                warn!("AI原始响应:\n{}", reply);
                return AnalysisResult {
                    stock_code: self.config.stock_code.clone(),
                    stock_name: self.config.stock_name.clone(),
                    current_price,
                    signal: Signal::Hold,
                    confidence: 30,
                    reasoning: format!("AI响应解析失败，建议观望。原始响应: {}", reply),
                    target_price: 0.0,
                    stop_loss: 0.0,
                    risk_reward: String::new(),
                    technical_data: technical,
                    timestamp: Utc::now(),
                    position_profit_target: 0.0,
                    position_stop_loss: 0.0,
                    position_info: holding,
                };
            }
        };

        let warnings = validate_decision(&decision, current_price);
        if !warnings.is_empty() {
            warn!("决策验证警告:");
            for w in &warnings {
                warn!("   - {}", w);
            }
            append_warnings(&mut decision.reasoning, &warnings);
        }

        let result = AnalysisResult {
            stock_code: self.config.stock_code.clone(),
            stock_name: self.config.stock_name.clone(),
            current_price,
            signal: decision.signal,
            confidence: decision.confidence,
            reasoning: decision.reasoning,
            target_price: decision.target_price,
            stop_loss: decision.stop_loss,
            risk_reward: decision.risk_reward,
            technical_data: technical,
            timestamp: Utc::now(),
            position_profit_target: decision.position_profit_target,
            position_stop_loss: decision.position_stop_loss,
            position_info: holding,
        };

        info!(
            "✓ AI决策: {} | 信号: {} | 信心度: {}%",
            result.stock_name, result.signal, result.confidence
        );
        if result.signal == Signal::Buy {
            info!(
                "  目标价: {:.2} | 止损价: {:.2} | 风险回报比: {}",
                result.target_price, result.stop_loss, result.risk_reward
            );
        }

        result
    }

    /// 推送通知；失败只记录日志，不影响分析结果
    async fn send_notification(&self, result: &AnalysisResult) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let signal = TradingSignal::from(result);
        match notifier.send_signal(&signal).await {
            Ok(()) => info!("✅ 已发送{}信号通知", result.signal),
            Err(e) => error!("❌ 发送通知失败: {}", e),
        }
    }
}
