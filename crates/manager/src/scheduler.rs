use crate::history::HistoryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use kanpan_analysis::analyzer::StockAnalyzer;
use kanpan_core::analysis::entity::AnalysisResult;
use kanpan_core::analysis::error::AnalyzeError;
use kanpan_core::common::AnalysisMode;
use kanpan_core::scheduler::error::SchedulerError;
use kanpan_core::scheduler::port::{SchedulerPort, StockSummary};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};

/// # Summary
/// 分析器管理器：系统的调度核心。
///
/// 持有全部 `StockAnalyzer`、每股的停止信号与内存历史，按配置的
/// 模式以并发或轮询方式驱动周期分析。
///
/// # Invariants
/// - 同一只股票的分析严格串行，历史插入顺序与分析完成顺序一致。
/// - 并发模式下全局在途分析数不超过信号量容量；轮询模式下恒为 1。
/// - 停止是协作式的：进行中的分析会执行完毕，循环在下一个等待点退出。
pub struct AnalyzerManager {
    // 分析器注册表，Key 为股票代码
    analyzers: DashMap<String, Arc<StockAnalyzer>>,
    // 每股的停止信号发送端
    stop_txs: DashMap<String, watch::Sender<bool>>,
    // 注册顺序，轮询模式按此顺序扫描
    order: Mutex<Vec<String>>,
    // 内存历史记录
    history: HistoryStore,
    // 配置的分析模式
    mode: AnalysisMode,
    // 配置的最大并发分析数
    max_concurrent: usize,
}

impl AnalyzerManager {
    /// # Summary
    /// 创建管理器。
    ///
    /// # Arguments
    /// * `mode` - 配置的分析模式。
    /// * `max_concurrent` - 并发模式的全局并发上限（已钳制到 [1, 4]）。
    /// * `history_limit` - 每只股票保留的历史条数（已钳制到 [3, 100]）。
    pub fn new(mode: AnalysisMode, max_concurrent: usize, history_limit: usize) -> Arc<Self> {
        Arc::new(Self {
            analyzers: DashMap::new(),
            stop_txs: DashMap::new(),
            order: Mutex::new(Vec::new()),
            history: HistoryStore::new(history_limit),
            mode,
            max_concurrent,
        })
    }

    /// 注册一个分析器并为其分配停止信号
    pub fn add_analyzer(&self, code: &str, analyzer: Arc<StockAnalyzer>) {
        let (stop_tx, _) = watch::channel(false);
        self.analyzers.insert(code.to_string(), analyzer);
        self.stop_txs.insert(code.to_string(), stop_tx);
        self.order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(code.to_string());
    }

    /// # Summary
    /// 解析实际生效的模式与并发数。
    ///
    /// # Logic
    /// 1. polling 固定为串行（并发数 1）。
    /// 2. concurrent 使用配置的并发上限。
    /// 3. smart 按股票数自动选择：不超过 4 只时并发（并发数 = 股票数），
    ///    更多则退化为轮询。超过四路并发后上游大模型的限流成为瓶颈。
    fn determine_mode(&self) -> (AnalysisMode, usize) {
        match self.mode {
            AnalysisMode::Polling => (AnalysisMode::Polling, 1),
            AnalysisMode::Concurrent => (AnalysisMode::Concurrent, self.max_concurrent),
            AnalysisMode::Smart => {
                let count = self.analyzers.len();
                if count <= 4 {
                    (AnalysisMode::Concurrent, count.clamp(1, 4))
                } else {
                    (AnalysisMode::Polling, 1)
                }
            }
        }
    }

    /// # Summary
    /// 启动全部调度循环。
    ///
    /// # Logic
    /// 1. 解析实际模式。
    /// 2. 轮询模式：单个驱动协程顺序扫描全部股票。
    /// 3. 并发模式：每股一个协程，立即执行一次后按各自间隔滴答，
    ///    全程受全局信号量约束。
    pub fn start_all(self: &Arc<Self>) {
        let (mode, concurrency) = self.determine_mode();
        info!(
            "📊 分析模式: {}，最大并发数: {}，股票总数: {}",
            mode,
            concurrency,
            self.analyzers.len()
        );

        if mode == AnalysisMode::Polling {
            self.start_polling(self.snapshot());
            return;
        }

        let semaphore = Arc::new(Semaphore::new(concurrency));
        for (code, analyzer, stop_rx) in self.snapshot() {
            let manager = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                manager
                    .run_instrument_loop(code, analyzer, stop_rx, semaphore)
                    .await;
            });
        }
    }

    /// 注册表的有序快照：(代码, 分析器, 停止信号接收端)
    fn snapshot(&self) -> Vec<(String, Arc<StockAnalyzer>, watch::Receiver<bool>)> {
        let order = self.order.lock().unwrap_or_else(|e| e.into_inner()).clone();
        order
            .into_iter()
            .filter_map(|code| {
                let analyzer = self.analyzers.get(&code)?.value().clone();
                let stop_rx = self.stop_txs.get(&code)?.value().subscribe();
                Some((code, analyzer, stop_rx))
            })
            .collect()
    }

    /// # Summary
    /// 单只股票的调度循环（并发模式）。
    ///
    /// # Logic
    /// 1. `tokio::time::interval` 的首个 tick 立即触发，天然满足
    ///    "启动即分析一次，此后按间隔"的节奏。
    /// 2. 每个 tick 先获取全局信号量再执行，保证在途分析数受限。
    /// 3. 收到停止信号后在下一个等待点退出，不打断进行中的分析。
    async fn run_instrument_loop(
        self: Arc<Self>,
        code: String,
        analyzer: Arc<StockAnalyzer>,
        mut stop_rx: watch::Receiver<bool>,
        semaphore: Arc<Semaphore>,
    ) {
        info!(
            "🚀 开始监控股票 {}，扫描间隔: {:?}",
            code,
            analyzer.config.scan_interval
        );

        let mut ticker = interval(analyzer.config.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_analysis_gated(&code, &analyzer, &semaphore).await;
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        info!("⏹️  停止监控股票 {}", code);
                        return;
                    }
                }
            }
        }
    }

    /// 在信号量保护下执行一次分析并保存结果
    async fn run_analysis_gated(
        &self,
        code: &str,
        analyzer: &StockAnalyzer,
        semaphore: &Semaphore,
    ) {
        // 信号量在管理器生命周期内不关闭
        let Ok(_permit) = semaphore.acquire().await else {
            return;
        };
        self.run_analysis(code, analyzer).await;
    }

    /// 执行一次分析并处理结果。失败只记录，调度循环继续。
    async fn run_analysis(&self, code: &str, analyzer: &StockAnalyzer) {
        match analyzer.analyze().await {
            Ok(result) => self.history.insert(code, result),
            Err(AnalyzeError::NotTradingWindow) => {
                // 非交易时段属预期跳过，analyze 内部已记录
            }
            Err(e) => error!("❌ 分析失败: {}", e),
        }
    }

    /// # Summary
    /// 启动轮询驱动协程（严格串行）。
    ///
    /// # Logic
    /// 1. 先对全部股票按注册顺序做一轮立即分析。
    /// 2. 记录每股的上次执行时刻，以最短间隔的 1/4 作为检查节拍。
    /// 3. 每个节拍扫描一遍：到期的股票在循环内顺序执行。
    /// 4. 已停止的股票移出轮换；全部移出后驱动协程退出。
    fn start_polling(
        self: &Arc<Self>,
        mut items: Vec<(String, Arc<StockAnalyzer>, watch::Receiver<bool>)>,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            info!("🔄 启动轮询模式，顺序分析 {} 只股票", items.len());
            for (code, analyzer, _) in &items {
                info!(
                    "🚀 准备监控股票 {}，扫描间隔: {:?}",
                    code, analyzer.config.scan_interval
                );
            }

            // 立即执行一轮顺序分析
            for (code, analyzer, stop_rx) in &items {
                if *stop_rx.borrow() {
                    continue;
                }
                info!("📊 [轮询] 开始分析股票 {}", code);
                manager.run_analysis(code, analyzer).await;
                info!("✅ [轮询] 完成分析股票 {}", code);
            }

            let mut last_run: Vec<Instant> = items.iter().map(|_| Instant::now()).collect();

            let min_interval = items
                .iter()
                .map(|(_, a, _)| a.config.scan_interval)
                .min()
                .unwrap_or(Duration::from_secs(300));

            // 每 1/4 最短间隔检查一次到期情况
            let mut ticker = interval(min_interval / 4);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // 首个 tick 立即返回，消费掉避免空扫

            loop {
                ticker.tick().await;

                // 移出已停止的股票
                let mut i = 0;
                while i < items.len() {
                    if *items[i].2.borrow() {
                        info!("⏹️  停止监控股票 {}", items[i].0);
                        items.remove(i);
                        last_run.remove(i);
                    } else {
                        i += 1;
                    }
                }
                if items.is_empty() {
                    info!("⏹️  所有股票监控已停止");
                    return;
                }

                let total = items.len();
                for (i, (code, analyzer, _)) in items.iter().enumerate() {
                    if last_run[i].elapsed() >= analyzer.config.scan_interval {
                        info!("📊 [轮询] 开始分析股票 {}（第 {}/{} 只）", code, i + 1, total);
                        manager.run_analysis(code, analyzer).await;
                        last_run[i] = Instant::now();
                        info!("✅ [轮询] 完成分析股票 {}", code);
                    }
                }
            }
        });
    }
}

#[async_trait]
impl SchedulerPort for AnalyzerManager {
    fn list_stocks(&self) -> Vec<StockSummary> {
        let order = self.order.lock().unwrap_or_else(|e| e.into_inner()).clone();
        order
            .into_iter()
            .filter_map(|code| {
                let analyzer = self.analyzers.get(&code)?;
                Some(StockSummary {
                    code,
                    name: analyzer.config.stock_name.clone(),
                    enabled: true,
                })
            })
            .collect()
    }

    fn stock_count(&self) -> usize {
        self.analyzers.len()
    }

    /// # Summary
    /// 手动触发一次分析。
    ///
    /// # Logic
    /// 1. 查找分析器（只短暂持有注册表引用）。
    /// 2. 在调用方上下文执行完整流水线，不经过信号量。
    /// 3. 成功时写入历史并返回结果。交易时段检查照常生效。
    async fn trigger_analysis(&self, code: &str) -> Result<AnalysisResult, SchedulerError> {
        let analyzer = self
            .analyzers
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SchedulerError::NotFound(code.to_string()))?;

        let result = analyzer.analyze().await?;
        self.history.insert(code, result.clone());
        Ok(result)
    }

    fn history(&self, code: &str, limit: usize) -> Result<Vec<AnalysisResult>, SchedulerError> {
        if !self.analyzers.contains_key(code) {
            return Err(SchedulerError::NotFound(code.to_string()));
        }
        Ok(self.history.latest(code, limit))
    }

    fn recent_across_all(&self, limit: usize) -> Vec<AnalysisResult> {
        self.history.recent_across_all(limit)
    }

    /// 向全部调度循环广播停止信号并立即返回
    fn stop_all(&self) {
        for entry in self.stop_txs.iter() {
            entry.value().send_replace(true);
        }
    }
}
