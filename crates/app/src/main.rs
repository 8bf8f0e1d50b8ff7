use std::sync::Arc;
use std::time::Instant;

use kanpan_analysis::analyzer::{AnalysisConfig, StockAnalyzer};
use kanpan_api::server::{start_server, AppState};
use kanpan_core::common::clock::TradingClock;
use kanpan_core::common::AnalysisMode;
use kanpan_core::config::NotificationConfig;
use kanpan_core::market::port::MarketData;
use kanpan_core::notify::port::Notifier;
use kanpan_core::scheduler::port::SchedulerPort;
use kanpan_feed::tdx::TdxClient;
use kanpan_llm::client::ChatClient;
use kanpan_manager::scheduler::AnalyzerManager;
use kanpan_notify::dingtalk::DingTalkNotifier;
use kanpan_notify::feishu::FeishuNotifier;
use kanpan_notify::multi::MultiNotifier;
use kanpan_store::config::ConfigStore;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责加载配置、实例化所有具体实现组件并注入到调度器与 API 层。
///
/// # Logic
/// 1. 加载并校验配置（失败以非零退出码终止）。
/// 2. 实例化基础设施层（行情客户端、AI 客户端、通知器、交易时钟）。
/// 3. 为每只启用的股票构建分析器并注册到管理器。
/// 4. 启动 API 服务器与全部调度循环。
/// 5. 挂起等待退出信号或重启指令；两者都触发优雅停止。
#[tokio::main]
async fn main() {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║    📈 AI股票分析系统 - 实时分析与信号通知               ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    tracing_subscriber::fmt::init();

    // 配置文件路径可由第一个命令行参数覆盖
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config_stock.json".to_string());
    info!("📋 加载配置文件: {}", config_path);

    let config_store = Arc::new(ConfigStore::new(&config_path));
    let config = match config_store.load().await {
        Ok(config) => config,
        Err(e) => {
            error!("❌ 加载配置失败: {}", e);
            std::process::exit(1);
        }
    };
    info!("✓ 配置加载成功");

    // 行情客户端
    let market: Arc<dyn MarketData> = Arc::new(TdxClient::new(&config.tdx_api_url));
    info!("✓ TDX API客户端已初始化: {}", config.tdx_api_url);

    // AI 客户端
    let llm = match ChatClient::from_ai_config(&config.ai_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("❌ 创建AI客户端失败: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "✓ AI客户端已初始化 ({})",
        config.ai_config.provider.to_uppercase()
    );

    // 通知器
    let notifier = if config.notification.enabled {
        let n = create_notifier(&config.notification);
        info!("✓ 通知系统已初始化");
        n
    } else {
        info!("⏭️  通知系统未启用");
        None
    };

    // 交易时间检查器。构建失败（时段或时区非法）时降级为不检查。
    let clock = match TradingClock::new(
        config.trading_time.enable_check,
        &config.trading_time.trading_hours,
        &config.trading_time.timezone,
    ) {
        Ok(clock) => {
            if config.trading_time.enable_check {
                info!("✓ 交易时间检查已启用");
                info!("  交易时段: {:?}", config.trading_time.trading_hours);
                let status = clock.status(chrono::Utc::now());
                info!(
                    "  当前状态: 交易日={}, 交易时段={}",
                    status.is_trading_day, status.is_trading_time
                );
            } else {
                info!("⏭️  交易时间检查未启用（将持续分析）");
            }
            Some(clock)
        }
        Err(e) => {
            warn!("创建交易时间检查器失败: {}, 将禁用交易时间检查", e);
            None
        }
    };

    // 日志目录
    if let Err(e) = tokio::fs::create_dir_all(&config.log_dir).await {
        warn!("创建日志目录失败: {}", e);
    }

    println!();
    println!("📊 监控股票列表:");
    for stock in config.enabled_stocks() {
        println!(
            "  • {}({}) - 扫描间隔: {}分钟, 信心阈值: {}%",
            stock.name, stock.code, stock.scan_interval_minutes, stock.min_confidence
        );
    }
    println!();
    println!("🤖 AI分析模式:");
    println!("  • AI将基于实时行情、K线、技术指标进行全面分析");
    println!("  • 提供BUY/SELL/HOLD明确信号");
    println!("  • 给出目标价位和止损建议");
    println!("  • 信心度≥阈值时发送通知");
    println!();
    println!("⚠️  风险提示: AI分析仅供参考，投资有风险，决策需谨慎！");
    println!();
    println!("按 Ctrl+C 停止运行");
    println!("{}", "=".repeat(60));
    println!();

    // 调度器
    let mode = config
        .analysis_mode
        .parse::<AnalysisMode>()
        .unwrap_or(AnalysisMode::Smart);
    let manager = AnalyzerManager::new(
        mode,
        config.max_concurrent_analysis as usize,
        config.analysis_history_limit as usize,
    );
    info!(
        "✓ 分析历史记录配置: 每个股票最多保存 {} 条记录",
        config.analysis_history_limit
    );

    for stock in config.enabled_stocks() {
        let analysis_config = AnalysisConfig::from_stock_item(stock, config.notification.enabled);
        let analyzer = StockAnalyzer::new(
            market.clone(),
            llm.clone(),
            notifier.clone(),
            clock.clone(),
            analysis_config,
        );
        manager.add_analyzer(&stock.code, Arc::new(analyzer));
    }

    // 重启信号通道：API 层投递，主循环决定退出
    let (restart_tx, mut restart_rx) = mpsc::channel::<()>(1);

    let state = AppState {
        scheduler: manager.clone(),
        config_store,
        market,
        api_token: config.api_token.clone(),
        restart_tx,
        started_at: Instant::now(),
    };

    let bind_addr = format!("0.0.0.0:{}", config.api_server_port);
    tokio::spawn(async move {
        if let Err(e) = start_server(state, &bind_addr).await {
            error!("❌ API服务器错误: {}", e);
        }
    });
    info!("✓ API服务器已启动: http://localhost:{}", config.api_server_port);
    if !config.api_token.is_empty() {
        info!("✓ API Token已配置（可用于重启等功能）");
    }
    println!();

    // 启动所有调度循环
    manager.start_all();

    // 等待退出信号或重启指令
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!();
            info!("📛 收到退出信号，正在停止所有分析器...");
            manager.stop_all();
            println!();
            println!("👋 感谢使用AI股票分析系统！");
        }
        _ = restart_rx.recv() => {
            info!("🔄 收到重启指令，开始优雅关闭...");
            manager.stop_all();
            info!("✅ 所有分析器已停止");
            info!("💡 提示：请使用 systemd/supervisor 等进程管理器运行本服务，退出后将自动重启");
            info!("👋 程序退出");
            // 退出码 0，由外部进程管理器拉起
            std::process::exit(0);
        }
    }
}

/// # Summary
/// 按配置装配通知器：单渠道直接返回，多渠道包一层 MultiNotifier。
fn create_notifier(config: &NotificationConfig) -> Option<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if config.dingtalk.enabled {
        notifiers.push(Arc::new(DingTalkNotifier::new(
            config.dingtalk.webhook_url.clone(),
            config.dingtalk.secret.clone(),
        )));
        info!("  ✓ 钉钉通知已启用");
    }

    if config.feishu.enabled {
        notifiers.push(Arc::new(FeishuNotifier::new(
            config.feishu.webhook_url.clone(),
            config.feishu.secret.clone(),
        )));
        info!("  ✓ 飞书通知已启用");
    }

    match notifiers.len() {
        0 => None,
        1 => notifiers.pop(),
        _ => Some(Arc::new(MultiNotifier::new(notifiers))),
    }
}
