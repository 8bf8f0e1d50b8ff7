pub mod mocks;

use kanpan_core::common::AnalysisMode;
use kanpan_core::scheduler::error::SchedulerError;
use kanpan_core::scheduler::port::SchedulerPort;
use kanpan_manager::scheduler::AnalyzerManager;
use mocks::{stub_analyzer, TrackingLlm};
use std::time::Duration;
use tokio::time::sleep;

/// # Summary
/// 智能模式下超过 4 只股票退化为轮询：任一时刻至多一个分析在途，
/// 且首轮扫描覆盖全部股票。
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn smart_mode_with_many_stocks_polls_sequentially() {
    let llm = TrackingLlm::new(Duration::from_millis(200));
    let manager = AnalyzerManager::new(AnalysisMode::Smart, 3, 20);

    let codes = ["000001", "000002", "000003", "000004", "000005"];
    for code in codes {
        manager.add_analyzer(code, stub_analyzer(code, llm.clone()));
    }

    manager.start_all();
    sleep(Duration::from_millis(1500)).await;

    // 串行性：在途分析数从未超过 1
    assert_eq!(llm.observed_max(), 1);

    // 首轮扫描覆盖全部股票
    for code in codes {
        let history = manager.history(code, 10).unwrap();
        assert!(
            !history.is_empty(),
            "stock {} was never analyzed during the initial sweep",
            code
        );
    }

    manager.stop_all();
}

/// # Summary
/// 并发模式的在途分析数不超过配置的信号量容量。
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mode_respects_global_ceiling() {
    let llm = TrackingLlm::new(Duration::from_millis(200));
    let manager = AnalyzerManager::new(AnalysisMode::Concurrent, 2, 20);

    let codes = ["600519", "600036", "601318", "600900"];
    for code in codes {
        manager.add_analyzer(code, stub_analyzer(code, llm.clone()));
    }

    manager.start_all();
    sleep(Duration::from_millis(900)).await;

    let max = llm.observed_max();
    assert!(max <= 2, "in-flight analyses exceeded ceiling: {}", max);
    assert!(max >= 1);

    for code in codes {
        assert!(!manager.history(code, 10).unwrap().is_empty());
    }

    manager.stop_all();
}

/// # Summary
/// 智能模式下不超过 4 只股票按并发执行（容量 = 股票数）。
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn smart_mode_with_few_stocks_runs_concurrently() {
    let llm = TrackingLlm::new(Duration::from_millis(200));
    let manager = AnalyzerManager::new(AnalysisMode::Smart, 3, 20);

    for code in ["000001", "000002", "000003"] {
        manager.add_analyzer(code, stub_analyzer(code, llm.clone()));
    }

    manager.start_all();
    sleep(Duration::from_millis(600)).await;

    // 三只股票同时首发，观测到的并发应大于 1 且不超过股票数
    let max = llm.observed_max();
    assert!(max >= 2, "expected concurrent startup, got {}", max);
    assert!(max <= 3);

    manager.stop_all();
}

/// # Summary
/// 手动触发：同步执行、写入历史并返回结果；未注册的代码报 NotFound。
#[tokio::test]
async fn trigger_analysis_is_synchronous_and_persists() {
    let llm = TrackingLlm::new(Duration::from_millis(10));
    let manager = AnalyzerManager::new(AnalysisMode::Smart, 3, 20);
    manager.add_analyzer("000001", stub_analyzer("000001", llm.clone()));

    let result = manager.trigger_analysis("000001").await.unwrap();
    assert_eq!(result.stock_code, "000001");
    assert_eq!(result.confidence, 55);

    let history = manager.history("000001", 10).unwrap();
    assert_eq!(history.len(), 1);

    let err = manager.trigger_analysis("999999").await.unwrap_err();
    assert!(matches!(err, SchedulerError::NotFound(_)));

    let err = manager.history("999999", 10).unwrap_err();
    assert!(matches!(err, SchedulerError::NotFound(_)));
}

/// # Summary
/// 股票列表按注册顺序返回。
#[tokio::test]
async fn list_stocks_preserves_registration_order() {
    let llm = TrackingLlm::new(Duration::from_millis(10));
    let manager = AnalyzerManager::new(AnalysisMode::Smart, 3, 20);
    for code in ["600519", "000001", "300750"] {
        manager.add_analyzer(code, stub_analyzer(code, llm.clone()));
    }

    let stocks = manager.list_stocks();
    let codes: Vec<&str> = stocks.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["600519", "000001", "300750"]);
    assert_eq!(manager.stock_count(), 3);
    assert!(stocks.iter().all(|s| s.enabled));
}
