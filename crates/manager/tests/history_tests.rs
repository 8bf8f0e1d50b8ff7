use chrono::{Duration, Utc};
use kanpan_core::analysis::entity::{AnalysisResult, IndicatorSnapshot};
use kanpan_core::common::Signal;
use kanpan_manager::history::HistoryStore;

fn result_at(code: &str, offset_secs: i64) -> AnalysisResult {
    AnalysisResult {
        stock_code: code.to_string(),
        stock_name: format!("股票{}", code),
        current_price: 12.5,
        signal: Signal::Hold,
        confidence: 60,
        reasoning: "测试记录".into(),
        target_price: 0.0,
        stop_loss: 0.0,
        risk_reward: String::new(),
        technical_data: IndicatorSnapshot::default(),
        timestamp: Utc::now() + Duration::seconds(offset_secs),
        position_profit_target: 0.0,
        position_stop_loss: 0.0,
        position_info: None,
    }
}

#[test]
fn per_code_list_never_exceeds_cap() {
    let store = HistoryStore::new(5);
    for i in 0..20 {
        store.insert("000001", result_at("000001", i));
    }
    assert_eq!(store.latest("000001", 100).len(), 5);
}

#[test]
fn cap_is_clamped_into_valid_range() {
    assert_eq!(HistoryStore::new(1).cap(), 3);
    assert_eq!(HistoryStore::new(20).cap(), 20);
    assert_eq!(HistoryStore::new(500).cap(), 100);
}

#[test]
fn latest_returns_newest_first() {
    let store = HistoryStore::new(10);
    for i in 0..4 {
        store.insert("000001", result_at("000001", i));
    }

    let history = store.latest("000001", 10);
    assert_eq!(history.len(), 4);
    // 头部是最后插入的记录，时间戳单调不增
    for pair in history.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }

    // limit 截断从头部取
    let top2 = store.latest("000001", 2);
    assert_eq!(top2.len(), 2);
    assert_eq!(top2[0].timestamp, history[0].timestamp);
}

#[test]
fn unknown_code_yields_empty_history() {
    let store = HistoryStore::new(10);
    assert!(store.latest("999999", 10).is_empty());
}

#[test]
fn recent_across_all_takes_one_per_code_newest_first() {
    let store = HistoryStore::new(10);
    // 每只股票插两条，跨股票只应取各自最新一条
    store.insert("000001", result_at("000001", 10));
    store.insert("000001", result_at("000001", 40));
    store.insert("600519", result_at("600519", 30));
    store.insert("600519", result_at("600519", 20));
    store.insert("300750", result_at("300750", 50));

    let recent = store.recent_across_all(10);
    assert_eq!(recent.len(), 3);
    // 全局按时间倒序
    for pair in recent.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
    assert_eq!(recent[0].stock_code, "300750");

    // 截断
    let top2 = store.recent_across_all(2);
    assert_eq!(top2.len(), 2);
}
