use async_trait::async_trait;
use kanpan_analysis::analyzer::{AnalysisConfig, StockAnalyzer};
use kanpan_api::server::{build_router, AppState};
use kanpan_core::common::{AnalysisMode, KlinePeriod};
use kanpan_core::llm::error::LlmError;
use kanpan_core::llm::port::LlmPort;
use kanpan_core::market::entity::{
    KlineItem, KlineSeries, MinuteSeries, OrderLevel, Quote, QuoteBar,
};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::MarketData;
use kanpan_manager::scheduler::AnalyzerManager;
use kanpan_store::config::ConfigStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

struct MockMarket;

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

struct MockLlm;

#[async_trait]
impl LlmPort for MockLlm {
    async fn chat(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Ok(r#"{"signal":"BUY","confidence":80,"reasoning":"趋势向上","target_price":13.2,"stop_loss":12.1}"#.to_string())
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

const TEST_TOKEN: &str = "test-token-123";

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server() -> (String, mpsc::Receiver<()>, tempfile::TempDir) {
    spawn_test_server_with_key("sk-test").await
}

// 帮助函数：指定 deepseek_key 启动测试服务器（用于自检接口的密钥检查路径）
async fn spawn_test_server_with_key(
    deepseek_key: &str,
) -> (String, mpsc::Receiver<()>, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = tmp_dir.path().join("config_stock.json");
    tokio::fs::write(
        &config_path,
        format!(
            r#"{{
  "tdx_api_url": "http://127.0.0.1:7700",
  "ai_config": {{"provider": "deepseek", "deepseek_key": "{}"}},
  "stocks": [{{"code": "000001", "name": "平安银行", "enabled": true}}]
}}"#,
            deepseek_key
        ),
    )
    .await
    .unwrap();

    let manager = AnalyzerManager::new(AnalysisMode::Smart, 3, 20);
    let market: Arc<dyn MarketData> = Arc::new(MockMarket);
    manager.add_analyzer(
        "000001",
        Arc::new(StockAnalyzer::new(
            market.clone(),
            Arc::new(MockLlm),
            None,
            None,
            AnalysisConfig {
                stock_code: "000001".into(),
                stock_name: "平安银行".into(),
                scan_interval: Duration::from_secs(60),
                enable_notification: false,
                min_confidence: 70,
                position_quantity: 0,
                buy_price: 0.0,
                buy_date: None,
            },
        )),
    );

    let (restart_tx, restart_rx) = mpsc::channel(1);
    let state = AppState {
        scheduler: manager,
        config_store: Arc::new(ConfigStore::new(&config_path)),
        market,
        api_token: TEST_TOKEN.to_string(),
        restart_tx,
        started_at: Instant::now(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());

    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // 稍微等待服务器启动
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, restart_rx, tmp_dir)
}

#[tokio::test]
async fn health_endpoints_respond_on_both_paths() {
    let (addr, _rx, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    for path in ["/health", "/api/health"] {
        let resp = client.get(format!("{}{}", addr, path)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }
}

#[tokio::test]
async fn stock_listing_and_history_flow() {
    let (addr, _rx, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    // 列表
    let body: serde_json::Value = client
        .get(format!("{}/api/stocks", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["stocks"][0]["code"], "000001");

    // 暂无分析结果
    let body: serde_json::Value = client
        .get(format!("{}/api/stock/000001/latest", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "暂无分析结果");

    // 手动触发 → 同步返回结果并写入历史
    let body: serde_json::Value = client
        .post(format!("{}/api/stock/000001/analyze", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["signal"], "BUY");
    assert_eq!(body["data"]["confidence"], 80);

    let body: serde_json::Value = client
        .get(format!("{}/api/stock/000001/history?limit=5", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["records"][0]["stock_code"], "000001");

    let body: serde_json::Value = client
        .get(format!("{}/api/analysis/recent", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["count"], 1);

    // 未注册的代码 → 404
    let resp = client
        .get(format!("{}/api/stock/999999/latest", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn config_roundtrip_with_backup() {
    let (addr, _rx, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/api/config", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["tdx_api_url"], "http://127.0.0.1:7700");

    let mut updated = body["data"].clone();
    updated["api_server_port"] = serde_json::json!(9191);
    let body: serde_json::Value = client
        .post(format!("{}/api/config", addr))
        .json(&updated)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert!(body["message"].as_str().unwrap().contains("重启"));
    assert!(body["data"]["backup_file"]
        .as_str()
        .unwrap()
        .contains(".backup."));
}

#[tokio::test]
async fn restart_requires_valid_token() {
    let (addr, mut restart_rx, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/system/restart", addr);

    // 无 Token → 401
    let resp = client.post(&url).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    // 错误 Token → 403
    let resp = client
        .post(&url)
        .header("X-API-Token", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

    // 请求体 Token 也可认证 → 200，3 秒后收到重启信号
    let resp = client
        .post(&url)
        .json(&serde_json::json!({ "token": TEST_TOKEN }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 0);

    let signal = tokio::time::timeout(Duration::from_secs(5), restart_rx.recv()).await;
    assert!(signal.is_ok(), "restart signal not delivered within 5s");
}

#[tokio::test]
async fn self_tests_report_status() {
    let (addr, _rx, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/api/test", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["success"], true);

    let body: serde_json::Value = client
        .post(format!("{}/api/test/ai", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["status"], "passed");
}

#[tokio::test]
async fn placeholder_ai_key_fails_system_test() {
    // 占位密钥：AI 检查降为 warning，总评按未通过计
    let (addr, _rx, _tmp) = spawn_test_server_with_key("sk-test-key-placeholder").await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/api/test/ai", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["status"], "warning");

    let body: serde_json::Value = client
        .post(format!("{}/api/test", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["total"], 4);
    // warning 不计入 passed：其余三项通过，AI 检查一项按失败统计
    assert_eq!(body["data"]["passed"], 3);
    assert_eq!(body["data"]["failed"], 1);
    assert_eq!(body["data"]["success"], false);
}
