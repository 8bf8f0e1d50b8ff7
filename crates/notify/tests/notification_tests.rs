use async_trait::async_trait;
use chrono::Utc;
use kanpan_core::common::Signal;
use kanpan_core::notify::entity::TradingSignal;
use kanpan_core::notify::error::NotifyError;
use kanpan_core::notify::port::Notifier;
use kanpan_notify::dingtalk::DingTalkNotifier;
use kanpan_notify::feishu::FeishuNotifier;
use kanpan_notify::multi::MultiNotifier;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sample_signal() -> TradingSignal {
    TradingSignal {
        stock_code: "000001".into(),
        stock_name: "平安银行".into(),
        signal: Signal::Buy,
        price: 12.5,
        confidence: 80,
        reasoning: "集成测试消息".into(),
        target_price: 13.2,
        stop_loss: 12.1,
        risk_reward: "1:2".into(),
        timestamp: Utc::now(),
        technical_data: None,
        position_profit_target: 0.0,
        position_stop_loss: 0.0,
        position_info: None,
    }
}

/// 记录调用并可注入失败的桩渠道
struct StubSink {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl Notifier for StubSink {
    async fn send_signal(&self, _signal: &TradingSignal) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotifyError::Platform("stub failure".into()))
        } else {
            Ok(())
        }
    }

    async fn send_message(&self, _message: &str) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotifyError::Platform("stub failure".into()))
        } else {
            Ok(())
        }
    }
}

/// # Summary
/// 多路通知器在单渠道失败时仍应尝试其余渠道，并聚合失败。
#[tokio::test]
async fn multi_notifier_attempts_every_sink() {
    let ok_calls = Arc::new(AtomicUsize::new(0));
    let bad_calls = Arc::new(AtomicUsize::new(0));

    let multi = MultiNotifier::new(vec![
        Arc::new(StubSink {
            calls: bad_calls.clone(),
            fail: true,
        }),
        Arc::new(StubSink {
            calls: ok_calls.clone(),
            fail: false,
        }),
    ]);

    let result = multi.send_signal(&sample_signal()).await;
    assert!(result.is_err());
    assert_eq!(bad_calls.load(Ordering::SeqCst), 1);
    // 失败渠道之后的渠道仍被调用
    assert_eq!(ok_calls.load(Ordering::SeqCst), 1);
}

/// # Summary
/// 全部渠道成功时聚合结果为 Ok。
#[tokio::test]
async fn multi_notifier_succeeds_when_all_sinks_succeed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let multi = MultiNotifier::new(vec![
        Arc::new(StubSink {
            calls: calls.clone(),
            fail: false,
        }),
        Arc::new(StubSink {
            calls: calls.clone(),
            fail: false,
        }),
    ]);

    assert!(multi.send_message("测试").await.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// # Summary
/// 集成测试：验证钉钉通知发送功能。
///
/// # Logic
/// 1. 加载 .env 环境变量。
/// 2. 从环境变量获取 Webhook 地址。
/// 3. 发送测试信号并断言结果。
#[tokio::test]
#[ignore] // 默认忽略，仅在手动测试时通过环境变量开启
async fn test_dingtalk_notification() {
    let _ = dotenvy::dotenv();
    let webhook = env::var("KANPAN_DINGTALK_WEBHOOK").expect("KANPAN_DINGTALK_WEBHOOK must be set");

    let notifier = DingTalkNotifier::new(webhook, String::new());
    let result = notifier.send_signal(&sample_signal()).await;
    assert!(result.is_ok(), "DingTalk notification failed: {:?}", result);
}

/// # Summary
/// 集成测试：验证飞书通知发送功能。
#[tokio::test]
#[ignore] // 默认忽略
async fn test_feishu_notification() {
    let _ = dotenvy::dotenv();
    let webhook = env::var("KANPAN_FEISHU_WEBHOOK").expect("KANPAN_FEISHU_WEBHOOK must be set");

    let notifier = FeishuNotifier::new(webhook, String::new());
    let result = notifier.send_signal(&sample_signal()).await;
    assert!(result.is_ok(), "Feishu notification failed: {:?}", result);
}
