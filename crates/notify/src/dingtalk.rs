use crate::format::{format_reasoning, signal_emoji};
use async_trait::async_trait;
use chrono_tz::Asia::Shanghai;
use kanpan_core::notify::entity::TradingSignal;
use kanpan_core::notify::error::NotifyError;
use kanpan_core::notify::port::Notifier;
use serde_json::{json, Value};

/// # Summary
/// A notifier implementation that posts rich markdown messages to a
/// DingTalk group robot webhook.
///
/// # Invariants
/// * `webhook_url` must be a valid DingTalk robot endpoint.
pub struct DingTalkNotifier {
    /// The robot webhook URL.
    webhook_url: String,
    /// Optional signing secret.
    /// TODO: implement DingTalk HMAC signing (加签) per
    /// https://open.dingtalk.com/document/robots/custom-robot-access
    #[allow(dead_code)]
    secret: String,
    /// The HTTP client used for requests.
    client: reqwest::Client,
}

impl DingTalkNotifier {
    /// # Summary
    /// Creates a new `DingTalkNotifier`.
    ///
    /// # Arguments
    /// * `webhook_url` - The robot webhook URL.
    /// * `secret` - The signing secret, may be empty.
    pub fn new(webhook_url: String, secret: String) -> Self {
        Self {
            webhook_url,
            secret,
            client: reqwest::Client::new(),
        }
    }

    /// Formats the trading signal as a DingTalk markdown body with the
    /// numbered sections ①core metrics ②advice ③reasoning ④timestamp.
    fn format_signal_markdown(signal: &TradingSignal) -> String {
        let emoji = signal_emoji(signal.signal);
        let signal_text = signal.signal.label_cn();

        let mut md = format!(
            "# {} {}信号 - {}({})\n\n",
            emoji, signal_text, signal.stock_name, signal.stock_code
        );
        md.push_str("**【AI股票分析系统】**\n\n---\n\n");

        // 1️⃣ 核心指标
        md.push_str("**1️⃣  核心指标**\n\n");
        md.push_str(&format!("💰 **当前价格**: {:.2}元\n\n", signal.price));
        md.push_str(&format!("📈 **信心度**: {}%\n\n", signal.confidence));

        // 2️⃣ 交易建议
        if signal.target_price > 0.0 || signal.stop_loss > 0.0 || !signal.risk_reward.is_empty() {
            md.push_str("**2️⃣  交易建议**\n\n");
            if signal.target_price > 0.0 {
                md.push_str(&format!("🎯 **目标价格**: {:.2}元\n\n", signal.target_price));
            }
            if signal.stop_loss > 0.0 {
                md.push_str(&format!("🛑 **止损价格**: {:.2}元\n\n", signal.stop_loss));
            }
            if !signal.risk_reward.is_empty() {
                md.push_str(&format!("⚖️ **风险回报比**: {}\n\n", signal.risk_reward));
            }
        }

        // 持仓信息（持仓模式下）
        if let Some(info) = &signal.position_info {
            if info.quantity > 0 {
                md.push_str(&format!("📦 **持仓数量**: {}股\n\n", info.quantity));
            }
            if info.buy_price > 0.0 {
                md.push_str(&format!("💵 **购买价格**: {:.2}元/股\n\n", info.buy_price));
            }
            if info.current_price > 0.0 {
                md.push_str(&format!(
                    "💰 **持仓当前价格**: {:.2}元/股\n\n",
                    info.current_price
                ));
            }
            let profit_emoji = if info.profit_loss < 0.0 { "📉" } else { "📈" };
            md.push_str(&format!(
                "{} **浮动盈亏**: {}\n\n",
                profit_emoji,
                info.format_profit_loss()
            ));

            if signal.position_profit_target > 0.0 {
                md.push_str(&format!(
                    "📈 **持仓止盈价**: {:.2}元\n\n",
                    signal.position_profit_target
                ));
            }
            if signal.position_stop_loss > 0.0 {
                md.push_str(&format!(
                    "📉 **持仓止损价**: {:.2}元\n\n",
                    signal.position_stop_loss
                ));
            }
        }

        // 3️⃣ 分析原因
        md.push_str("**3️⃣  分析原因**\n\n");
        md.push_str(&format!("{}\n\n", format_reasoning(&signal.reasoning)));

        // 4️⃣ 分析时间与风险提示
        md.push_str(&format!(
            "**4️⃣  分析时间**  {}\n\n",
            signal
                .timestamp
                .with_timezone(&Shanghai)
                .format("%Y-%m-%d %H:%M:%S")
        ));
        md.push_str("‼️ **本分析仅供参考，投资有风险，决策需谨慎**");

        md
    }

    /// Posts a message payload and checks the provider-level error code.
    async fn send_request(&self, message: Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Platform(format!(
                "DingTalk API error: {}",
                error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if let Some(errcode) = body.get("errcode").and_then(Value::as_i64) {
            if errcode != 0 {
                let msg = body
                    .get("errmsg")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                return Err(NotifyError::Platform(format!(
                    "DingTalk API error {}: {}",
                    errcode, msg
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for DingTalkNotifier {
    /// # Summary
    /// Sends a trading signal as a markdown message.
    ///
    /// # Logic
    /// 1. Renders the markdown body.
    /// 2. Wraps it in the DingTalk `markdown` msgtype envelope with the
    ///    title "【signal】name code".
    /// 3. Posts and checks `errcode`.
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError> {
        let markdown = Self::format_signal_markdown(signal);
        let message = json!({
            "msgtype": "markdown",
            "markdown": {
                "title": format!("【{}】{} {}", signal.signal, signal.stock_name, signal.stock_code),
                "text": markdown,
            },
            "at": { "isAtAll": false },
        });

        self.send_request(message).await
    }

    /// Sends a plain text message.
    async fn send_message(&self, message: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "msgtype": "text",
            "text": { "content": message },
        });
        self.send_request(payload).await
    }
}
