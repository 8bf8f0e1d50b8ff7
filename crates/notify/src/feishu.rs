use crate::format::{format_reasoning, signal_color, signal_emoji};
use async_trait::async_trait;
use chrono_tz::Asia::Shanghai;
use kanpan_core::notify::entity::TradingSignal;
use kanpan_core::notify::error::NotifyError;
use kanpan_core::notify::port::Notifier;
use serde_json::{json, Value};

/// # Summary
/// A notifier implementation that posts interactive cards to a Feishu
/// (Lark) group robot webhook.
///
/// # Invariants
/// * `webhook_url` must be a valid Feishu robot endpoint.
pub struct FeishuNotifier {
    /// The robot webhook URL.
    webhook_url: String,
    /// Optional signing secret.
    /// TODO: implement Feishu HMAC-SHA256 signing per
    /// https://open.feishu.cn/document/ukTMukTMukTM/ucTM5YjL3ETO24yNxkjN
    #[allow(dead_code)]
    secret: String,
    /// The HTTP client used for requests.
    client: reqwest::Client,
}

impl FeishuNotifier {
    /// # Summary
    /// Creates a new `FeishuNotifier`.
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

    /// Two side-by-side lark_md fields in one row.
    fn field_row(fields: Vec<Value>) -> Value {
        json!({ "tag": "div", "fields": fields })
    }

    fn short_field(content: String) -> Value {
        json!({
            "is_short": true,
            "text": { "tag": "lark_md", "content": content },
        })
    }

    fn section_title(content: &str) -> Value {
        json!({
            "tag": "div",
            "text": { "tag": "lark_md", "content": content },
        })
    }

    /// Builds the interactive card mirroring the DingTalk section layout:
    /// colored header, note, ①core metrics ②advice ③reasoning ④timestamp.
    fn format_signal_card(signal: &TradingSignal) -> Value {
        let emoji = signal_emoji(signal.signal);
        let color = signal_color(signal.signal);

        let mut elements = vec![
            json!({
                "tag": "note",
                "elements": [{ "tag": "plain_text", "content": "【AI股票分析系统】" }],
            }),
            json!({ "tag": "hr" }),
            Self::section_title("**1️⃣  核心指标**"),
            Self::field_row(vec![
                Self::short_field(format!("💰 **当前价格**\n{:.2}元", signal.price)),
                Self::short_field(format!("📈 **信心度**\n{}%", signal.confidence)),
            ]),
        ];

        // 2️⃣ 交易建议
        if signal.target_price > 0.0 || signal.stop_loss > 0.0 || !signal.risk_reward.is_empty() {
            elements.push(Self::section_title("**2️⃣  交易建议**"));
            let mut fields = Vec::new();
            if signal.target_price > 0.0 {
                fields.push(Self::short_field(format!(
                    "**目标价格**\n{:.2}元",
                    signal.target_price
                )));
            }
            if signal.stop_loss > 0.0 {
                fields.push(Self::short_field(format!(
                    "**止损价格**\n{:.2}元",
                    signal.stop_loss
                )));
            }
            if !signal.risk_reward.is_empty() {
                fields.push(Self::short_field(format!(
                    "**风险回报比**\n{}",
                    signal.risk_reward
                )));
            }
            if !fields.is_empty() {
                elements.push(Self::field_row(fields));
            }
        }

        // 持仓信息（持仓模式下）
        if let Some(info) = &signal.position_info {
            let mut fields = Vec::new();
            if info.quantity > 0 {
                fields.push(Self::short_field(format!("**持仓数量**\n{}股", info.quantity)));
            }
            if info.buy_price > 0.0 {
                fields.push(Self::short_field(format!(
                    "**购买价格**\n{:.2}元/股",
                    info.buy_price
                )));
            }
            if info.current_price > 0.0 {
                fields.push(Self::short_field(format!(
                    "**当前价格**\n{:.2}元/股",
                    info.current_price
                )));
            }
            let profit_emoji = if info.profit_loss < 0.0 { "📉" } else { "📈" };
            fields.push(Self::short_field(format!(
                "**浮动盈亏**\n{}{:.2}元\n{:.2}%",
                profit_emoji, info.profit_loss, info.profit_loss_percent
            )));
            elements.push(Self::field_row(fields));

            let mut stop_fields = Vec::new();
            if signal.position_profit_target > 0.0 {
                stop_fields.push(Self::short_field(format!(
                    "**持仓止盈价**\n{:.2}元",
                    signal.position_profit_target
                )));
            }
            if signal.position_stop_loss > 0.0 {
                stop_fields.push(Self::short_field(format!(
                    "**持仓止损价**\n{:.2}元",
                    signal.position_stop_loss
                )));
            }
            if !stop_fields.is_empty() {
                elements.push(Self::field_row(stop_fields));
            }
        }

        // 3️⃣ 分析原因
        elements.push(json!({ "tag": "hr" }));
        elements.push(Self::section_title("**3️⃣  分析原因**"));
        elements.push(Self::section_title(&format_reasoning(&signal.reasoning)));

        // 4️⃣ 分析时间与风险提示
        elements.push(json!({ "tag": "hr" }));
        elements.push(Self::section_title(&format!(
            "**4️⃣  分析时间**  {}",
            signal
                .timestamp
                .with_timezone(&Shanghai)
                .format("%Y-%m-%d %H:%M:%S")
        )));
        elements.push(json!({
            "tag": "note",
            "elements": [{
                "tag": "plain_text",
                "content": "‼️ 本分析仅供参考，投资有风险，决策需谨慎",
            }],
        }));

        json!({
            "config": { "wide_screen_mode": true },
            "header": {
                "title": {
                    "tag": "plain_text",
                    "content": format!(
                        "{} {}信号 - {}({})",
                        emoji,
                        signal.signal.label_cn(),
                        signal.stock_name,
                        signal.stock_code
                    ),
                },
                "template": color,
            },
            "elements": elements,
        })
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
                "Feishu API error: {}",
                error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if let Some(code) = body.get("code").and_then(Value::as_i64) {
            if code != 0 {
                let msg = body.get("msg").and_then(Value::as_str).unwrap_or("unknown");
                return Err(NotifyError::Platform(format!(
                    "Feishu API error {}: {}",
                    code, msg
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for FeishuNotifier {
    /// Sends a trading signal as an interactive card.
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError> {
        let card = Self::format_signal_card(signal);
        let message = json!({
            "msg_type": "interactive",
            "card": card,
        });
        self.send_request(message).await
    }

    /// Sends a plain text message.
    async fn send_message(&self, message: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "msg_type": "text",
            "content": { "text": message },
        });
        self.send_request(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kanpan_core::common::Signal;

    fn sample_signal(signal: Signal) -> TradingSignal {
        TradingSignal {
            stock_code: "600519".into(),
            stock_name: "贵州茅台".into(),
            signal,
            price: 1680.0,
            confidence: 72,
            reasoning: "缩量盘整".into(),
            target_price: 0.0,
            stop_loss: 0.0,
            risk_reward: String::new(),
            timestamp: Utc::now(),
            technical_data: None,
            position_profit_target: 0.0,
            position_stop_loss: 0.0,
            position_info: None,
        }
    }

    #[test]
    fn card_header_uses_signal_color() {
        let card = FeishuNotifier::format_signal_card(&sample_signal(Signal::Buy));
        assert_eq!(card["header"]["template"], "red");
        let title = card["header"]["title"]["content"].as_str().unwrap();
        assert!(title.contains("买入信号"));
        assert!(title.contains("贵州茅台(600519)"));

        let card = FeishuNotifier::format_signal_card(&sample_signal(Signal::Sell));
        assert_eq!(card["header"]["template"], "green");
        let card = FeishuNotifier::format_signal_card(&sample_signal(Signal::Hold));
        assert_eq!(card["header"]["template"], "yellow");
    }

    #[test]
    fn card_elements_carry_core_sections() {
        let card = FeishuNotifier::format_signal_card(&sample_signal(Signal::Hold));
        let rendered = card.to_string();
        assert!(rendered.contains("1️⃣  核心指标"));
        assert!(rendered.contains("3️⃣  分析原因"));
        assert!(rendered.contains("投资有风险"));
        // HOLD 无建议价位时不渲染交易建议段
        assert!(!rendered.contains("2️⃣  交易建议"));
    }
}
