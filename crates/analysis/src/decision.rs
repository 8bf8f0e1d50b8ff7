//! AI 回复的决策解析与合理性校验。
//!
//! 模型输出可能是裸 JSON、```json 围栏块，或夹杂解释文字的 JSON 片段，
//! 三种形态都必须接受。校验只产生警告，从不否决决策。

use kanpan_core::analysis::entity::Decision;
use kanpan_core::common::Signal;

/// 校验警告在 reasoning 中的标题
pub const SYSTEM_NOTE_HEADING: &str = "【系统提示】";

/// # Summary
/// 从可能含噪声的 AI 回复中解析决策 JSON。
///
/// # Logic
/// 1. 整体按 JSON 解析。
/// 2. 失败则提取 ```json（或 ```）围栏内的内容再解析。
/// 3. 仍失败则取首个 '{' 到末个 '}' 的子串解析。
/// 4. 解析成功后把 confidence 钳制到 [0, 100]。
///
/// # Returns
/// * 三种形态均无法解析时返回 `Err`，调用方负责降级为观望决策。
pub fn parse_decision(raw: &str) -> Result<Decision, String> {
    let candidates = [
        Some(raw.trim().to_string()),
        extract_fenced(raw),
        extract_braced(raw),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(mut decision) = serde_json::from_str::<Decision>(&candidate) {
            decision.confidence = decision.confidence.clamp(0, 100);
            return Ok(decision);
        }
    }

    Err(format!("无法从AI回复中解析出决策JSON: {}", truncate(raw, 200)))
}

/// 提取 ```json ... ``` 围栏块内容（语言标注可省略）
fn extract_fenced(raw: &str) -> Option<String> {
    let start = raw.find("```")? + 3;
    let rest = &raw[start..];
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let end = rest.find("```")?;
    Some(rest[..end].trim().to_string())
}

/// 提取首个 '{' 到末个 '}' 的子串
fn extract_braced(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(raw[start..=end].to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// # Summary
/// 对决策做价格合理性校验，产生警告列表。
///
/// # Logic
/// 1. BUY 的目标价应高于当前价、止损价应低于当前价。
/// 2. 任一价格字段偏离当前价超过 ±50% 视为可疑。
/// 3. HOLD 却给出目标价且信心度 ≥ 80，提示信号可能应为 BUY。
///
/// 校验只提示，不修改决策本身。
pub fn validate_decision(decision: &Decision, current_price: f64) -> Vec<String> {
    let mut warnings = Vec::new();
    if current_price <= 0.0 {
        return warnings;
    }

    if decision.signal == Signal::Buy {
        if decision.target_price > 0.0 && decision.target_price <= current_price {
            warnings.push(format!(
                "BUY信号的目标价({:.2}元)不高于当前价({:.2}元)",
                decision.target_price, current_price
            ));
        }
        if decision.stop_loss > 0.0 && decision.stop_loss >= current_price {
            warnings.push(format!(
                "BUY信号的止损价({:.2}元)不低于当前价({:.2}元)",
                decision.stop_loss, current_price
            ));
        }
    }

    // 偏离检查覆盖全部价格字段
    let price_fields = [
        ("目标价", decision.target_price),
        ("止损价", decision.stop_loss),
        ("持仓止盈价", decision.position_profit_target),
        ("持仓止损价", decision.position_stop_loss),
    ];
    for (label, price) in price_fields {
        if price > 0.0 && (price - current_price).abs() / current_price > 0.5 {
            warnings.push(format!(
                "{}({:.2}元)偏离当前价({:.2}元)超过50%",
                label, price, current_price
            ));
        }
    }

    if decision.signal == Signal::Hold && decision.target_price > 0.0 && decision.confidence >= 80 {
        warnings.push(
            "HOLD信号给出了目标价且信心度较高，请确认是否应为BUY信号".to_string(),
        );
    }

    warnings
}

/// 把警告追加到 reasoning 尾部的【系统提示】段落
pub fn append_warnings(reasoning: &mut String, warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    reasoning.push_str("\n\n");
    reasoning.push_str(SYSTEM_NOTE_HEADING);
    reasoning.push('\n');
    reasoning.push_str(&warnings.join("\n"));
}
