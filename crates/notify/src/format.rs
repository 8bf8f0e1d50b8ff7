//! 通知内容的公共格式化工具。

use kanpan_core::common::Signal;
use regex::Regex;
use std::sync::LazyLock;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)[）)]").unwrap());
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// 信号对应的表情符号
pub fn signal_emoji(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "🚀",
        Signal::Sell => "⚠️",
        Signal::Hold => "⏸️",
    }
}

/// 信号对应的飞书卡片头部颜色
pub fn signal_color(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "red",
        Signal::Sell => "green",
        Signal::Hold => "yellow",
    }
}

/// # Summary
/// 格式化分析原因：模型常把编号列表挤在一行里（"1）...2）..."），
/// 在每个编号前插入空行使其分行显示。
///
/// # Logic
/// 1. 在 "N)" / "N）" 标记前插入两个换行。
/// 2. 连续 3 个以上换行压缩为 2 个。
/// 3. 去掉开头多余的换行。
pub fn format_reasoning(reasoning: &str) -> String {
    if reasoning.is_empty() {
        return reasoning.to_string();
    }

    let spaced = LIST_MARKER.replace_all(reasoning, "\n\n$0");
    let collapsed = EXCESS_NEWLINES.replace_all(&spaced, "\n\n");
    collapsed.trim_start_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_markers_are_split_onto_lines() {
        let input = "综合判断：1）均线多头排列；2）量能放大；3）盘口偏强。";
        let output = format_reasoning(input);
        assert!(output.contains("\n\n1）均线多头排列"));
        assert!(output.contains("\n\n2）量能放大"));
        assert!(output.contains("\n\n3）盘口偏强"));
    }

    #[test]
    fn ascii_parenthesis_markers_also_match() {
        let output = format_reasoning("结论 1) A 2) B");
        assert!(output.contains("\n\n1) A"));
        assert!(output.contains("\n\n2) B"));
    }

    #[test]
    fn newline_runs_are_collapsed_and_leading_trimmed() {
        let output = format_reasoning("1）开头就是编号\n\n\n\n后续内容");
        assert!(output.starts_with("1）开头就是编号"));
        assert!(!output.contains("\n\n\n"));
    }

    #[test]
    fn empty_reasoning_passes_through() {
        assert_eq!(format_reasoning(""), "");
    }
}
