//! # `kanpan-analysis` - 分析流水线
//!
//! 单只股票的完整分析链路：指标计算 → 提示词组装 → AI 调用 →
//! 决策解析与校验 → 结果组装 → 条件通知。

pub mod analyzer;
pub mod decision;
pub mod indicators;
pub mod prompt;
