use crate::analysis::error::AnalyzeError;
use thiserror::Error;

/// # Summary
/// 调度层错误枚举。
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// 目标股票没有注册分析器
    #[error("股票代码 {0} 的分析器不存在")]
    NotFound(String),

    /// 手动触发的分析执行失败
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
}
