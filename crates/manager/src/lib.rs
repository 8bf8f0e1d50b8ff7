//! # `kanpan-manager` - 调度层
//!
//! 持有全部股票分析器，实现并发/轮询两种执行策略、每股独立节奏、
//! 优雅取消与内存历史记录。对 HTTP 层暴露 `SchedulerPort`。

pub mod history;
pub mod scheduler;
