//! # `kanpan-api` - HTTP 控制面
//!
//! 股票分析系统的 REST 服务入口。使用 `axum` 构建路由与控制器，
//! 通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收来自 Web 配置页或脚本的 HTTP 请求
//! - 所有响应统一为 `{code, message, data}` 信封，`code = 0` 表示成功
//! - 通过 `SchedulerPort` 调用调度器，不感知其并发实现
//! - 重启请求经 Token 认证后投递到主循环的重启通道，由 main 决定退出

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;
