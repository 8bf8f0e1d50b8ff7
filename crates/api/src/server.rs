//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`，而是由 `crates/app` 的 DI 容器持有并调用。

use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use kanpan_core::market::port::MarketData;
use kanpan_core::scheduler::port::SchedulerPort;
use kanpan_store::config::ConfigStore;

use crate::routes::{analysis, config, health, selftest, stocks, system};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 所有端口句柄在服务启动前由 DI 容器注入，生命周期与进程等同。
/// - 重启信号经 `restart_tx` 投递给主循环，API 层不直接退出进程。
#[derive(Clone)]
pub struct AppState {
    /// 调度器端口
    pub scheduler: Arc<dyn SchedulerPort>,
    /// 配置文件存取器
    pub config_store: Arc<ConfigStore>,
    /// 行情数据源（自检接口使用）
    pub market: Arc<dyn MarketData>,
    /// 控制面 API Token
    pub api_token: String,
    /// 重启信号通道（发送端）
    pub restart_tx: mpsc::Sender<()>,
    /// 进程启动时刻（统计接口使用）
    pub started_at: Instant,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "看盘 AI 股票分析 API",
        version = "0.1.0",
        description = "AI 股票分析系统的控制面 API。提供分析历史查询、手动触发、配置管理与系统控制功能。",
        license(name = "MIT")
    ),
    tags(
        (name = "系统 (System)", description = "健康检查、统计与重启"),
        (name = "配置 (Config)", description = "配置文件的读取与保存"),
        (name = "股票 (Stocks)", description = "受监控股票列表"),
        (name = "分析 (Analysis)", description = "分析历史查询与手动触发"),
        (name = "自检 (SelfTest)", description = "连通性与配置完整性检查")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// # Summary
/// 构建完整的路由树（含 Swagger UI 与 CORS）。
///
/// # Logic
/// 1. 全部接口注册进 OpenApiRouter，自动收集 OpenAPI 文档。
/// 2. `/health` 作为 `/api/health` 的别名单独挂载（兼容旧探活脚本）。
/// 3. CORS 全放行：控制面假定运行在可信网段，页面跨端口访问。
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(health::health))
        .routes(routes!(config::get_config, config::save_config))
        .routes(routes!(stocks::list_stocks))
        .routes(routes!(analysis::latest_analysis))
        .routes(routes!(analysis::analysis_history))
        .routes(routes!(analysis::recent_analysis))
        .routes(routes!(analysis::trigger_analysis))
        .routes(routes!(system::statistics))
        .routes(routes!(system::restart))
        .routes(routes!(selftest::system_test))
        .routes(routes!(selftest::test_tdx))
        .routes(routes!(selftest::test_ai))
        .routes(routes!(selftest::test_stock))
        .with_state(state)
        .split_for_parts();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .route("/health", get(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// # Summary
/// 绑定端口并启动 HTTP 服务，直到进程退出。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态。
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:9090"`。
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_router(state);

    tracing::info!("🚀 股票分析API服务器启动在 {}", bind_addr);
    tracing::info!("📖 Swagger UI: http://{}/swagger-ui/", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
