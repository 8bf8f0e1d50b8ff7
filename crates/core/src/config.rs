//! # 系统配置
//!
//! 对应 `config_stock.json` 的完整结构与启动期校验。
//! 校验在填充默认值的同时执行，任何违反约束的配置在启动期直接失败。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// 配置校验错误，启动期致命
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// 控制面默认 API Token。仅用于测试，生产环境务必修改！
pub const DEFAULT_API_TOKEN: &str = "1122334455667788";

// 默认值函数
fn default_scan_interval() -> i64 {
    5
}
fn default_min_confidence() -> i64 {
    70
}
fn default_history_limit() -> i64 {
    20
}
fn default_max_concurrent() -> i64 {
    3
}
fn default_analysis_mode() -> String {
    "smart".to_string()
}
fn default_log_dir() -> String {
    "stock_analysis_logs".to_string()
}
fn default_api_port() -> u16 {
    9090
}
fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}
fn default_trading_hours() -> Vec<String> {
    vec!["09:30-11:30".to_string(), "13:00-15:00".to_string()]
}

/// # Summary
/// 股票分析系统顶层配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// 行情服务基地址
    pub tdx_api_url: String,
    /// AI 提供商配置
    pub ai_config: AiConfig,
    /// 受监控股票列表
    pub stocks: Vec<StockItem>,
    /// 通知配置
    #[serde(default)]
    pub notification: NotificationConfig,
    /// 交易时间配置
    #[serde(default)]
    pub trading_time: TradingTimeConfig,
    /// 控制面监听端口
    #[serde(default = "default_api_port")]
    pub api_server_port: u16,
    /// 日志目录
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// 控制面认证 Token；为空时回落到环境变量 API_TOKEN，再回落到默认值
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_token: String,
    /// 每只股票保留的分析历史条数（钳制到 [3, 100]）
    #[serde(default = "default_history_limit")]
    pub analysis_history_limit: i64,
    /// 分析模式："smart" / "concurrent" / "polling"
    #[serde(default = "default_analysis_mode")]
    pub analysis_mode: String,
    /// 最大并发分析数（钳制到 [1, 4]）
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_analysis: i64,
}

/// AI 提供商配置。provider 取值 "deepseek" / "qwen" / "custom"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    pub provider: String,
    #[serde(default)]
    pub deepseek_key: String,
    #[serde(default)]
    pub qwen_key: String,
    #[serde(default)]
    pub custom_api_url: String,
    #[serde(default)]
    pub custom_api_key: String,
    #[serde(default)]
    pub custom_model_name: String,
}

/// # Summary
/// 单只股票的监控配置。
///
/// # Invariants
/// - `code` 在列表内唯一。
/// - 持仓数量与购买价格要么同时为正（持仓模式），要么同时为零（监控模式）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub code: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_minutes: i64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: i64,
    /// 持仓数量（股），0 表示监控模式
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub position_quantity: i64,
    /// 购买价格（元/股），0 表示监控模式
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub buy_price: f64,
    /// 购买日期（YYYY-MM-DD，可选）
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub buy_date: String,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}
fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

impl StockItem {
    /// 扫描间隔
    pub fn scan_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scan_interval_minutes.max(1) as u64 * 60)
    }

    /// 是否为持仓模式（数量与买价均为正）
    pub fn is_holding_mode(&self) -> bool {
        self.position_quantity > 0 && self.buy_price > 0.0
    }

    /// 填充单项默认值
    fn set_defaults(&mut self) {
        if self.scan_interval_minutes <= 0 {
            self.scan_interval_minutes = default_scan_interval();
        }
        if self.min_confidence <= 0 {
            self.min_confidence = default_min_confidence();
        }
    }
}

/// 通知配置（总开关 + 各渠道独立开关）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub dingtalk: ChannelConfig,
    #[serde(default)]
    pub feishu: ChannelConfig,
}

/// 单个 Webhook 渠道配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub secret: String,
}

/// 交易时间配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingTimeConfig {
    #[serde(default)]
    pub enable_check: bool,
    #[serde(default = "default_trading_hours")]
    pub trading_hours: Vec<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for TradingTimeConfig {
    fn default() -> Self {
        Self {
            enable_check: false,
            trading_hours: default_trading_hours(),
            timezone: default_timezone(),
        }
    }
}

impl SystemConfig {
    /// # Summary
    /// 校验配置并填充默认值。
    ///
    /// # Logic
    /// 1. 行情地址、AI 提供商及其密钥必须完整。
    /// 2. 股票列表非空、代码唯一、至少启用一只；持仓字段成对出现。
    /// 3. 数值参数钳制到各自的合法区间。
    /// 4. Token 按 配置 → 环境变量 API_TOKEN → 默认值 的顺序回落。
    /// 5. 启用通知时至少启用一个渠道，且启用的渠道必须配置 webhook_url。
    ///
    /// # Returns
    /// * 校验通过返回 `Ok(())`，否则返回首个违反项的 `ConfigError`。
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.tdx_api_url.is_empty() {
            return Err(ConfigError("tdx_api_url不能为空".into()));
        }

        // AI 配置
        match self.ai_config.provider.as_str() {
            "" => return Err(ConfigError("ai_config.provider不能为空".into())),
            "deepseek" => {
                if self.ai_config.deepseek_key.is_empty() {
                    return Err(ConfigError("使用DeepSeek时必须配置deepseek_key".into()));
                }
            }
            "qwen" => {
                if self.ai_config.qwen_key.is_empty() {
                    return Err(ConfigError("使用Qwen时必须配置qwen_key".into()));
                }
            }
            "custom" => {
                if self.ai_config.custom_api_url.is_empty()
                    || self.ai_config.custom_api_key.is_empty()
                    || self.ai_config.custom_model_name.is_empty()
                {
                    return Err(ConfigError(
                        "使用自定义API时必须配置custom_api_url, custom_api_key和custom_model_name"
                            .into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError(format!(
                    "ai_config.provider必须是 'deepseek', 'qwen' 或 'custom'，当前为 '{}'",
                    other
                )));
            }
        }

        // 股票列表
        if self.stocks.is_empty() {
            return Err(ConfigError("至少需要配置一只股票".into()));
        }

        let mut seen = std::collections::HashSet::new();
        let mut enabled_count = 0;
        for (i, stock) in self.stocks.iter_mut().enumerate() {
            stock.set_defaults();

            if stock.code.is_empty() {
                return Err(ConfigError(format!("stocks[{}]: code不能为空", i)));
            }
            if stock.name.is_empty() {
                return Err(ConfigError(format!("stocks[{}]: name不能为空", i)));
            }
            if !seen.insert(stock.code.clone()) {
                return Err(ConfigError(format!(
                    "stocks[{}]: 股票代码 '{}' 重复",
                    i, stock.code
                )));
            }
            if stock.enabled {
                enabled_count += 1;
            }

            // 持仓字段必须成对出现
            if (stock.position_quantity > 0 && stock.buy_price <= 0.0)
                || (stock.position_quantity <= 0 && stock.buy_price > 0.0)
            {
                return Err(ConfigError(format!(
                    "stocks[{}]: 持仓数量和购买价格必须同时填写",
                    i
                )));
            }
            if stock.position_quantity < 0 {
                return Err(ConfigError(format!("stocks[{}]: 持仓数量不能为负数", i)));
            }
            if stock.buy_price < 0.0 {
                return Err(ConfigError(format!("stocks[{}]: 购买价格不能为负数", i)));
            }
        }

        if enabled_count == 0 {
            return Err(ConfigError("至少需要启用一只股票".into()));
        }

        // 数值参数钳制
        if self.api_server_port == 0 {
            self.api_server_port = default_api_port();
        }
        if self.log_dir.is_empty() {
            self.log_dir = default_log_dir();
        }
        self.analysis_history_limit = if self.analysis_history_limit <= 0 {
            default_history_limit()
        } else {
            self.analysis_history_limit.clamp(3, 100)
        };
        self.max_concurrent_analysis = if self.max_concurrent_analysis <= 0 {
            default_max_concurrent()
        } else {
            self.max_concurrent_analysis.clamp(1, 4)
        };

        // 非法模式降级为 smart（与缺省行为一致，只告警不拒绝）
        if self.analysis_mode.parse::<crate::common::AnalysisMode>().is_err() {
            warn!(
                "无效的分析模式 '{}'，将使用默认模式 'smart'",
                self.analysis_mode
            );
            self.analysis_mode = default_analysis_mode();
        }

        // 交易时间默认值
        if self.trading_time.timezone.is_empty() {
            self.trading_time.timezone = default_timezone();
        }
        if self.trading_time.trading_hours.is_empty() {
            self.trading_time.trading_hours = default_trading_hours();
        }

        // Token 回落链：配置 → 环境变量 → 默认值
        if self.api_token.is_empty() {
            if let Ok(env_token) = std::env::var("API_TOKEN") {
                if !env_token.is_empty() {
                    self.api_token = env_token;
                }
            }
        }
        if self.api_token.is_empty() {
            self.api_token = DEFAULT_API_TOKEN.to_string();
            warn!("使用默认API Token，为了安全，请在生产环境中修改！");
        }

        // 通知配置
        if self.notification.enabled {
            if !self.notification.dingtalk.enabled && !self.notification.feishu.enabled {
                return Err(ConfigError(
                    "启用通知时至少需要配置一个通知渠道（钉钉或飞书）".into(),
                ));
            }
            if self.notification.dingtalk.enabled
                && self.notification.dingtalk.webhook_url.is_empty()
            {
                return Err(ConfigError("启用钉钉通知时必须配置webhook_url".into()));
            }
            if self.notification.feishu.enabled && self.notification.feishu.webhook_url.is_empty() {
                return Err(ConfigError("启用飞书通知时必须配置webhook_url".into()));
            }
        }

        Ok(())
    }

    /// 启用的股票子集
    pub fn enabled_stocks(&self) -> Vec<&StockItem> {
        self.stocks.iter().filter(|s| s.enabled).collect()
    }
}
