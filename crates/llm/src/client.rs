use async_trait::async_trait;
use kanpan_core::config::{AiConfig, ConfigError};
use kanpan_core::llm::error::LlmError;
use kanpan_core::llm::port::LlmPort;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
const DEEPSEEK_MODEL: &str = "deepseek-chat";
const QWEN_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const QWEN_MODEL: &str = "qwen-plus";

/// 请求超时。深度分析提示词较长，推理型模型的生成时间以分钟计。
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// # Summary
/// AI 提供商配置变体。提供商集合在编译期封闭：
/// 两个内置端点加一个自定义 OpenAI 兼容端点。
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    DeepSeek {
        api_key: String,
    },
    Qwen {
        api_key: String,
    },
    Custom {
        base_url: String,
        api_key: String,
        model: String,
    },
}

impl ProviderConfig {
    /// # Summary
    /// 从系统配置解析提供商变体。
    ///
    /// # Logic
    /// 1. 按 provider 字段分派，未知取值为构建期错误。
    /// 2. 各变体要求的凭据字段此前已由 `SystemConfig::validate` 保证非空。
    pub fn from_ai_config(cfg: &AiConfig) -> Result<Self, ConfigError> {
        match cfg.provider.as_str() {
            "deepseek" => Ok(ProviderConfig::DeepSeek {
                api_key: cfg.deepseek_key.clone(),
            }),
            "qwen" => Ok(ProviderConfig::Qwen {
                api_key: cfg.qwen_key.clone(),
            }),
            "custom" => Ok(ProviderConfig::Custom {
                base_url: cfg.custom_api_url.clone(),
                api_key: cfg.custom_api_key.clone(),
                model: cfg.custom_model_name.clone(),
            }),
            other => Err(ConfigError(format!("不支持的AI提供商: {}", other))),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ProviderConfig::DeepSeek { .. } => "deepseek",
            ProviderConfig::Qwen { .. } => "qwen",
            ProviderConfig::Custom { .. } => "custom",
        }
    }

    /// 解析为 (chat/completions 端点, API Key, 模型名)
    fn resolve(&self) -> (String, &str, &str) {
        let (base, key, model) = match self {
            ProviderConfig::DeepSeek { api_key } => (DEEPSEEK_BASE_URL, api_key, DEEPSEEK_MODEL),
            ProviderConfig::Qwen { api_key } => (QWEN_BASE_URL, api_key, QWEN_MODEL),
            ProviderConfig::Custom {
                base_url,
                api_key,
                model,
            } => (base_url.as_str(), api_key, model.as_str()),
        };
        (
            format!("{}/chat/completions", base.trim_end_matches('/')),
            key,
            model,
        )
    }
}

/// # Summary
/// 大模型对话客户端，面向 OpenAI 兼容的 chat/completions 协议。
///
/// # Invariants
/// - 一次 `chat` 调用对应一次非流式补全请求。
pub struct ChatClient {
    provider: ProviderConfig,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// # Summary
    /// 创建对话客户端。
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// 从系统配置直接构建，未知提供商返回配置错误
    pub fn from_ai_config(cfg: &AiConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(ProviderConfig::from_ai_config(cfg)?))
    }
}

#[async_trait]
impl LlmPort for ChatClient {
    /// # Summary
    /// 发送一轮 system + user 对话并返回助手回复文本。
    ///
    /// # Logic
    /// 1. 按提供商变体解析端点、密钥与模型。
    /// 2. POST chat/completions（非流式）。
    /// 3. 非 2xx 返回 `LlmError::Api`，空 choices 或空 content 返回 `EmptyContent`。
    async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let (url, api_key, model) = self.provider.resolve();
        debug!(provider = self.provider.name(), model, "发起AI补全请求");

        let payload = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
