//! 配置文件的读写与备份。
//!
//! 运行中的调度器只反映启动时加载的配置；保存新配置后需要重启生效，
//! 热加载不在设计范围内。

use chrono::Local;
use kanpan_core::config::SystemConfig;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 配置持久化错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 文件读写失败
    #[error("读写配置文件失败: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析或序列化失败
    #[error("解析配置文件失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 配置内容校验失败
    #[error("配置验证失败: {0}")]
    Invalid(#[from] kanpan_core::config::ConfigError),
}

/// # Summary
/// 配置文件存取器，对同一路径的写操作做串行化。
///
/// # Invariants
/// - 写之前把旧文件改名为带时间戳的备份，不覆盖历史备份。
/// - 读路径无锁：配置文件体量小，读取竞争可忽略。
pub struct ConfigStore {
    path: PathBuf,
    // 写串行化锁
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Summary
    /// 加载并校验配置。
    ///
    /// # Logic
    /// 1. 读文件、解析 JSON。
    /// 2. `SystemConfig::validate` 填充默认值并检查约束。
    ///
    /// # Returns
    /// * 校验通过的配置；任何一步失败返回 `StoreError`。
    pub async fn load(&self) -> Result<SystemConfig, StoreError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let mut config: SystemConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// 读取原始 JSON（控制面 GET /api/config 直接回显文件内容）
    pub async fn raw(&self) -> Result<Value, StoreError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// # Summary
    /// 保存新配置，旧文件改名备份。
    ///
    /// # Logic
    /// 1. 取写锁，保证并发保存串行执行。
    /// 2. 旧文件改名为 `<name>.backup.<YYYYMMDDhhmmss>`（失败仅告警）。
    /// 3. 按 2 空格缩进写入新内容。
    ///
    /// # Returns
    /// * 成功返回备份文件名（旧文件不存在时为 None）。
    pub async fn save(&self, config: &Value) -> Result<Option<String>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let data = serde_json::to_string_pretty(config)?;

        let backup_name = format!(
            "{}.backup.{}",
            self.path.display(),
            Local::now().format("%Y%m%d%H%M%S")
        );
        let backup = match tokio::fs::rename(&self.path, &backup_name).await {
            Ok(()) => {
                info!("✓ 配置文件已备份: {}", backup_name);
                Some(backup_name)
            }
            Err(e) => {
                warn!("备份配置文件失败: {}", e);
                None
            }
        };

        tokio::fs::write(&self.path, data).await?;
        info!("✓ 配置文件已更新: {}", self.path.display());

        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config_text() -> &'static str {
        r#"{
  "tdx_api_url": "http://127.0.0.1:7700",
  "ai_config": {"provider": "deepseek", "deepseek_key": "sk-test"},
  "stocks": [{"code": "000001", "name": "平安银行", "enabled": true}]
}"#
    }

    #[tokio::test]
    async fn load_validates_and_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_stock.json");
        tokio::fs::write(&path, sample_config_text()).await.unwrap();

        let store = ConfigStore::new(&path);
        let config = store.load().await.unwrap();
        assert_eq!(config.api_server_port, 9090);
        assert_eq!(config.stocks[0].min_confidence, 70);
    }

    #[tokio::test]
    async fn load_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_stock.json");
        tokio::fs::write(&path, r#"{"tdx_api_url": "", "ai_config": {"provider": "deepseek"}, "stocks": []}"#)
            .await
            .unwrap();

        let store = ConfigStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn save_backs_up_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_stock.json");
        tokio::fs::write(&path, sample_config_text()).await.unwrap();

        let store = ConfigStore::new(&path);
        let mut updated: Value = serde_json::from_str(sample_config_text()).unwrap();
        updated["api_server_port"] = serde_json::json!(9191);

        let backup = store.save(&updated).await.unwrap();
        let backup = backup.expect("backup name expected");
        assert!(backup.contains(".backup."));
        assert!(tokio::fs::try_exists(&backup).await.unwrap());

        let reloaded = store.raw().await.unwrap();
        assert_eq!(reloaded["api_server_port"], 9191);
    }

    #[tokio::test]
    async fn save_without_existing_file_skips_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_stock.json");

        let store = ConfigStore::new(&path);
        let value: Value = serde_json::from_str(sample_config_text()).unwrap();
        let backup = store.save(&value).await.unwrap();
        assert!(backup.is_none());
        assert!(tokio::fs::try_exists(&path).await.unwrap());
    }
}
