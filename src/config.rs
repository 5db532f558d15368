use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const BASE_URL_ENV: &str = "INVENTORY_REPORT_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// バックエンドのベースURL
    pub base_url: String,
    /// エクスポートファイルの保存先
    pub download_dir: PathBuf,
    /// 未指定ならHTTPクライアントの既定値
    pub timeout_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            download_dir: PathBuf::from("."),
            timeout_seconds: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        // 環境変数を優先
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("inventory-report").join("config.json"))
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.override_base_url(url)?;
        self.save()
    }

    /// 保存せずにベースURLだけ差し替える（`--base-url`用）
    pub fn override_base_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "URLはhttp://またはhttps://で始まる必要があります: {}",
                url
            )));
        }
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn set_download_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.download_dir = dir;
        self.save()
    }
}
