use crate::core::AlbumSettings;
use crate::utils::error::{AlbumError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest";
pub const DEFAULT_STORE_PATH: &str = "./pin-album.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub album: AlbumConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlbumConfig {
    /// 隨機翻頁的上限 (Flickr 只回傳前 4000 筆結果)
    pub max_pages: Option<u32>,
    /// 固定亂數種子，方便重現同一組相簿
    pub seed: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_key() -> String {
    std::env::var("FLICKR_API_KEY").unwrap_or_default()
}

fn default_per_page() -> u32 {
    21
}

fn default_radius_km() -> f64 {
    5.0
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: default_api_key(),
            per_page: default_per_page(),
            radius_km: default_radius_km(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AlbumError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::info!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AlbumError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FLICKR_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AlbumError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    pub fn album_settings(&self) -> AlbumSettings {
        AlbumSettings {
            fetch_timeout: self.fetch_timeout(),
            max_pages: self.album.max_pages,
            seed: self.album.seed,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_non_empty_string("source.api_key", &self.source.api_key)?;
        validation::validate_positive_number("source.per_page", self.source.per_page, 1)?;
        validation::validate_range("source.per_page", self.source.per_page, 1, 500)?;
        validation::validate_range("source.radius_km", self.source.radius_km, 0.0, 32.0)?;
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds,
            1,
        )?;
        validation::validate_path("store.path", &self.store.path)?;

        if let Some(max_pages) = self.album.max_pages {
            validation::validate_positive_number("album.max_pages", max_pages, 1)?;
        }

        Ok(())
    }
}
