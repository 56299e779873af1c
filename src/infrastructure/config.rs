use serde::Deserialize;

use crate::domain::entity::course::CourseLookupField;
use crate::domain::entity::user::UserLookupField;
use crate::infrastructure::csv_reader::ImportLimits;
use crate::infrastructure::database::DatabaseConfig;

/// Config はアプリケーション全体の設定。
#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path, e))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}

/// AppConfig はアプリケーション設定。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

/// ServerConfig はサーバー設定。
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8120
}

/// StorageConfig は取り消し CSV の保存先設定。
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// "memory" または "local"
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_storage_root")]
    pub root_dir: String,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_storage_root() -> String {
    "data/files".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root_dir: default_storage_root(),
        }
    }
}

/// ImportConfig はインポート処理の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: usize,
    #[serde(default = "default_max_rows")]
    pub max_rows_per_import: usize,
    /// 区切り文字 "cfg" 選択時に使う既定の区切り文字
    #[serde(default = "default_delimiter")]
    pub default_delimiter: char,
    #[serde(default)]
    pub course_lookup_field: CourseLookupField,
    #[serde(default)]
    pub user_lookup_field: UserLookupField,
    #[serde(default = "default_download_endpoint")]
    pub download_endpoint: String,
}

fn default_max_file_size() -> usize {
    50
}

fn default_max_rows() -> usize {
    100_000
}

fn default_delimiter() -> char {
    ','
}

fn default_download_endpoint() -> String {
    "/api/v1/completion-imports/revert".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size(),
            max_rows_per_import: default_max_rows(),
            default_delimiter: default_delimiter(),
            course_lookup_field: CourseLookupField::default(),
            user_lookup_field: UserLookupField::default(),
            download_endpoint: default_download_endpoint(),
        }
    }
}

impl ImportConfig {
    pub fn limits(&self) -> ImportLimits {
        ImportLimits {
            max_file_size_bytes: self.max_file_size_mb.saturating_mul(1024 * 1024),
            max_rows: self.max_rows_per_import,
        }
    }

    /// 既定の区切り文字をバイト値で返す。ASCII 以外はカンマにフォールバックする。
    pub fn default_delimiter_byte(&self) -> u8 {
        u8::try_from(self.default_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or(b',')
    }
}

/// LoggingConfig はログ出力の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" または "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
app:
  name: "completion-import-server"
  version: "0.1.0"
  environment: "dev"
server:
  host: "0.0.0.0"
  port: 8120
storage:
  backend: "local"
  root_dir: "/var/lib/completion-import"
import:
  max_rows_per_import: 500
  default_delimiter: ";"
  course_lookup_field: "idnumber"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.name, "completion-import-server");
        assert_eq!(config.server.port, 8120);
        assert!(config.database.is_none());
        assert_eq!(config.storage.backend, "local");
        assert_eq!(config.import.max_rows_per_import, 500);
        assert_eq!(config.import.default_delimiter_byte(), b';');
        assert_eq!(config.import.course_lookup_field, CourseLookupField::IdNumber);
        assert_eq!(config.import.user_lookup_field, UserLookupField::Id);
    }

    #[test]
    fn test_config_defaults() {
        let yaml = r#"
app:
  name: "completion-import-server"
server: {}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.version, "0.1.0");
        assert_eq!(config.app.environment, "dev");
        assert_eq!(config.server.port, 8120);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.import.download_endpoint,
            "/api/v1/completion-imports/revert"
        );
        let limits = config.import.limits();
        assert_eq!(limits.max_file_size_bytes, 50 * 1024 * 1024);
        assert_eq!(limits.max_rows, 100_000);
    }

    #[test]
    fn test_non_ascii_delimiter_falls_back_to_comma() {
        let config = ImportConfig {
            default_delimiter: '、',
            ..ImportConfig::default()
        };
        assert_eq!(config.default_delimiter_byte(), b',');
    }

    #[test]
    fn test_huge_file_size_saturates() {
        let config = ImportConfig {
            max_file_size_mb: usize::MAX,
            ..ImportConfig::default()
        };
        assert_eq!(config.limits().max_file_size_bytes, usize::MAX);
    }
}
