//! Complaint Core 配置模块
//!
//! 该模块提供了应用程序配置管理功能，包括：
//! - 配置文件（单文件或目录）加载和解析
//! - 环境特定配置覆盖
//! - 环境变量覆盖
//! - 服务器、日志、数据库、地理定位等配置定义

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

mod manager;
pub use manager::ConfigManager;

/// 默认的地理定位服务基础 URL，IP 地址直接拼接在末尾
pub const DEFAULT_GEOLOCATION_BASE_URL: &str = "http://ip-api.com/json/";

/// 默认的 PostgreSQL 配置名称
pub const DEFAULT_POSTGRES_PROFILE: &str = "default";

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<ComplaintAppConfig> = OnceLock::new();

/// HTTP 服务器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub address: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    pub level: String,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_file: bool,
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

/// PostgreSQL 数据库实例配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PostgresInstanceConfig {
    /// 数据库连接 URL
    pub url: String,
    /// 最大连接数
    #[serde(default)]
    pub max_connections: Option<u32>,
    /// 最小连接数
    #[serde(default)]
    pub min_connections: Option<u32>,
}

/// 地理定位服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// 基础 URL，请求地址为 `<base_url><ip>`
    pub base_url: String,
    /// 请求超时（毫秒），未配置时使用 HTTP 客户端默认行为
    pub timeout_ms: Option<u64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOLOCATION_BASE_URL.to_string(),
            timeout_ms: None,
        }
    }
}

/// 投诉服务配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ComplaintServiceSettings {
    /// 元数据存储（PostgreSQL 配置名称），未配置时使用内存存储
    #[serde(default)]
    pub metadata_store: Option<String>,
    /// 投诉内容最大字符数
    #[serde(default)]
    pub max_content_length: Option<usize>,
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    /// 投诉服务配置
    #[serde(default)]
    pub complaint: Option<ComplaintServiceSettings>,
}

/// 应用配置主结构体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ComplaintAppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// PostgreSQL 配置映射
    #[serde(default)]
    pub postgres: HashMap<String, PostgresInstanceConfig>,
    /// 地理定位配置
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    /// 服务配置
    #[serde(default)]
    pub services: ServicesConfig,
}

impl ComplaintAppConfig {
    /// 获取 PostgreSQL 配置
    pub fn postgres_profile(&self, name: &str) -> Option<&PostgresInstanceConfig> {
        self.postgres.get(name)
    }

    /// 获取投诉服务配置
    pub fn complaint_service(&self) -> ComplaintServiceSettings {
        self.services.complaint.clone().unwrap_or_default()
    }

    /// 确保配置有默认值
    fn ensure_defaults(&mut self) {
        if self.server.address.is_empty() {
            self.server.address = "0.0.0.0".to_string();
        }
        if self.server.port == 0 {
            self.server.port = 8080;
        }
        if self.geolocation.base_url.trim().is_empty() {
            self.geolocation.base_url = DEFAULT_GEOLOCATION_BASE_URL.to_string();
        }
    }
}

/// 加载配置
pub fn load_config(path: Option<&str>) -> &'static ComplaintAppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| load_with_fallback(&candidates))
}

/// 获取应用配置
pub fn app_config() -> Option<&'static ComplaintAppConfig> {
    APP_CONFIG.get()
}

/// 从指定路径（文件或目录）加载配置，不写入全局实例
pub fn load_config_from_path(path: &Path) -> Result<ComplaintAppConfig> {
    let mut merged = load_config_value(path)?;

    let environment = ConfigManager::get_environment();
    ConfigManager::merge_environment_config(&mut merged, &config_root(path), &environment)?;

    let mut cfg: ComplaintAppConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    cfg.ensure_defaults();
    ConfigManager::apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> ComplaintAppConfig {
    for path in candidates {
        match load_config_from_path(path) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err:#}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    let mut cfg = ComplaintAppConfig::default();
    ConfigManager::apply_env_overrides(&mut cfg);
    cfg
}

/// 配置根目录：目录本身，或配置文件所在目录
fn config_root(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// 从源加载原始 TOML 值
fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    if metadata.is_dir() {
        load_config_from_directory(path)
    } else {
        load_toml_value(path)
    }
}

/// 从目录加载配置
fn load_config_from_directory(path: &Path) -> Result<Value> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    Ok(merged)
}

/// 合并目录中的配置，按文件名排序
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 深度合并值，overlay 覆盖 base
fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}
