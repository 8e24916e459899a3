//! 配置管理器 - 负责处理不同环境下的配置选择和覆盖
//!
//! 该模块提供了配置管理功能，包括：
//! - 获取当前运行环境
//! - 合并环境特定配置
//! - 应用环境变量覆盖

use std::env;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use super::{ComplaintAppConfig, DEFAULT_POSTGRES_PROFILE, load_toml_value, merge_value};
use toml::Value;

/// 地理定位基础 URL 覆盖变量
pub const ENV_GEOLOCATION_URL: &str = "COMPLAINT_GEOLOCATION_URL";
/// 数据库 URL 覆盖变量
pub const ENV_DATABASE_URL: &str = "COMPLAINT_DATABASE_URL";
/// 运行环境变量
pub const ENV_ENVIRONMENT: &str = "COMPLAINT_ENV";

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取当前环境名称
    ///
    /// 从环境变量 COMPLAINT_ENV 获取当前环境名称，
    /// 如果未设置则默认为 "development"
    pub fn get_environment() -> String {
        env::var(ENV_ENVIRONMENT).unwrap_or_else(|_| "development".to_string())
    }

    /// 合并环境特定配置
    ///
    /// 加载 `<root>/environments/{environment}.toml`（如果存在），
    /// 并深度合并到已加载的配置中
    pub fn merge_environment_config(
        merged: &mut Value,
        root: &Path,
        environment: &str,
    ) -> Result<()> {
        let env_config_path = root
            .join("environments")
            .join(format!("{environment}.toml"));

        if env_config_path.exists() {
            let env_config = load_toml_value(&env_config_path)?;
            merge_value(merged, env_config);
            debug!(path = %env_config_path.display(), "environment config merged");
        }

        Ok(())
    }

    /// 应用进程环境变量覆盖
    pub fn apply_env_overrides(config: &mut ComplaintAppConfig) {
        Self::apply_overrides_from(config, |key| env::var(key).ok());
    }

    /// 使用给定的查找函数应用覆盖
    ///
    /// 优先级最高：
    /// 1. COMPLAINT_GEOLOCATION_URL 覆盖地理定位基础 URL
    /// 2. COMPLAINT_DATABASE_URL 覆盖投诉服务使用的 PostgreSQL 配置
    ///    （未指定配置名称时写入 "default" 配置并启用）
    pub fn apply_overrides_from<F>(config: &mut ComplaintAppConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_GEOLOCATION_URL).filter(|v| !v.trim().is_empty()) {
            config.geolocation.base_url = url;
        }

        if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.trim().is_empty()) {
            let profile = config
                .complaint_service()
                .metadata_store
                .unwrap_or_else(|| DEFAULT_POSTGRES_PROFILE.to_string());
            config.postgres.entry(profile.clone()).or_default().url = url;
            config
                .services
                .complaint
                .get_or_insert_with(Default::default)
                .metadata_store = Some(profile);
        }
    }
}
