//! 配置管理模块
//!
//! 支持配置文件分层加载与环境变量覆盖，提供默认比较选项和日志配置。

use crate::options::RuleOptions;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub environment: String,
    /// 规则的默认比较选项
    pub options: RuleOptions,
    pub observability: ObservabilityConfig,
}

impl EngineConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 命令行指定的配置文件（必须存在）
    /// 4. 环境变量（JSON_RULES_ 前缀，层级用双下划线分隔，
    ///    如 JSON_RULES_OPTIONS__COMPARE__IGNORE_CASE -> options.compare.ignore_case）
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env =
            std::env::var("JSON_RULES_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir =
            std::env::var("JSON_RULES_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let mut builder = Config::builder()
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            );

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let builder = builder.add_source(
            Environment::with_prefix("JSON_RULES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
