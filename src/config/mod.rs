/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和配置验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::bridge::TranslationPolicy;

pub mod runtime;

pub use runtime::RuntimeConfig;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 前置脚本来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreludeSource {
    /// 随库嵌入的 helpers.prelude.js
    Embedded,
    /// 从文件系统加载
    Path(PathBuf),
}

/// 桥接层主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 翻译策略（eager / lazy）
    #[serde(default)]
    pub policy: TranslationPolicy,

    /// 共享前置脚本
    #[serde(default = "default_prelude")]
    pub prelude: PreludeSource,

    /// 运行时资源限制
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_prelude() -> PreludeSource {
    PreludeSource::Embedded
}

impl Default for PreludeSource {
    fn default() -> Self {
        default_prelude()
    }
}

impl BridgeConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定翻译策略
    pub fn with_policy(mut self, policy: TranslationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// 从任意键值来源覆盖配置
    ///
    /// 识别的键：`SCRIPT_BRIDGE_POLICY`、`SCRIPT_BRIDGE_PRELUDE`、
    /// `SCRIPT_BRIDGE_MEMORY_LIMIT`、`SCRIPT_BRIDGE_LOG_LEVEL`。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SCRIPT_BRIDGE_POLICY") {
            self.policy = val.parse().map_err(ConfigError::ParseError)?;
        }
        if let Some(val) = lookup("SCRIPT_BRIDGE_PRELUDE") {
            self.prelude = PreludeSource::Path(PathBuf::from(val));
        }
        if let Some(val) = lookup("SCRIPT_BRIDGE_MEMORY_LIMIT") {
            self.runtime.memory_limit = val.parse().map_err(|_| {
                ConfigError::ParseError(format!("invalid SCRIPT_BRIDGE_MEMORY_LIMIT: {val}"))
            })?;
        }
        if let Some(val) = lookup("SCRIPT_BRIDGE_LOG_LEVEL") {
            self.logging.level = val.parse().map_err(ConfigError::ParseError)?;
        }
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.runtime.validate()?;
        if let PreludeSource::Path(path) = &self.prelude {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "prelude path is empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./script_bridge.toml
    /// 2. ./script_bridge.json
    /// 3. 使用默认配置
    ///
    /// 之后总是应用环境变量覆盖。
    pub fn load_or_default() -> ConfigResult<Self> {
        let mut config = if let Ok(config) = Self::from_toml_file("script_bridge.toml") {
            tracing::info!(target: "config", "Loaded config from script_bridge.toml");
            config
        } else if let Ok(config) = Self::from_json_file("script_bridge.json") {
            tracing::info!(target: "config", "Loaded config from script_bridge.json");
            config
        } else {
            tracing::debug!(target: "config", "Using default configuration");
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

use crate::impl_default;

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 对应的 `EnvFilter` 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}
