//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// 初始化日志系统
///
/// `RUST_LOG` 存在时优先于配置的级别。重复调用是安全的：
/// 已安装全局订阅者时直接返回。
pub fn init(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "bridge", level = config.level.as_filter(), "Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            log_to_console: true,
        };
        init(&config);
        init(&config);
    }

    #[test]
    fn test_disabled_console_is_noop() {
        init(&LoggingConfig {
            level: LogLevel::Trace,
            log_to_console: false,
        });
    }
}
