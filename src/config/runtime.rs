use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// QuickJS 运行时资源限制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 堆内存上限（字节，0表示不限制）
    pub memory_limit: usize,

    /// 最大栈大小（字节）
    pub max_stack_size: usize,

    /// GC触发阈值（字节）
    pub gc_threshold: usize,
}

impl_default!(RuntimeConfig {
    memory_limit: 64 * 1024 * 1024,
    max_stack_size: 512 * 1024,
    gc_threshold: 256 * 1024,
});

impl RuntimeConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_stack_size < 64 * 1024 {
            return Err(ConfigError::ValidationError(format!(
                "max_stack_size too small: {} bytes",
                self.max_stack_size
            )));
        }
        if self.memory_limit != 0 && self.memory_limit < 1024 * 1024 {
            return Err(ConfigError::ValidationError(format!(
                "memory_limit too small: {} bytes",
                self.memory_limit
            )));
        }
        Ok(())
    }

    /// 将限制应用到运行时
    pub(crate) fn apply(&self, runtime: &rquickjs::Runtime) {
        if self.memory_limit != 0 {
            runtime.set_memory_limit(self.memory_limit);
        }
        runtime.set_max_stack_size(self.max_stack_size);
        runtime.set_gc_threshold(self.gc_threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runtime_config_is_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tiny_stack_rejected() {
        let config = RuntimeConfig {
            max_stack_size: 1024,
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unlimited_memory_allowed() {
        let config = RuntimeConfig {
            memory_limit: 0,
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
