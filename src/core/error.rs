//! 统一错误处理模块
//!
//! 提供桥接层范围内的统一错误类型定义
//!
//! ## 错误分类
//!
//! - **Unsupported**: 在序列桥上按名称访问，或在映射桥上按索引访问
//! - **HelperExecution**: 外部脚本运行时抛出的异常，在调用适配器边界被捕获
//! - **Initialization**: 共享前置脚本加载或执行失败，属于致命错误
//!
//! "未找到" 不是错误：读取缺失的成员返回 [`Lookup::NotFound`](crate::bridge::Lookup)。

use crate::bridge::ObjectKind;
use crate::config::ConfigError;
use thiserror::Error;

/// 桥接层核心错误类型
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{operation} not supported on a {kind} object")]
    Unsupported {
        kind: ObjectKind,
        operation: &'static str,
    },

    #[error("index {index} out of bounds for sequence of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("helper `{helper}` failed{}: {message}", .location.as_deref().map(|l| format!(" at {l}")).unwrap_or_default())]
    HelperExecution {
        helper: String,
        message: String,
        location: Option<String>,
    },

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Script error: {0}")]
    Script(#[from] rquickjs::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub(crate) fn unsupported(kind: ObjectKind, operation: &'static str) -> Self {
        Self::Unsupported { kind, operation }
    }

    /// 是否为形状不匹配（按名称访问序列 / 按索引访问映射）
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// 桥接结果类型别名
pub type BridgeResult<T> = Result<T, BridgeError>;
