//! 存储命令统一错误定义
//!
//! 三类错误互不包含：
//! - `Cancelled`：入口处取消信号已触发，不做包装；
//! - `Configuration`：缺少必需的委托或委托返回空值，直接抛出以便调用方区分"配置遗漏"；
//! - `CommandFailure`：存储调用或结果回调中的任何异常，恰好包装一个内部原因。
//!
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{command}: operation cancelled")]
    Cancelled { command: &'static str },

    #[error("{command}: {requirement}")]
    Configuration {
        command: &'static str,
        requirement: String,
    },

    #[error("{command} failed: {source}")]
    CommandFailure {
        command: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl StorageError {
    pub fn cancelled(command: &'static str) -> Self {
        Self::Cancelled { command }
    }

    pub fn configuration(command: &'static str, requirement: impl Into<String>) -> Self {
        Self::Configuration {
            command,
            requirement: requirement.into(),
        }
    }

    pub fn command_failure(command: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::CommandFailure {
            command,
            source: source.into(),
        }
    }

    /// 产生该错误的命令名称
    pub fn command(&self) -> &'static str {
        match self {
            Self::Cancelled { command }
            | Self::Configuration { command, .. }
            | Self::CommandFailure { command, .. } => command,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::CommandFailure { .. })
    }

    /// `CommandFailure` 的内部原因
    pub fn inner(&self) -> Option<&anyhow::Error> {
        match self {
            Self::CommandFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 统一 Result 类型别名
pub type StorageResult<T> = Result<T, StorageError>;
