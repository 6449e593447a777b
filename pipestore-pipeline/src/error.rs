use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("handler already registered: request={request}")]
    AlreadyRegistered { request: &'static str },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// 管道整体被取消（在适配器或调度入口处检测到）
    #[error("pipeline cancelled: stage={stage}")]
    Cancelled { stage: &'static str },

    #[error("handler: {0}")]
    Handler(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
