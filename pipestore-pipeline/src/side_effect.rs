//! 存储副作用的执行与吞错
//!
//! 行为与处理器共用同一失败策略：
//! - 入口处检测到取消：视为整条管道被拆除，以 `PipelineError::Cancelled` 向外传播；
//! - 命令返回的任何错误（含命令内部检测到的取消）：以 error 级别记录日志、追加到上下文的
//!   错误列表，且不向外抛出。
//!
use crate::error::PipelineError;
use pipestore_command::{CommandOutcome, PipelineContext, StorageCommand, StorageOperation};
use tokio_util::sync::CancellationToken;

pub(crate) fn ensure_active(
    cancel: &CancellationToken,
    adapter: &'static str,
) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        tracing::warn!(adapter, "pipeline cancelled before storage side-effect");
        return Err(PipelineError::Cancelled { stage: adapter });
    }
    Ok(())
}

/// 执行命令并吞掉其错误；返回命令的结果（失败时为 `None`）
pub(crate) async fn run_side_effect<M, Op>(
    adapter: &'static str,
    command: &StorageCommand<M, Op>,
    message: &mut M,
    ctx: &PipelineContext,
    cancel: &CancellationToken,
) -> Option<CommandOutcome>
where
    M: Send + Sync,
    Op: StorageOperation<M>,
{
    match command.execute(message, Some(ctx), cancel).await {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            tracing::error!(
                adapter,
                command = command.name(),
                error = %err,
                "storage side-effect failed; continuing pipeline"
            );
            ctx.record_error(err);
            None
        }
    }
}
