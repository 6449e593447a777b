//! 存储行为（Storage Behavior）
//!
//! 将一个存储命令包裹在 `next` 调用周围：
//! - `StorageRequestBehavior`：先对请求执行命令，再调用 `next`；
//! - `StorageResponseBehavior`：先调用 `next`，再对产生的响应执行命令。
//!
//! 命令失败永不中止主业务流程，`next` 总是恰好调用一次。
//!
use crate::behavior::{Next, PipelineBehavior};
use crate::error::PipelineError;
use crate::request::Request;
use crate::side_effect::{ensure_active, run_side_effect};
use async_trait::async_trait;
use pipestore_command::{PipelineContext, StorageCommand, StorageOperation};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct StorageRequestBehavior<R, Op>
where
    R: Request,
    Op: StorageOperation<R>,
{
    command: Arc<StorageCommand<R, Op>>,
}

impl<R, Op> StorageRequestBehavior<R, Op>
where
    R: Request,
    Op: StorageOperation<R>,
{
    const ADAPTER: &'static str = "StorageRequestBehavior";

    pub fn new(command: StorageCommand<R, Op>) -> Self {
        Self::shared(Arc::new(command))
    }

    pub fn shared(command: Arc<StorageCommand<R, Op>>) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &Arc<StorageCommand<R, Op>> {
        &self.command
    }
}

#[async_trait]
impl<R, Op> PipelineBehavior<R> for StorageRequestBehavior<R, Op>
where
    R: Request,
    Op: StorageOperation<R>,
{
    async fn handle(
        &self,
        ctx: &PipelineContext,
        mut request: R,
        cancel: &CancellationToken,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        ensure_active(cancel, Self::ADAPTER)?;
        run_side_effect(Self::ADAPTER, &*self.command, &mut request, ctx, cancel)
            .await;
        next.run(request).await
    }
}

pub struct StorageResponseBehavior<R, Op>
where
    R: Request,
    Op: StorageOperation<R::Response>,
{
    command: Arc<StorageCommand<R::Response, Op>>,
}

impl<R, Op> StorageResponseBehavior<R, Op>
where
    R: Request,
    Op: StorageOperation<R::Response>,
{
    const ADAPTER: &'static str = "StorageResponseBehavior";

    pub fn new(command: StorageCommand<R::Response, Op>) -> Self {
        Self::shared(Arc::new(command))
    }

    pub fn shared(command: Arc<StorageCommand<R::Response, Op>>) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &Arc<StorageCommand<R::Response, Op>> {
        &self.command
    }
}

#[async_trait]
impl<R, Op> PipelineBehavior<R> for StorageResponseBehavior<R, Op>
where
    R: Request,
    Op: StorageOperation<R::Response>,
{
    async fn handle(
        &self,
        ctx: &PipelineContext,
        request: R,
        cancel: &CancellationToken,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        ensure_active(cancel, Self::ADAPTER)?;
        let mut response = next.run(request).await?;
        run_side_effect(Self::ADAPTER, &*self.command, &mut response, ctx, cancel)
            .await;
        Ok(response)
    }
}
