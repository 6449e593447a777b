//! 存储处理器（Storage Processor）
//!
//! 与存储行为采用相同的吞错策略，区别仅在于没有续延：
//! - `StoragePreProcessor`：处理器执行前对请求执行命令；
//! - `StoragePostProcessor`：处理器执行后对响应执行命令。
//!
use crate::error::PipelineError;
use crate::processor::{RequestPostProcessor, RequestPreProcessor};
use crate::request::Request;
use crate::side_effect::{ensure_active, run_side_effect};
use async_trait::async_trait;
use pipestore_command::{PipelineContext, StorageCommand, StorageOperation};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct StoragePreProcessor<R, Op>
where
    R: Request,
    Op: StorageOperation<R>,
{
    command: Arc<StorageCommand<R, Op>>,
}

impl<R, Op> StoragePreProcessor<R, Op>
where
    R: Request,
    Op: StorageOperation<R>,
{
    const ADAPTER: &'static str = "StoragePreProcessor";

    pub fn new(command: StorageCommand<R, Op>) -> Self {
        Self::shared(Arc::new(command))
    }

    pub fn shared(command: Arc<StorageCommand<R, Op>>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl<R, Op> RequestPreProcessor<R> for StoragePreProcessor<R, Op>
where
    R: Request,
    Op: StorageOperation<R>,
{
    async fn process(
        &self,
        ctx: &PipelineContext,
        request: &mut R,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        ensure_active(cancel, Self::ADAPTER)?;
        run_side_effect(Self::ADAPTER, &*self.command, request, ctx, cancel)
            .await;
        Ok(())
    }
}

pub struct StoragePostProcessor<R, Op>
where
    R: Request,
    Op: StorageOperation<R::Response>,
{
    command: Arc<StorageCommand<R::Response, Op>>,
}

impl<R, Op> StoragePostProcessor<R, Op>
where
    R: Request,
    Op: StorageOperation<R::Response>,
{
    const ADAPTER: &'static str = "StoragePostProcessor";

    pub fn new(command: StorageCommand<R::Response, Op>) -> Self {
        Self::shared(Arc::new(command))
    }

    pub fn shared(command: Arc<StorageCommand<R::Response, Op>>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl<R, Op> RequestPostProcessor<R> for StoragePostProcessor<R, Op>
where
    R: Request,
    Op: StorageOperation<R::Response>,
{
    async fn process(
        &self,
        ctx: &PipelineContext,
        _request: &R,
        response: &mut R::Response,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        ensure_active(cancel, Self::ADAPTER)?;
        run_side_effect(Self::ADAPTER, &*self.command, response, ctx, cancel)
            .await;
        Ok(())
    }
}
