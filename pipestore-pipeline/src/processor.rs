//! 前置/后置处理器
//!
//! 处理器没有续延可调用：由调度方在处理器执行之前（前置）或之后（后置）各调用一次。
//!
use crate::{error::PipelineError, request::Request};
use async_trait::async_trait;
use pipestore_command::PipelineContext;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait RequestPreProcessor<R>: Send + Sync
where
    R: Request,
{
    async fn process(
        &self,
        ctx: &PipelineContext,
        request: &mut R,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait RequestPostProcessor<R>: Send + Sync
where
    R: Request,
{
    async fn process(
        &self,
        ctx: &PipelineContext,
        request: &R,
        response: &mut R::Response,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError>;
}
