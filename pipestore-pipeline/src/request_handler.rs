use crate::{error::PipelineError, request::Request};
use async_trait::async_trait;
use pipestore_command::PipelineContext;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait RequestHandler<R>: Send + Sync
where
    R: Request,
{
    async fn handle(
        &self,
        ctx: &PipelineContext,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, PipelineError>;
}
