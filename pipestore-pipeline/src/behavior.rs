//! 管道行为（PipelineBehavior）
//!
//! 行为包裹在处理器外层，可在调用 `next` 之前或之后执行逻辑；按注册顺序由外到内嵌套。
//!
use crate::{error::PipelineError, request::Request};
use async_trait::async_trait;
use futures_core::future::BoxFuture;
use pipestore_command::PipelineContext;
use tokio_util::sync::CancellationToken;

pub type PipelineFuture<'a, T> = BoxFuture<'a, Result<T, PipelineError>>;

/// 管道中的下一步（一次性续延）
pub struct Next<'a, R>
where
    R: Request,
{
    inner: Box<dyn FnOnce(R) -> PipelineFuture<'a, R::Response> + Send + 'a>,
}

impl<'a, R> Next<'a, R>
where
    R: Request,
{
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(R) -> PipelineFuture<'a, R::Response> + Send + 'a,
    {
        Self { inner: Box::new(f) }
    }

    /// 继续执行管道的剩余部分
    pub async fn run(self, request: R) -> Result<R::Response, PipelineError> {
        (self.inner)(request).await
    }
}

#[async_trait]
pub trait PipelineBehavior<R>: Send + Sync
where
    R: Request,
{
    async fn handle(
        &self,
        ctx: &PipelineContext,
        request: R,
        cancel: &CancellationToken,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError>;
}
