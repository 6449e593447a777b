//! 请求管道（Pipeline）
//!
//! 组合一个请求类型的完整处理链：
//! 行为（按注册顺序由外到内）→ 前置处理器 → 处理器 → 后置处理器。
//!
use crate::behavior::{Next, PipelineBehavior, PipelineFuture};
use crate::error::PipelineError;
use crate::processor::{RequestPostProcessor, RequestPreProcessor};
use crate::request::Request;
use crate::request_handler::RequestHandler;
use pipestore_command::PipelineContext;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Pipeline<R>
where
    R: Request,
{
    handler: Arc<dyn RequestHandler<R>>,
    behaviors: Vec<Arc<dyn PipelineBehavior<R>>>,
    pre_processors: Vec<Arc<dyn RequestPreProcessor<R>>>,
    post_processors: Vec<Arc<dyn RequestPostProcessor<R>>>,
}

impl<R> Pipeline<R>
where
    R: Request,
{
    pub fn new<H>(handler: H) -> Self
    where
        H: RequestHandler<R> + 'static,
    {
        Self {
            handler: Arc::new(handler),
            behaviors: Vec::new(),
            pre_processors: Vec::new(),
            post_processors: Vec::new(),
        }
    }

    /// 追加行为；先注册者位于外层
    pub fn with_behavior<B>(mut self, behavior: B) -> Self
    where
        B: PipelineBehavior<R> + 'static,
    {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    pub fn with_pre_processor<P>(mut self, processor: P) -> Self
    where
        P: RequestPreProcessor<R> + 'static,
    {
        self.pre_processors.push(Arc::new(processor));
        self
    }

    pub fn with_post_processor<P>(mut self, processor: P) -> Self
    where
        P: RequestPostProcessor<R> + 'static,
    {
        self.post_processors.push(Arc::new(processor));
        self
    }

    /// 在给定上下文中执行整条管道
    pub async fn dispatch(
        &self,
        ctx: &PipelineContext,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled { stage: R::NAME });
        }
        tracing::debug!(request = R::NAME, "dispatching request");
        self.invoke(0, ctx, cancel, request).await
    }

    fn invoke<'a>(
        &'a self,
        index: usize,
        ctx: &'a PipelineContext,
        cancel: &'a CancellationToken,
        request: R,
    ) -> PipelineFuture<'a, R::Response> {
        match self.behaviors.get(index) {
            Some(behavior) => {
                let next = Next::new(move |request| self.invoke(index + 1, ctx, cancel, request));
                behavior.handle(ctx, request, cancel, next)
            }
            None => Box::pin(self.run_handler(ctx, request, cancel)),
        }
    }

    async fn run_handler(
        &self,
        ctx: &PipelineContext,
        mut request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, PipelineError> {
        for processor in &self.pre_processors {
            processor.process(ctx, &mut request, cancel).await?;
        }

        let mut response = self.handler.handle(ctx, &request, cancel).await?;

        for processor in &self.post_processors {
            processor
                .process(ctx, &request, &mut response, cancel)
                .await?;
        }

        Ok(response)
    }
}
