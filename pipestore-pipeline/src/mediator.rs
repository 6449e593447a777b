use crate::{error::PipelineError, request::Request};
use async_trait::async_trait;
use pipestore_command::PipelineContext;
use tokio_util::sync::CancellationToken;

/// 中介者（Mediator）
///
/// - 负责根据请求的具体类型路由到对应的管道（行为、处理器与前后置处理器）；
/// - 每次分发对应一个独立的 `PipelineContext`，不在并发请求之间共享；
/// - 该 trait 带有泛型方法，通常以具体实现类型注入使用。
#[async_trait]
pub trait Mediator: Send + Sync {
    /// 以调用方提供的上下文分发请求，便于事后检查被吞掉的副作用错误
    async fn send_with_context<R>(
        &self,
        ctx: &PipelineContext,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, PipelineError>
    where
        R: Request;

    /// 分发请求，为本次请求创建新的上下文
    async fn send<R>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, PipelineError>
    where
        R: Request,
    {
        let ctx = PipelineContext::new();
        self.send_with_context(&ctx, request, cancel).await
    }
}
