use crate::{
    error::PipelineError, mediator::Mediator, pipeline::Pipeline, request::Request,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use pipestore_command::PipelineContext;
use std::any::{Any, TypeId, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type BoxAnySend = Box<dyn Any + Send>;

type DispatchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BoxAnySend, PipelineError>> + Send + 'a>>;

type DispatchFn = Arc<
    dyn for<'a> Fn(BoxAnySend, &'a PipelineContext, &'a CancellationToken) -> DispatchFuture<'a>
        + Send
        + Sync,
>;

fn erase<F>(f: F) -> DispatchFn
where
    F: for<'a> Fn(BoxAnySend, &'a PipelineContext, &'a CancellationToken) -> DispatchFuture<'a>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// 基于内存的 Mediator 实现
/// - 通过 TypeId 注册不同 Request 对应的 Pipeline
/// - 运行时以类型擦除（Any）方式进行调度，并在调用端还原响应类型
pub struct InMemoryMediator {
    pipelines: DashMap<TypeId, (&'static str, DispatchFn)>,
}

impl Default for InMemoryMediator {
    fn default() -> Self {
        Self {
            pipelines: DashMap::new(),
        }
    }
}

impl InMemoryMediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册请求管道；同一请求类型只能注册一次
    pub fn register<R>(&self, pipeline: Pipeline<R>) -> Result<(), PipelineError>
    where
        R: Request,
    {
        let pipeline = Arc::new(pipeline);

        let f = erase(move |boxed, ctx, cancel| {
            let pipeline = pipeline.clone();

            Box::pin(async move {
                // 正常情况下这里的 downcast 永远不会失败（键与闭包同一泛型 R）
                let request = boxed
                    .downcast::<R>()
                    .map_err(|_| PipelineError::TypeMismatch {
                        expected: type_name::<R>(),
                        found: "unknown",
                    })?;
                let response = pipeline.dispatch(ctx, *request, cancel).await?;
                Ok::<BoxAnySend, PipelineError>(Box::new(response))
            })
        });

        match self.pipelines.entry(TypeId::of::<R>()) {
            Entry::Occupied(_) => Err(PipelineError::AlreadyRegistered { request: R::NAME }),
            Entry::Vacant(slot) => {
                slot.insert((R::NAME, f));
                Ok(())
            }
        }
    }

    /// 获取已注册的请求名列表（只读视图）
    pub fn registered_requests(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.pipelines.iter().map(|e| e.value().0).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl Mediator for InMemoryMediator {
    async fn send_with_context<R>(
        &self,
        ctx: &PipelineContext,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, PipelineError>
    where
        R: Request,
    {
        let Some(f) = self
            .pipelines
            .get(&TypeId::of::<R>())
            .map(|e| e.value().1.clone())
        else {
            return Err(PipelineError::HandlerNotFound(R::NAME));
        };

        let out = (f)(Box::new(request), ctx, cancel).await?;

        match out.downcast::<R::Response>() {
            Ok(response) => Ok(*response),
            Err(_) => Err(PipelineError::TypeMismatch {
                expected: type_name::<R::Response>(),
                found: "unknown",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Next, PipelineBehavior};
    use crate::processor::{RequestPostProcessor, RequestPreProcessor};
    use crate::request_handler::RequestHandler;
    use std::sync::Mutex;

    type Trail = Arc<Mutex<Vec<String>>>;

    #[derive(Debug)]
    struct Greet {
        name: String,
    }

    impl Request for Greet {
        const NAME: &'static str = "Greet";
        type Response = String;
    }

    struct GreetHandler {
        trail: Trail,
    }

    #[async_trait]
    impl RequestHandler<Greet> for GreetHandler {
        async fn handle(
            &self,
            _ctx: &PipelineContext,
            request: &Greet,
            _cancel: &CancellationToken,
        ) -> Result<String, PipelineError> {
            self.trail.lock().unwrap().push("handler".into());
            Ok(format!("hello {}", request.name))
        }
    }

    struct Around {
        label: &'static str,
        trail: Trail,
    }

    #[async_trait]
    impl PipelineBehavior<Greet> for Around {
        async fn handle(
            &self,
            _ctx: &PipelineContext,
            request: Greet,
            _cancel: &CancellationToken,
            next: Next<'_, Greet>,
        ) -> Result<String, PipelineError> {
            self.trail
                .lock()
                .unwrap()
                .push(format!("{}:before", self.label));
            let response = next.run(request).await?;
            self.trail
                .lock()
                .unwrap()
                .push(format!("{}:after", self.label));
            Ok(response)
        }
    }

    struct Shout {
        trail: Trail,
    }

    #[async_trait]
    impl RequestPreProcessor<Greet> for Shout {
        async fn process(
            &self,
            _ctx: &PipelineContext,
            request: &mut Greet,
            _cancel: &CancellationToken,
        ) -> Result<(), PipelineError> {
            self.trail.lock().unwrap().push("pre".into());
            request.name = request.name.to_uppercase();
            Ok(())
        }
    }

    struct Exclaim {
        trail: Trail,
    }

    #[async_trait]
    impl RequestPostProcessor<Greet> for Exclaim {
        async fn process(
            &self,
            _ctx: &PipelineContext,
            _request: &Greet,
            response: &mut String,
            _cancel: &CancellationToken,
        ) -> Result<(), PipelineError> {
            self.trail.lock().unwrap().push("post".into());
            response.push('!');
            Ok(())
        }
    }

    fn pipeline(trail: &Trail) -> Pipeline<Greet> {
        Pipeline::new(GreetHandler {
            trail: trail.clone(),
        })
        .with_behavior(Around {
            label: "outer",
            trail: trail.clone(),
        })
        .with_behavior(Around {
            label: "inner",
            trail: trail.clone(),
        })
        .with_pre_processor(Shout {
            trail: trail.clone(),
        })
        .with_post_processor(Exclaim {
            trail: trail.clone(),
        })
    }

    #[tokio::test]
    async fn runs_behaviors_processors_and_handler_in_order() {
        let trail = Trail::default();
        let mediator = InMemoryMediator::new();
        mediator.register(pipeline(&trail)).unwrap();

        let response = mediator
            .send(
                Greet {
                    name: "bob".into(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response, "hello BOB!");
        assert_eq!(
            *trail.lock().unwrap(),
            vec![
                "outer:before",
                "inner:before",
                "pre",
                "handler",
                "post",
                "inner:after",
                "outer:after"
            ]
        );
    }

    #[tokio::test]
    async fn rejects_duplicate_registration() {
        let trail = Trail::default();
        let mediator = InMemoryMediator::new();
        mediator.register(pipeline(&trail)).unwrap();

        let err = mediator.register(pipeline(&trail)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AlreadyRegistered { request: "Greet" }
        ));
        assert_eq!(mediator.registered_requests(), vec!["Greet"]);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let mediator = InMemoryMediator::new();
        let err = mediator
            .send(
                Greet {
                    name: "bob".into(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::HandlerNotFound("Greet")));
    }

    #[tokio::test]
    async fn cancelled_dispatch_never_reaches_handler() {
        let trail = Trail::default();
        let mediator = InMemoryMediator::new();
        mediator.register(pipeline(&trail)).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = mediator
            .send(
                Greet {
                    name: "bob".into(),
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(trail.lock().unwrap().is_empty());
    }
}
