use async_trait::async_trait;
use pipestore_command::blob::{BlobClient, InMemoryBlobContainer, UploadBlob, UploadBlobOptions};
use pipestore_command::queue::{
    DeleteMessage, DeleteMessageOptions, InMemoryQueue, OutboundMessage, QueueClient,
    ReceiveMessage, ReceiveMessageOptions, ReceiveRequest, ReceivedMessage, SendMessage,
    SendMessageOptions, receipt_from_context,
};
use pipestore_command::table::{InMemoryTable, InsertEntity, InsertEntityOptions, TableClient};
use pipestore_command::{PipelineContext, StorageCommand, StorageError};
use pipestore_pipeline::error::PipelineError;
use pipestore_pipeline::mediator::Mediator;
use pipestore_pipeline::request::Request;
use pipestore_pipeline::request_handler::RequestHandler;
use pipestore_pipeline::{
    InMemoryMediator, Pipeline, StoragePostProcessor, StoragePreProcessor, StorageRequestBehavior,
    StorageResponseBehavior,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlaceOrder {
    id: u32,
    customer: String,
}

impl Request for PlaceOrder {
    const NAME: &'static str = "PlaceOrder";
    type Response = OrderPlaced;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OrderPlaced {
    id: u32,
    total_cents: u64,
}

struct PlaceOrderHandler;

#[async_trait]
impl RequestHandler<PlaceOrder> for PlaceOrderHandler {
    async fn handle(
        &self,
        _ctx: &PipelineContext,
        request: &PlaceOrder,
        _cancel: &CancellationToken,
    ) -> Result<OrderPlaced, PipelineError> {
        Ok(OrderPlaced {
            id: request.id,
            total_cents: 4_200,
        })
    }
}

struct Backends {
    table: Arc<InMemoryTable>,
    queue: Arc<InMemoryQueue>,
    blobs: Arc<InMemoryBlobContainer>,
}

impl Backends {
    fn new() -> Self {
        Self {
            table: Arc::new(InMemoryTable::new("orders")),
            queue: Arc::new(InMemoryQueue::new("order-events")),
            blobs: Arc::new(InMemoryBlobContainer::new("receipts")),
        }
    }

    fn table_client(&self) -> Arc<dyn TableClient> {
        self.table.clone()
    }

    fn queue_client(&self) -> Arc<dyn QueueClient> {
        self.queue.clone()
    }

    fn blob_client(&self) -> Arc<dyn BlobClient> {
        self.blobs.clone()
    }
}

fn place_order_pipeline(backends: &Backends, upload_client: bool) -> Pipeline<PlaceOrder> {
    let table = backends.table_client();
    let queue = backends.queue_client();
    let blobs = backends.blob_client();

    let upload = UploadBlobOptions::enabled();
    let upload = if upload_client {
        upload.with_client(move |_: &OrderPlaced, _: &PipelineContext| Some(blobs.clone()))
    } else {
        upload
    };

    Pipeline::new(PlaceOrderHandler)
        .with_behavior(StorageRequestBehavior::new(StorageCommand::new(
            InsertEntity,
            InsertEntityOptions::enabled()
                .with_client(move |_: &PlaceOrder, _: &PipelineContext| Some(table.clone())),
        )))
        .with_behavior(StorageResponseBehavior::<PlaceOrder, UploadBlob>::new(
            StorageCommand::new(UploadBlob, upload),
        ))
        .with_post_processor(StoragePostProcessor::<PlaceOrder, SendMessage>::new(
            StorageCommand::new(
                SendMessage,
                SendMessageOptions::enabled()
                    .with_client(move |_: &OrderPlaced, _: &PipelineContext| Some(queue.clone())),
            ),
        ))
}

#[tokio::test]
async fn request_flows_through_every_storage_side_effect() {
    let backends = Backends::new();
    let mediator = InMemoryMediator::new();
    mediator
        .register(place_order_pipeline(&backends, true))
        .unwrap();

    let placed = mediator
        .send(
            PlaceOrder {
                id: 11,
                customer: "alice".into(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        placed,
        OrderPlaced {
            id: 11,
            total_cents: 4_200
        }
    );
    assert_eq!(backends.table.len(), 1);
    assert_eq!(backends.blobs.len(), 1);
    assert_eq!(backends.queue.bodies(), vec![r#"{"id":11,"total_cents":4200}"#.to_string()]);

    let stored: PlaceOrder = backends.table.entities()[0].data().unwrap().unwrap();
    assert_eq!(stored.customer, "alice");
}

#[tokio::test]
async fn misconfigured_side_effect_is_recorded_and_response_still_returned() {
    let backends = Backends::new();
    let mediator = InMemoryMediator::new();
    mediator
        .register(place_order_pipeline(&backends, false))
        .unwrap();

    let ctx = PipelineContext::new();
    let placed = mediator
        .send_with_context(
            &ctx,
            PlaceOrder {
                id: 12,
                customer: "bob".into(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(placed.id, 12);
    assert_eq!(backends.table.len(), 1);
    assert_eq!(backends.queue.len(), 1);
    assert!(backends.blobs.is_empty());

    let errors = ctx.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].as_ref(),
        StorageError::Configuration {
            command: "UploadBlobCommand",
            ..
        }
    ));
}

#[tokio::test]
async fn cancelled_dispatch_runs_no_side_effects() {
    let backends = Backends::new();
    let mediator = InMemoryMediator::new();
    mediator
        .register(place_order_pipeline(&backends, true))
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = mediator
        .send(
            PlaceOrder {
                id: 13,
                customer: "carol".into(),
            },
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(backends.table.is_empty());
    assert!(backends.queue.is_empty());
}

#[tokio::test]
async fn out_of_range_time_to_live_is_recorded_not_raised() {
    let queue = Arc::new(InMemoryQueue::new("order-events"));
    let client: Arc<dyn QueueClient> = queue.clone();
    let pipeline = Pipeline::new(PlaceOrderHandler).with_pre_processor(StoragePreProcessor::new(
        StorageCommand::new(
            SendMessage,
            SendMessageOptions::enabled()
                .with_client(move |_: &PlaceOrder, _: &PipelineContext| Some(client.clone()))
                .with_payload(|order: &PlaceOrder, _: &PipelineContext| {
                    Ok(Some(
                        OutboundMessage::builder()
                            .body(order.id.to_string())
                            .time_to_live(Duration::from_secs(9_000_000_000_000))
                            .build(),
                    ))
                }),
        ),
    ));
    let mediator = InMemoryMediator::new();
    mediator.register(pipeline).unwrap();

    let ctx = PipelineContext::new();
    let placed = mediator
        .send_with_context(
            &ctx,
            PlaceOrder {
                id: 14,
                customer: "dave".into(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(placed.id, 14);
    assert!(queue.is_empty());
    let errors = ctx.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_command_failure());
    assert_eq!(errors[0].command(), "SendMessageCommand");
}

#[derive(Debug, Clone, Default)]
struct DrainOne {
    body: Option<String>,
}

impl Request for DrainOne {
    const NAME: &'static str = "DrainOne";
    type Response = Drained;
}

#[derive(Debug, Clone, PartialEq)]
struct Drained {
    body: Option<String>,
}

struct DrainHandler;

#[async_trait]
impl RequestHandler<DrainOne> for DrainHandler {
    async fn handle(
        &self,
        _ctx: &PipelineContext,
        request: &DrainOne,
        _cancel: &CancellationToken,
    ) -> Result<Drained, PipelineError> {
        Ok(Drained {
            body: request.body.clone(),
        })
    }
}

#[tokio::test]
async fn received_message_is_deleted_through_context_receipt() {
    let queue = Arc::new(InMemoryQueue::new("work"));
    let cancel = CancellationToken::new();
    queue
        .send(
            OutboundMessage::builder()
                .body("job-1".to_string())
                .build(),
            &cancel,
        )
        .await
        .unwrap();

    let receive_client: Arc<dyn QueueClient> = queue.clone();
    let delete_client: Arc<dyn QueueClient> = queue.clone();
    let pipeline = Pipeline::new(DrainHandler)
        .with_pre_processor(StoragePreProcessor::new(StorageCommand::new(
            ReceiveMessage,
            ReceiveMessageOptions::enabled()
                .with_client(move |_: &DrainOne, _: &PipelineContext| {
                    Some(receive_client.clone())
                })
                .with_payload(|_: &DrainOne, _: &PipelineContext| {
                    Ok(Some(ReceiveRequest::default()))
                })
                .on_result(
                    |received: Option<ReceivedMessage>,
                     ctx: &PipelineContext,
                     request: &mut DrainOne| {
                        if let Some(message) = received {
                            message.stash_receipt(ctx);
                            request.body = Some(message.body);
                        }
                        Ok(())
                    },
                ),
        )))
        .with_post_processor(StoragePostProcessor::<DrainOne, DeleteMessage>::new(
            StorageCommand::new(
                DeleteMessage,
                DeleteMessageOptions::enabled()
                    .with_client(move |_: &Drained, _: &PipelineContext| {
                        Some(delete_client.clone())
                    })
                    .with_payload(receipt_from_context::<Drained>),
            ),
        ));

    let mediator = InMemoryMediator::new();
    mediator.register(pipeline).unwrap();

    let ctx = PipelineContext::new();
    let drained = mediator
        .send_with_context(&ctx, DrainOne::default(), &cancel)
        .await
        .unwrap();

    assert_eq!(drained.body.as_deref(), Some("job-1"));
    assert!(!ctx.has_errors());
    assert!(queue.is_empty());

    // 队列已空：接收无结果，删除缺少令牌被记录为配置错误
    let ctx = PipelineContext::new();
    let drained = mediator
        .send_with_context(&ctx, DrainOne::default(), &cancel)
        .await
        .unwrap();
    assert_eq!(drained.body, None);
    let errors = ctx.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_configuration());
    assert_eq!(errors[0].command(), "DeleteMessageCommand");
}
