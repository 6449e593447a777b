//! 下单流程演示：请求经由中介者分发，实体写入、事件发送与回执归档均以存储副作用完成，
//! 处理器本身不包含任何存储逻辑。
//!
mod settings;

use async_trait::async_trait;
use pipestore_command::blob::{BlobClient, InMemoryBlobContainer, UploadBlob, UploadBlobOptions};
use pipestore_command::queue::{
    InMemoryQueue, MessageReceipt, QueueClient, SendMessage, SendMessageOptions,
};
use pipestore_command::table::{
    EntityKey, InMemoryTable, InsertEntity, InsertEntityOptions, TableClient, TableEntity,
};
use pipestore_command::{PipelineContext, StorageCommand};
use pipestore_pipeline::error::PipelineError;
use pipestore_pipeline::mediator::Mediator;
use pipestore_pipeline::request::Request;
use pipestore_pipeline::request_handler::RequestHandler;
use pipestore_pipeline::{
    InMemoryMediator, Pipeline, StoragePostProcessor, StorageRequestBehavior,
    StorageResponseBehavior,
};
use serde::Serialize;
use settings::DemoSettings;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize)]
struct PlaceOrder {
    order_id: String,
    customer: String,
    quantity: u32,
    unit_price_cents: u64,
}

impl Request for PlaceOrder {
    const NAME: &'static str = "PlaceOrder";
    type Response = OrderPlaced;
}

#[derive(Debug, Clone, Serialize)]
struct OrderPlaced {
    order_id: String,
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
        if request.quantity == 0 {
            return Err(anyhow::anyhow!("order {} has no items", request.order_id).into());
        }
        Ok(OrderPlaced {
            order_id: request.order_id.clone(),
            total_cents: u64::from(request.quantity) * request.unit_price_cents,
        })
    }
}

const SENT_RECEIPT: &str = "demo.sent_receipt";

fn order_pipeline(
    settings: &DemoSettings,
    table: Arc<dyn TableClient>,
    queue: Arc<dyn QueueClient>,
    blobs: Arc<dyn BlobClient>,
) -> Pipeline<PlaceOrder> {
    let insert = InsertEntityOptions::enabled()
        .with_client(move |_: &PlaceOrder, _: &PipelineContext| Some(table.clone()))
        .with_payload(|order: &PlaceOrder, ctx: &PipelineContext| {
            let mut entity = TableEntity::builder()
                .partition_key(order.customer.clone())
                .row_key(order.order_id.clone())
                .build();
            entity.set_property("Quantity", order.quantity);
            if let Some(correlation_id) = ctx.correlation_id() {
                entity.set_property("CorrelationId", correlation_id);
            }
            Ok(Some(entity))
        });

    let send = SendMessageOptions::enabled()
        .with_client(move |_: &OrderPlaced, _: &PipelineContext| Some(queue.clone()))
        .on_result(|receipt: MessageReceipt, ctx: &PipelineContext, _: &mut OrderPlaced| {
            ctx.insert(SENT_RECEIPT, receipt);
            Ok(())
        });

    let archive = UploadBlobOptions::enabled()
        .set_enabled(settings.archive_receipts)
        .with_client(move |_: &OrderPlaced, _: &PipelineContext| Some(blobs.clone()));

    Pipeline::new(PlaceOrderHandler)
        .with_behavior(StorageRequestBehavior::new(StorageCommand::new(
            InsertEntity,
            insert,
        )))
        .with_behavior(StorageResponseBehavior::<PlaceOrder, UploadBlob>::new(
            StorageCommand::new(UploadBlob, archive),
        ))
        .with_post_processor(StoragePostProcessor::<PlaceOrder, SendMessage>::new(
            StorageCommand::new(SendMessage, send),
        ))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = DemoSettings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_target(false)
        .init();
    tracing::info!(?settings, "demo settings loaded");

    let table = Arc::new(InMemoryTable::new(settings.table_name.clone()));
    let queue = Arc::new(InMemoryQueue::new(settings.queue_name.clone()));
    let blobs = Arc::new(InMemoryBlobContainer::new(settings.container_name.clone()));

    let mediator = InMemoryMediator::new();
    mediator.register(order_pipeline(
        &settings,
        table.clone(),
        queue.clone(),
        blobs.clone(),
    ))?;
    tracing::info!(requests = ?mediator.registered_requests(), "pipelines registered");

    let cancel = CancellationToken::new();
    let ctx = PipelineContext::builder()
        .maybe_correlation_id(Some("demo-1".into()))
        .build();
    let placed = mediator
        .send_with_context(
            &ctx,
            PlaceOrder {
                order_id: "ord-1001".into(),
                customer: "alice".into(),
                quantity: 3,
                unit_price_cents: 1_250,
            },
            &cancel,
        )
        .await?;
    tracing::info!(order_id = %placed.order_id, total_cents = placed.total_cents, "order placed");

    let stored = table
        .get_entity(&EntityKey::new("alice", "ord-1001"), &cancel)
        .await?;
    tracing::info!(found = stored.is_some(), "entity lookup");
    if let Some(receipt) = ctx.get::<MessageReceipt>(SENT_RECEIPT) {
        tracing::info!(message_id = %receipt.message_id, "order event queued");
    }
    tracing::info!(
        entities = table.len(),
        messages = queue.len(),
        blobs = ?blobs.names(),
        swallowed_errors = ctx.errors().len(),
        "storage state"
    );

    Ok(())
}
