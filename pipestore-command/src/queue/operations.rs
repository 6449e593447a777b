use super::{MessageReceipt, OutboundMessage, QueueClient, ReceiveRequest, ReceivedMessage};
use crate::command::{StorageCommand, StorageOperation};
use crate::context::PipelineContext;
use crate::options::{PayloadBuilder, StorageOptions};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 发送消息；缺省载荷为 JSON 序列化的消息
#[derive(Clone, Copy, Debug, Default)]
pub struct SendMessage;

#[async_trait]
impl<M> StorageOperation<M> for SendMessage
where
    M: Serialize + Send + Sync + 'static,
{
    const NAME: &'static str = "SendMessageCommand";
    type Client = Arc<dyn QueueClient>;
    type Payload = OutboundMessage;
    type Output = MessageReceipt;

    fn default_payload_builder(&self) -> Option<PayloadBuilder<M, OutboundMessage>> {
        Some(Arc::new(
            |message: &M, _ctx: &PipelineContext| -> anyhow::Result<Option<OutboundMessage>> {
                let body = serde_json::to_string(message)?;
                Ok(Some(OutboundMessage::builder().body(body).build()))
            },
        ))
    }

    async fn perform(
        &self,
        client: &Arc<dyn QueueClient>,
        payload: OutboundMessage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<MessageReceipt> {
        tracing::debug!(queue = client.queue_name(), "sending message");
        client.send(payload, cancel).await
    }
}

/// 接收一条消息；接收参数须由调用方提供
#[derive(Clone, Copy, Debug, Default)]
pub struct ReceiveMessage;

#[async_trait]
impl<M> StorageOperation<M> for ReceiveMessage
where
    M: Send + Sync + 'static,
{
    const NAME: &'static str = "ReceiveMessageCommand";
    type Client = Arc<dyn QueueClient>;
    type Payload = ReceiveRequest;
    type Output = Option<ReceivedMessage>;

    async fn perform(
        &self,
        client: &Arc<dyn QueueClient>,
        payload: ReceiveRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ReceivedMessage>> {
        client.receive(payload, cancel).await
    }
}

/// 删除一条已接收的消息；载荷为接收时得到的令牌
#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteMessage;

#[async_trait]
impl<M> StorageOperation<M> for DeleteMessage
where
    M: Send + Sync + 'static,
{
    const NAME: &'static str = "DeleteMessageCommand";
    type Client = Arc<dyn QueueClient>;
    type Payload = MessageReceipt;
    type Output = ();

    async fn perform(
        &self,
        client: &Arc<dyn QueueClient>,
        payload: MessageReceipt,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        client.delete(&payload, cancel).await
    }
}

/// `ReceiveMessage` 的结果回调：将接收令牌存入上下文，供同一请求中的删除命令取回。
///
/// 需要同时读取消息体时，在自定义回调中调用 `ReceivedMessage::stash_receipt`。
pub fn stash_receipt<M>(
    received: Option<ReceivedMessage>,
    context: &PipelineContext,
    _message: &mut M,
) -> anyhow::Result<()> {
    if let Some(received) = received {
        received.stash_receipt(context);
    }
    Ok(())
}

/// `DeleteMessage` 的载荷构造器：读取 `stash_receipt` 保存的令牌，缺失时不产出载荷
pub fn receipt_from_context<M>(
    _message: &M,
    context: &PipelineContext,
) -> anyhow::Result<Option<MessageReceipt>> {
    Ok(context.get::<MessageReceipt>(MessageReceipt::CONTEXT_KEY))
}

pub type SendMessageOptions<M> = StorageOptions<M, SendMessage>;
pub type ReceiveMessageOptions<M> = StorageOptions<M, ReceiveMessage>;
pub type DeleteMessageOptions<M> = StorageOptions<M, DeleteMessage>;

pub type SendMessageCommand<M> = StorageCommand<M, SendMessage>;
pub type ReceiveMessageCommand<M> = StorageCommand<M, ReceiveMessage>;
pub type DeleteMessageCommand<M> = StorageCommand<M, DeleteMessage>;
