use crate::context::PipelineContext;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 待发送的消息
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct OutboundMessage {
    #[builder(into)]
    body: String,
    /// 发送后的初始不可见时长
    visibility_delay: Option<Duration>,
    /// 消息存活时长，缺省由队列决定
    time_to_live: Option<Duration>,
}

impl OutboundMessage {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn visibility_delay(&self) -> Option<Duration> {
        self.visibility_delay
    }

    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live
    }
}

/// 删除消息所需的不透明令牌：消息 ID + pop receipt
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub message_id: String,
    pub pop_receipt: String,
}

impl MessageReceipt {
    /// 在管道上下文中保存最近一次接收令牌的键
    pub const CONTEXT_KEY: &'static str = "queue.message_receipt";
}

/// 接收参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// 接收后消息对其它消费者不可见的时长
    pub visibility_timeout: Duration,
}

impl Default for ReceiveRequest {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub pop_receipt: String,
    pub body: String,
    pub dequeue_count: u32,
    pub inserted_at: DateTime<Utc>,
    pub next_visible_at: DateTime<Utc>,
}

impl ReceivedMessage {
    /// 删除该消息所需的令牌
    pub fn receipt(&self) -> MessageReceipt {
        MessageReceipt {
            message_id: self.message_id.clone(),
            pop_receipt: self.pop_receipt.clone(),
        }
    }

    /// 将删除令牌写入上下文的 `MessageReceipt::CONTEXT_KEY`
    pub fn stash_receipt(&self, context: &PipelineContext) {
        context.insert(MessageReceipt::CONTEXT_KEY, self.receipt());
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// 队列客户端
#[async_trait]
pub trait QueueClient: Send + Sync {
    fn queue_name(&self) -> &str;

    /// 发送消息，返回可用于删除的令牌
    async fn send(
        &self,
        message: OutboundMessage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<MessageReceipt>;

    /// 接收一条可见消息；队列为空时返回 `None`
    async fn receive(
        &self,
        request: ReceiveRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ReceivedMessage>>;

    /// 删除消息；令牌过期或不匹配时失败
    async fn delete(&self, receipt: &MessageReceipt, cancel: &CancellationToken)
    -> anyhow::Result<()>;
}
