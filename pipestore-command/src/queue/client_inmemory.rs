//! 内存版队列（InMemoryQueue）
//!
//! 语义贴近云端存储队列：
//! - 接收后消息在可见性超时内对其它消费者不可见，超时后可被再次接收，出队计数递增；
//! - 每次接收生成新的 pop receipt，只有最近一次接收的令牌可删除该消息；
//! - 过期消息在下一次访问时清除。
//!
use super::{MessageReceipt, OutboundMessage, QueueClient, ReceiveRequest, ReceivedMessage};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Debug)]
struct StoredMessage {
    id: String,
    body: String,
    pop_receipt: String,
    dequeue_count: u32,
    inserted_at: DateTime<Utc>,
    visible_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct InMemoryQueue {
    name: String,
    messages: Mutex<VecDeque<StoredMessage>>,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(VecDeque::new()),
        }
    }

    /// 当前未过期的消息数（含不可见的）
    pub fn len(&self) -> usize {
        self.lock_live(Utc::now()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按入队顺序返回消息体
    pub fn bodies(&self) -> Vec<String> {
        self.lock_live(Utc::now())
            .iter()
            .map(|m| m.body.clone())
            .collect()
    }

    fn lock_live(&self, now: DateTime<Utc>) -> MutexGuard<'_, VecDeque<StoredMessage>> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.retain(|m| m.expires_at > now);
        messages
    }
}

/// `now + duration`；超出可表示的时间范围时返回错误
fn deadline(now: DateTime<Utc>, duration: Duration) -> anyhow::Result<DateTime<Utc>> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| anyhow::anyhow!("duration {duration:?} is out of range"))
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        message: OutboundMessage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<MessageReceipt> {
        if cancel.is_cancelled() {
            anyhow::bail!("send to queue {} cancelled", self.name);
        }
        let now = Utc::now();
        let stored = StoredMessage {
            id: Uuid::new_v4().to_string(),
            body: message.body().to_string(),
            pop_receipt: Uuid::new_v4().simple().to_string(),
            dequeue_count: 0,
            inserted_at: now,
            visible_at: deadline(now, message.visibility_delay().unwrap_or_default())?,
            expires_at: deadline(now, message.time_to_live().unwrap_or(DEFAULT_TIME_TO_LIVE))?,
        };
        let receipt = MessageReceipt {
            message_id: stored.id.clone(),
            pop_receipt: stored.pop_receipt.clone(),
        };
        self.lock_live(now).push_back(stored);
        Ok(receipt)
    }

    async fn receive(
        &self,
        request: ReceiveRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ReceivedMessage>> {
        if cancel.is_cancelled() {
            anyhow::bail!("receive from queue {} cancelled", self.name);
        }
        let now = Utc::now();
        let visible_at = deadline(now, request.visibility_timeout)?;
        let mut messages = self.lock_live(now);
        let Some(message) = messages.iter_mut().find(|m| m.visible_at <= now) else {
            return Ok(None);
        };

        message.pop_receipt = Uuid::new_v4().simple().to_string();
        message.dequeue_count += 1;
        message.visible_at = visible_at;

        Ok(Some(ReceivedMessage {
            message_id: message.id.clone(),
            pop_receipt: message.pop_receipt.clone(),
            body: message.body.clone(),
            dequeue_count: message.dequeue_count,
            inserted_at: message.inserted_at,
            next_visible_at: message.visible_at,
        }))
    }

    async fn delete(
        &self,
        receipt: &MessageReceipt,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        if cancel.is_cancelled() {
            anyhow::bail!("delete from queue {} cancelled", self.name);
        }
        let mut messages = self.lock_live(Utc::now());
        let Some(index) = messages.iter().position(|m| m.id == receipt.message_id) else {
            anyhow::bail!(
                "message {} not found in queue {}",
                receipt.message_id,
                self.name
            );
        };
        if messages[index].pop_receipt != receipt.pop_receipt {
            anyhow::bail!(
                "pop receipt mismatch for message {} in queue {}",
                receipt.message_id,
                self.name
            );
        }
        messages.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> OutboundMessage {
        OutboundMessage::builder().body(body).build()
    }

    #[tokio::test]
    async fn received_message_is_hidden_until_timeout() {
        let queue = InMemoryQueue::new("jobs");
        let cancel = CancellationToken::new();
        queue.send(message("a"), &cancel).await.unwrap();

        let hidden = ReceiveRequest {
            visibility_timeout: Duration::from_secs(60),
        };
        let first = queue.receive(hidden, &cancel).await.unwrap().unwrap();
        assert_eq!(first.body, "a");
        assert_eq!(first.dequeue_count, 1);
        assert!(queue.receive(hidden, &cancel).await.unwrap().is_none());
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn expired_visibility_reissues_receipt() {
        let queue = InMemoryQueue::new("jobs");
        let cancel = CancellationToken::new();
        queue.send(message("a"), &cancel).await.unwrap();

        let instant = ReceiveRequest {
            visibility_timeout: Duration::ZERO,
        };
        let first = queue.receive(instant, &cancel).await.unwrap().unwrap();
        let second = queue.receive(instant, &cancel).await.unwrap().unwrap();
        assert_eq!(first.message_id, second.message_id);
        assert_ne!(first.pop_receipt, second.pop_receipt);
        assert_eq!(second.dequeue_count, 2);

        // 过期令牌无法删除
        assert!(queue.delete(&first.receipt(), &cancel).await.is_err());
        queue.delete(&second.receipt(), &cancel).await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn delayed_message_is_not_received() {
        let queue = InMemoryQueue::new("jobs");
        let cancel = CancellationToken::new();
        let delayed = OutboundMessage::builder()
            .body("later")
            .visibility_delay(Duration::from_secs(60))
            .build();
        queue.send(delayed, &cancel).await.unwrap();
        queue.send(message("now"), &cancel).await.unwrap();

        let got = queue
            .receive(ReceiveRequest::default(), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.body, "now");
        assert_eq!(queue.bodies(), vec!["later".to_string(), "now".to_string()]);
    }

    #[tokio::test]
    async fn out_of_range_durations_are_errors() {
        let queue = InMemoryQueue::new("jobs");
        let cancel = CancellationToken::new();
        let huge = Duration::from_secs(9_000_000_000_000);

        let forever = OutboundMessage::builder()
            .body("forever")
            .time_to_live(huge)
            .build();
        let err = queue.send(forever, &cancel).await.unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(queue.is_empty());

        queue.send(message("a"), &cancel).await.unwrap();
        let err = queue
            .receive(
                ReceiveRequest {
                    visibility_timeout: huge,
                },
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));

        // 失败的接收不改变消息状态
        let got = queue
            .receive(ReceiveRequest::default(), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.dequeue_count, 1);
    }
}
