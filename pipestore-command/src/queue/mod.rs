//! 队列存储（queue）
//!
//! - `QueueClient`：队列客户端协议；
//! - `InMemoryQueue`：带可见性超时、出队计数与 pop receipt 校验的内存实现；
//! - `SendMessage` / `ReceiveMessage` / `DeleteMessage`：对应的存储操作。
//!
//! 接收与删除的关联：接收到的消息通过 `ReceivedMessage::receipt()` 给出不透明的删除令牌，
//! 接收命令以 `stash_receipt` 作为结果回调将其存入管道上下文，删除命令以
//! `receipt_from_context` 作为载荷构造器取回该令牌。
//!
mod client;
mod client_inmemory;
mod operations;

pub use client::{MessageReceipt, OutboundMessage, QueueClient, ReceiveRequest, ReceivedMessage};
pub use client_inmemory::InMemoryQueue;
pub use operations::{
    DeleteMessage, DeleteMessageCommand, DeleteMessageOptions, ReceiveMessage,
    ReceiveMessageCommand, ReceiveMessageOptions, SendMessage, SendMessageCommand,
    SendMessageOptions, receipt_from_context, stash_receipt,
};
