//! 请求管道与存储适配器（pipestore-pipeline）
//!
//! - `Request` / `RequestHandler`：请求与其唯一处理器；
//! - `PipelineBehavior` / `RequestPreProcessor` / `RequestPostProcessor`：管道扩展点；
//! - `Pipeline` / `InMemoryMediator`：按请求类型组合并分发；
//! - 存储适配器：将 `StorageCommand` 挂接到管道上，命令失败时记录并继续，
//!   只有适配器入口处检测到的取消会向外传播。
//!
pub mod behavior;
pub mod error;
pub mod inmemory_mediator;
pub mod mediator;
pub mod pipeline;
pub mod processor;
pub mod request;
pub mod request_handler;
mod side_effect;
pub mod storage_behavior;
pub mod storage_processor;

#[cfg(test)]
mod test_support;

pub use inmemory_mediator::InMemoryMediator;
pub use pipeline::Pipeline;
pub use storage_behavior::{StorageRequestBehavior, StorageResponseBehavior};
pub use storage_processor::{StoragePostProcessor, StoragePreProcessor};
