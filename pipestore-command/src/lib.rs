//! 存储命令核心库（pipestore-command）
//!
//! 将外部存储副作用（持久化实体、上传 Blob、发送队列消息及其逆操作）以统一的命令抽象表达，
//! 使请求处理器本身无需包含存储逻辑：
//! - `StorageOptions`：按消息类型配置的委托集合（启用开关、客户端定位、载荷构造、结果回调）；
//! - `StorageCommand`：门控、校验、默认、执行的统一工作单元；
//! - `PipelineContext`：单次请求范围内共享的命名值与被捕获错误；
//! - `table` / `blob` / `queue`：三类存储的客户端协议、内存实现与具体操作。
//!
//! 直接调用命令时，`Configuration` 与 `CommandFailure` 会原样返回给调用方；
//! 管道适配器（见 `pipestore-pipeline`）负责将其记录并吞掉。
//!
pub mod blob;
pub mod command;
pub mod context;
pub mod error;
pub mod options;
pub mod queue;
pub mod table;

pub use command::{CommandOutcome, StorageCommand, StorageOperation};
pub use context::PipelineContext;
pub use error::{StorageError, StorageResult};
pub use options::StorageOptions;
