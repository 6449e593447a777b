//! 存储命令（StorageCommand）
//!
//! 统一的"门控 → 校验 → 默认 → 执行"工作单元，每个（操作 × 消息类型）一份：
//! 1. 入口处取消信号已触发：直接返回 `Cancelled`，不读取任何配置；
//! 2. 未启用：直接成功返回（`Skipped`）；
//! 3. 客户端定位器缺失或返回空：`Configuration`；
//! 4. 载荷构造器缺失：由操作合成默认值并写回选项，无安全默认值时为 `Configuration`；
//! 5. 构造出的载荷为空：`Configuration`；
//! 6. 执行存储调用；
//! 7. 若配置了结果回调则调用之；
//! 8. 成功返回（`Completed`）。
//!
//! 步骤 3–7 中非本命令类型化错误的异常统一包装为一个 `CommandFailure`。
//! 每个终止状态输出恰好一条结构化日志。
//!
use crate::context::PipelineContext;
use crate::error::{StorageError, StorageResult};
use crate::options::{PayloadBuilder, StorageOptions};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 存储操作：命令之间唯一不同的部分
///
/// 各操作仅在读取哪些选项字段、默认载荷构造器产出什么、以及如何调用客户端上有所区别。
#[async_trait]
pub trait StorageOperation<M>: Send + Sync + 'static {
    /// 命令的稳定名称，用于日志与错误信息
    const NAME: &'static str;

    /// 存储客户端句柄（表/Blob/队列）
    type Client: Send + Sync + 'static;
    type Payload: Send + 'static;
    type Output: Send + 'static;

    /// 载荷构造器缺失时合成的默认值；`None` 表示没有安全默认值
    fn default_payload_builder(&self) -> Option<PayloadBuilder<M, Self::Payload>> {
        None
    }

    /// 执行存储调用
    async fn perform(
        &self,
        client: &Self::Client,
        payload: Self::Payload,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Self::Output>;
}

/// 命令执行的非错误终止状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// 命令未启用，未触及任何下游
    Skipped,
    /// 存储调用（及回调）已完成
    Completed,
}

pub struct StorageCommand<M, Op>
where
    Op: StorageOperation<M>,
{
    operation: Op,
    options: Arc<StorageOptions<M, Op>>,
}

impl<M, Op> StorageCommand<M, Op>
where
    M: Send + Sync,
    Op: StorageOperation<M>,
{
    pub fn new(operation: Op, options: StorageOptions<M, Op>) -> Self {
        Self::with_shared_options(operation, Arc::new(options))
    }

    /// 与其它命令实例共享同一份选项（默认值的记忆在实例间可见）
    pub fn with_shared_options(operation: Op, options: Arc<StorageOptions<M, Op>>) -> Self {
        Self { operation, options }
    }

    pub fn name(&self) -> &'static str {
        Op::NAME
    }

    pub fn options(&self) -> &Arc<StorageOptions<M, Op>> {
        &self.options
    }

    pub fn operation(&self) -> &Op {
        &self.operation
    }

    /// 对消息执行本命令。
    ///
    /// `context` 为空时，委托将收到一个临时的空上下文，写入其中的内容在返回后丢弃。
    pub async fn execute(
        &self,
        message: &mut M,
        context: Option<&PipelineContext>,
        cancel: &CancellationToken,
    ) -> StorageResult<CommandOutcome> {
        if cancel.is_cancelled() {
            tracing::warn!(command = Op::NAME, "storage command cancelled before start");
            return Err(StorageError::cancelled(Op::NAME));
        }

        if !self.options.is_enabled() {
            tracing::debug!(command = Op::NAME, outcome = "skipped", "storage command skipped");
            return Ok(CommandOutcome::Skipped);
        }

        let scratch;
        let context = match context {
            Some(context) => context,
            None => {
                scratch = PipelineContext::new();
                &scratch
            }
        };

        match self.run(message, context, cancel).await {
            Ok(()) => {
                tracing::info!(
                    command = Op::NAME,
                    outcome = "completed",
                    "storage command completed"
                );
                Ok(CommandOutcome::Completed)
            }
            Err(err) => {
                match &err {
                    StorageError::Configuration { requirement, .. } => tracing::error!(
                        command = Op::NAME,
                        outcome = "configuration_error",
                        requirement = %requirement,
                        "storage command misconfigured"
                    ),
                    other => tracing::error!(
                        command = Op::NAME,
                        outcome = "faulted",
                        error = %other,
                        "storage command failed"
                    ),
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        message: &mut M,
        context: &PipelineContext,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let Some(locator) = self.options.client_locator() else {
            return Err(StorageError::configuration(
                Op::NAME,
                "a valid Client is required",
            ));
        };
        let Some(client) = locator(&*message, context) else {
            return Err(StorageError::configuration(
                Op::NAME,
                "a valid Client is required",
            ));
        };

        let Some(builder) = self
            .options
            .payload_builder_or_default(|| self.operation.default_payload_builder())
        else {
            return Err(StorageError::configuration(
                Op::NAME,
                "a payload builder is required",
            ));
        };

        let payload = builder(&*message, context)
            .map_err(|e| StorageError::command_failure(Op::NAME, e))?
            .ok_or_else(|| StorageError::configuration(Op::NAME, "a valid payload is required"))?;

        let output = self
            .operation
            .perform(&client, payload, cancel)
            .await
            .map_err(|e| StorageError::command_failure(Op::NAME, e))?;

        if let Some(callback) = self.options.result_callback() {
            callback(output, context, message)
                .map_err(|e| StorageError::command_failure(Op::NAME, e))?;
        }

        Ok(())
    }
}

impl<M, Op> fmt::Debug for StorageCommand<M, Op>
where
    Op: StorageOperation<M>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCommand")
            .field("name", &Op::NAME)
            .field("options", &self.options)
            .finish()
    }
}
