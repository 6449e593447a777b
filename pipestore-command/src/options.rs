//! 命令选项（StorageOptions）
//!
//! 每个消息类型、每种操作各持有一份选项，提供：
//! - `enabled`：关闭时命令为空操作；
//! - `client_locator`：定位存储客户端，启用后必需，永不默认；
//! - `payload_builder`：由消息与上下文构造存储载荷，缺失时可由操作合成默认值并记忆；
//! - `result_callback`：存储调用完成后的回调，用于将读取结果写回消息或上下文。
//!
//! 默认载荷构造器的写回通过 `OnceLock` 完成：并发首次调用时只有一个候选被安装，
//! 其余调用方复用已安装的委托。
//!
use crate::command::StorageOperation;
use crate::context::PipelineContext;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// 客户端定位委托：须幂等且无副作用，会被重复调用
pub type ClientLocator<M, C> = Arc<dyn Fn(&M, &PipelineContext) -> Option<C> + Send + Sync>;

/// 载荷构造委托：`Ok(None)` 表示未能产出载荷
pub type PayloadBuilder<M, P> =
    Arc<dyn Fn(&M, &PipelineContext) -> anyhow::Result<Option<P>> + Send + Sync>;

/// 结果回调委托
pub type ResultCallback<M, R> =
    Arc<dyn Fn(R, &PipelineContext, &mut M) -> anyhow::Result<()> + Send + Sync>;

pub struct StorageOptions<M, Op>
where
    Op: StorageOperation<M>,
{
    enabled: bool,
    client_locator: Option<ClientLocator<M, Op::Client>>,
    payload_builder: OnceLock<PayloadBuilder<M, Op::Payload>>,
    result_callback: Option<ResultCallback<M, Op::Output>>,
    _op: PhantomData<fn() -> Op>,
}

impl<M, Op> StorageOptions<M, Op>
where
    Op: StorageOperation<M>,
{
    /// 启用状态的空白选项（仍需配置客户端定位器）
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            client_locator: None,
            payload_builder: OnceLock::new(),
            result_callback: None,
            _op: PhantomData,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled()
        }
    }

    pub fn set_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_client<F>(mut self, locator: F) -> Self
    where
        F: Fn(&M, &PipelineContext) -> Option<Op::Client> + Send + Sync + 'static,
    {
        self.client_locator = Some(Arc::new(locator));
        self
    }

    pub fn with_payload<F>(mut self, builder: F) -> Self
    where
        F: Fn(&M, &PipelineContext) -> anyhow::Result<Option<Op::Payload>> + Send + Sync + 'static,
    {
        let builder: PayloadBuilder<M, Op::Payload> = Arc::new(builder);
        self.payload_builder = OnceLock::from(builder);
        self
    }

    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: Fn(Op::Output, &PipelineContext, &mut M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.result_callback = Some(Arc::new(callback));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn client_locator(&self) -> Option<&ClientLocator<M, Op::Client>> {
        self.client_locator.as_ref()
    }

    pub fn payload_builder(&self) -> Option<&PayloadBuilder<M, Op::Payload>> {
        self.payload_builder.get()
    }

    pub fn result_callback(&self) -> Option<&ResultCallback<M, Op::Output>> {
        self.result_callback.as_ref()
    }

    /// 返回已配置的载荷构造器；缺失时调用 `make_default` 合成并写回。
    ///
    /// `make_default` 返回 `None` 表示该操作没有安全的默认值，此时不写回任何内容。
    pub(crate) fn payload_builder_or_default<F>(
        &self,
        make_default: F,
    ) -> Option<&PayloadBuilder<M, Op::Payload>>
    where
        F: FnOnce() -> Option<PayloadBuilder<M, Op::Payload>>,
    {
        if let Some(builder) = self.payload_builder.get() {
            return Some(builder);
        }

        let candidate = make_default()?;
        // 并发竞争时以先安装者为准
        Some(self.payload_builder.get_or_init(|| candidate))
    }
}

impl<M, Op> fmt::Debug for StorageOptions<M, Op>
where
    Op: StorageOperation<M>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOptions")
            .field("operation", &Op::NAME)
            .field("enabled", &self.enabled)
            .field("client_locator", &self.client_locator.is_some())
            .field("payload_builder", &self.payload_builder.get().is_some())
            .field("result_callback", &self.result_callback.is_some())
            .finish()
    }
}
