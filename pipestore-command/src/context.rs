use crate::error::StorageError;
use bon::Builder;
use dashmap::DashMap;
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

/// 管道上下文（Pipeline Context）
///
/// 单次请求范围内的共享暂存区，由处理同一请求的所有适配器与命令通过引用共享：
/// - 命名值袋（类型擦除）：结果回调可将读取/下载的数据写回，供后续步骤使用；
/// - 错误列表（只追加）：行为/处理器吞掉的命令错误记录于此，便于事后检查与遥测。
///
/// 生命周期：管道入口创建、出口丢弃；不得在并发请求之间共享。
///
/// ```rust
/// use pipestore_command::context::PipelineContext;
///
/// let ctx = PipelineContext::builder()
///     .maybe_correlation_id(Some("cor-1".into()))
///     .build();
/// ctx.insert("tenant", "acme".to_string());
/// assert_eq!(ctx.get::<String>("tenant").as_deref(), Some("acme"));
/// ```
#[derive(Builder, Debug, Default)]
pub struct PipelineContext {
    /// 关联ID
    correlation_id: Option<String>,
    #[builder(skip)]
    items: DashMap<String, Item>,
    #[builder(skip)]
    errors: Mutex<Vec<Arc<StorageError>>>,
}

type Item = Arc<dyn Any + Send + Sync>;

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// 写入命名值，同名覆盖
    pub fn insert<T>(&self, key: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.items.insert(key.into(), Arc::new(value));
    }

    /// 读取命名值；键不存在或类型不符时返回 `None`
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let item = self.items.get(key)?.value().clone();
        item.downcast_ref::<T>().cloned()
    }

    /// 原子地取出并移除命名值；类型不符时保留原值
    pub fn take<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let (_, item) = self.items.remove_if(key, |_, item| item.is::<T>())?;
        let item = item.downcast::<T>().ok()?;
        Some(Arc::unwrap_or_clone(item))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }

    /// 追加一条被捕获的命令错误
    pub fn record_error(&self, error: StorageError) -> Arc<StorageError> {
        let error = Arc::new(error);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.clone());
        error
    }

    /// 按记录顺序返回已捕获的错误
    pub fn errors(&self) -> Vec<Arc<StorageError>> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_errors(&self) -> bool {
        !self
            .errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
