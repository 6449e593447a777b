use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use super::DATA_PROPERTY;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// 实体标识：分区键 + 行键
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub partition_key: String,
    pub row_key: String,
}

impl EntityKey {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition_key, self.row_key)
    }
}

#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct TableEntity {
    /// 分区键
    #[builder(into)]
    partition_key: String,
    /// 行键
    #[builder(into)]
    row_key: String,
    /// 实体属性
    #[builder(default)]
    properties: Map<String, Value>,
    /// 最后写入时间，由存储层赋值
    timestamp: Option<DateTime<Utc>>,
}

impl TableEntity {
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.partition_key.clone(), self.row_key.clone())
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// 解码 `Data` 属性中以 JSON 保存的消息；属性不存在时返回 `None`
    pub fn data<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        match self.properties.get(DATA_PROPERTY) {
            Some(Value::String(raw)) => serde_json::from_str(raw).map(Some),
            Some(other) => serde_json::from_value(other.clone()).map(Some),
            None => Ok(None),
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub(crate) fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

/// 表客户端：实体的写入、读取与删除
#[async_trait]
pub trait TableClient: Send + Sync {
    /// 表名（用于日志）
    fn table_name(&self) -> &str;

    /// 插入或替换实体，返回存储后的实体
    async fn upsert_entity(
        &self,
        entity: TableEntity,
        cancel: &CancellationToken,
    ) -> anyhow::Result<TableEntity>;

    async fn get_entity(
        &self,
        key: &EntityKey,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<TableEntity>>;

    /// 删除实体，返回删除前是否存在
    async fn delete_entity(&self, key: &EntityKey, cancel: &CancellationToken)
    -> anyhow::Result<bool>;
}
