//! 内存版表存储（InMemoryTable）
//!
//! 基于 `DashMap` 的轻量实现，满足 `TableClient` 协议，典型用途：测试、示例与本地开发。
//!
use super::{EntityKey, TableClient, TableEntity};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct InMemoryTable {
    name: String,
    entities: DashMap<EntityKey, TableEntity>,
}

impl InMemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// 当前所有实体的快照
    pub fn entities(&self) -> Vec<TableEntity> {
        self.entities.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl TableClient for InMemoryTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    async fn upsert_entity(
        &self,
        entity: TableEntity,
        cancel: &CancellationToken,
    ) -> anyhow::Result<TableEntity> {
        if cancel.is_cancelled() {
            anyhow::bail!("upsert into table {} cancelled", self.name);
        }
        let stored = entity.stamped(Utc::now());
        self.entities.insert(stored.key(), stored.clone());
        Ok(stored)
    }

    async fn get_entity(
        &self,
        key: &EntityKey,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<TableEntity>> {
        if cancel.is_cancelled() {
            anyhow::bail!("read from table {} cancelled", self.name);
        }
        Ok(self.entities.get(key).map(|e| e.value().clone()))
    }

    async fn delete_entity(
        &self,
        key: &EntityKey,
        cancel: &CancellationToken,
    ) -> anyhow::Result<bool> {
        if cancel.is_cancelled() {
            anyhow::bail!("delete from table {} cancelled", self.name);
        }
        Ok(self.entities.remove(key).is_some())
    }
}
