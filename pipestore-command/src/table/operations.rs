use super::{EntityKey, TableClient, TableEntity};
use crate::command::{StorageCommand, StorageOperation};
use crate::context::PipelineContext;
use crate::options::{PayloadBuilder, StorageOptions};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 默认载荷中保存序列化消息的属性名
pub const DATA_PROPERTY: &str = "Data";

/// 插入实体；缺省载荷为新生成的分区键/行键 + JSON 序列化的消息
#[derive(Clone, Copy, Debug, Default)]
pub struct InsertEntity;

#[async_trait]
impl<M> StorageOperation<M> for InsertEntity
where
    M: Serialize + Send + Sync + 'static,
{
    const NAME: &'static str = "InsertEntityCommand";
    type Client = Arc<dyn TableClient>;
    type Payload = TableEntity;
    type Output = TableEntity;

    fn default_payload_builder(&self) -> Option<PayloadBuilder<M, TableEntity>> {
        Some(Arc::new(
            |message: &M, _ctx: &PipelineContext| -> anyhow::Result<Option<TableEntity>> {
                // 每次构造都生成新的标识，避免重复插入覆盖同一实体
                let mut entity = TableEntity::builder()
                    .partition_key(Uuid::new_v4().to_string())
                    .row_key(Uuid::new_v4().to_string())
                    .build();
                entity.set_property(DATA_PROPERTY, serde_json::to_string(message)?);
                Ok(Some(entity))
            },
        ))
    }

    async fn perform(
        &self,
        client: &Arc<dyn TableClient>,
        payload: TableEntity,
        cancel: &CancellationToken,
    ) -> anyhow::Result<TableEntity> {
        tracing::debug!(table = client.table_name(), key = %payload.key(), "inserting entity");
        client.upsert_entity(payload, cancel).await
    }
}

/// 按标识读取实体；必须由调用方提供 `EntityKey`
#[derive(Clone, Copy, Debug, Default)]
pub struct RetrieveEntity;

#[async_trait]
impl<M> StorageOperation<M> for RetrieveEntity
where
    M: Send + Sync + 'static,
{
    const NAME: &'static str = "RetrieveEntityCommand";
    type Client = Arc<dyn TableClient>;
    type Payload = EntityKey;
    type Output = Option<TableEntity>;

    async fn perform(
        &self,
        client: &Arc<dyn TableClient>,
        payload: EntityKey,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<TableEntity>> {
        client.get_entity(&payload, cancel).await
    }
}

/// 按标识删除实体；输出删除前是否存在
#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteEntity;

#[async_trait]
impl<M> StorageOperation<M> for DeleteEntity
where
    M: Send + Sync + 'static,
{
    const NAME: &'static str = "DeleteEntityCommand";
    type Client = Arc<dyn TableClient>;
    type Payload = EntityKey;
    type Output = bool;

    async fn perform(
        &self,
        client: &Arc<dyn TableClient>,
        payload: EntityKey,
        cancel: &CancellationToken,
    ) -> anyhow::Result<bool> {
        client.delete_entity(&payload, cancel).await
    }
}

pub type InsertEntityOptions<M> = StorageOptions<M, InsertEntity>;
pub type RetrieveEntityOptions<M> = StorageOptions<M, RetrieveEntity>;
pub type DeleteEntityOptions<M> = StorageOptions<M, DeleteEntity>;

pub type InsertEntityCommand<M> = StorageCommand<M, InsertEntity>;
pub type RetrieveEntityCommand<M> = StorageCommand<M, RetrieveEntity>;
pub type DeleteEntityCommand<M> = StorageCommand<M, DeleteEntity>;
