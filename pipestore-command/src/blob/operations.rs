use super::{BlobClient, BlobLocator, BlobProperties, BlobUpload, DownloadedBlob};
use crate::command::{StorageCommand, StorageOperation};
use crate::context::PipelineContext;
use crate::options::{PayloadBuilder, StorageOptions};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// 上传 Blob；缺省载荷为 `{uuid}.json` + JSON 序列化的消息
#[derive(Clone, Copy, Debug, Default)]
pub struct UploadBlob;

#[async_trait]
impl<M> StorageOperation<M> for UploadBlob
where
    M: Serialize + Send + Sync + 'static,
{
    const NAME: &'static str = "UploadBlobCommand";
    type Client = Arc<dyn BlobClient>;
    type Payload = BlobUpload;
    type Output = BlobProperties;

    fn default_payload_builder(&self) -> Option<PayloadBuilder<M, BlobUpload>> {
        Some(Arc::new(
            |message: &M, _ctx: &PipelineContext| -> anyhow::Result<Option<BlobUpload>> {
                let upload = BlobUpload::builder()
                    .name(format!("{}.json", Uuid::new_v4()))
                    .content(serde_json::to_vec(message)?)
                    .content_type(JSON_CONTENT_TYPE)
                    .build();
                Ok(Some(upload))
            },
        ))
    }

    async fn perform(
        &self,
        client: &Arc<dyn BlobClient>,
        payload: BlobUpload,
        cancel: &CancellationToken,
    ) -> anyhow::Result<BlobProperties> {
        tracing::debug!(
            container = client.container_name(),
            blob = payload.name(),
            "uploading blob"
        );
        client.upload(payload, cancel).await
    }
}

/// 下载 Blob；必须由调用方提供 `BlobLocator`
#[derive(Clone, Copy, Debug, Default)]
pub struct DownloadBlob;

#[async_trait]
impl<M> StorageOperation<M> for DownloadBlob
where
    M: Send + Sync + 'static,
{
    const NAME: &'static str = "DownloadBlobCommand";
    type Client = Arc<dyn BlobClient>;
    type Payload = BlobLocator;
    type Output = Option<DownloadedBlob>;

    async fn perform(
        &self,
        client: &Arc<dyn BlobClient>,
        payload: BlobLocator,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<DownloadedBlob>> {
        client.download(&payload.name, cancel).await
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteBlob;

#[async_trait]
impl<M> StorageOperation<M> for DeleteBlob
where
    M: Send + Sync + 'static,
{
    const NAME: &'static str = "DeleteBlobCommand";
    type Client = Arc<dyn BlobClient>;
    type Payload = BlobLocator;
    type Output = bool;

    async fn perform(
        &self,
        client: &Arc<dyn BlobClient>,
        payload: BlobLocator,
        cancel: &CancellationToken,
    ) -> anyhow::Result<bool> {
        client.delete(&payload.name, cancel).await
    }
}

pub type UploadBlobOptions<M> = StorageOptions<M, UploadBlob>;
pub type DownloadBlobOptions<M> = StorageOptions<M, DownloadBlob>;
pub type DeleteBlobOptions<M> = StorageOptions<M, DeleteBlob>;

pub type UploadBlobCommand<M> = StorageCommand<M, UploadBlob>;
pub type DownloadBlobCommand<M> = StorageCommand<M, DownloadBlob>;
pub type DeleteBlobCommand<M> = StorageCommand<M, DeleteBlob>;
