use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// 待上传的 Blob
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct BlobUpload {
    #[builder(into)]
    name: String,
    #[builder(into)]
    content: Vec<u8>,
    #[builder(into)]
    content_type: Option<String>,
    /// 为 `false` 时同名 Blob 已存在则失败
    #[builder(default = true)]
    overwrite: bool,
}

impl BlobUpload {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>, Option<String>) {
        (self.name, self.content, self.content_type)
    }
}

/// 读取/删除时定位 Blob 的标识
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobLocator {
    pub name: String,
}

impl BlobLocator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobProperties {
    pub name: String,
    pub content_length: usize,
    pub content_type: Option<String>,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedBlob {
    pub properties: BlobProperties,
    pub content: Vec<u8>,
}

impl DownloadedBlob {
    /// 将内容按 JSON 解码
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.content)
    }
}

/// Blob 容器客户端
#[async_trait]
pub trait BlobClient: Send + Sync {
    fn container_name(&self) -> &str;

    async fn upload(
        &self,
        blob: BlobUpload,
        cancel: &CancellationToken,
    ) -> anyhow::Result<BlobProperties>;

    async fn download(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<DownloadedBlob>>;

    /// 删除 Blob，返回删除前是否存在
    async fn delete(&self, name: &str, cancel: &CancellationToken) -> anyhow::Result<bool>;
}
