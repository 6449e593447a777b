use super::{BlobClient, BlobProperties, BlobUpload, DownloadedBlob};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 内存版 Blob 容器
#[derive(Debug)]
pub struct InMemoryBlobContainer {
    name: String,
    blobs: DashMap<String, DownloadedBlob>,
}

impl InMemoryBlobContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blobs: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.iter().map(|b| b.key().clone()).collect();
        names.sort();
        names
    }
}

#[async_trait]
impl BlobClient for InMemoryBlobContainer {
    fn container_name(&self) -> &str {
        &self.name
    }

    async fn upload(
        &self,
        blob: BlobUpload,
        cancel: &CancellationToken,
    ) -> anyhow::Result<BlobProperties> {
        if cancel.is_cancelled() {
            anyhow::bail!("upload to container {} cancelled", self.name);
        }
        let overwrite = blob.overwrite();
        let (name, content, content_type) = blob.into_parts();
        let properties = BlobProperties {
            name: name.clone(),
            content_length: content.len(),
            content_type,
            etag: Uuid::new_v4().simple().to_string(),
            last_modified: Utc::now(),
        };
        let stored = DownloadedBlob {
            properties: properties.clone(),
            content,
        };

        match self.blobs.entry(name) {
            Entry::Occupied(_) if !overwrite => {
                anyhow::bail!("blob {} already exists in {}", properties.name, self.name)
            }
            Entry::Occupied(mut slot) => {
                slot.insert(stored);
            }
            Entry::Vacant(slot) => {
                slot.insert(stored);
            }
        }
        Ok(properties)
    }

    async fn download(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<DownloadedBlob>> {
        if cancel.is_cancelled() {
            anyhow::bail!("download from container {} cancelled", self.name);
        }
        Ok(self.blobs.get(name).map(|b| b.value().clone()))
    }

    async fn delete(&self, name: &str, cancel: &CancellationToken) -> anyhow::Result<bool> {
        if cancel.is_cancelled() {
            anyhow::bail!("delete from container {} cancelled", self.name);
        }
        Ok(self.blobs.remove(name).is_some())
    }
}
