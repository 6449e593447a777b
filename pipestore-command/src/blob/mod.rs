//! Blob 存储（blob）
//!
//! - `BlobClient`：Blob 容器客户端协议；
//! - `InMemoryBlobContainer`：内存实现；
//! - `UploadBlob` / `DownloadBlob` / `DeleteBlob`：对应的存储操作。
//!
mod client;
mod client_inmemory;
mod operations;

pub use client::{BlobClient, BlobLocator, BlobProperties, BlobUpload, DownloadedBlob};
pub use client_inmemory::InMemoryBlobContainer;
pub use operations::{
    DeleteBlob, DeleteBlobCommand, DeleteBlobOptions, DownloadBlob, DownloadBlobCommand,
    DownloadBlobOptions, JSON_CONTENT_TYPE, UploadBlob, UploadBlobCommand, UploadBlobOptions,
};
