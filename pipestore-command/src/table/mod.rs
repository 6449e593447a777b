//! 表存储（table）
//!
//! 提供实体的插入、读取与删除：
//! - `TableClient`：表客户端协议；
//! - `InMemoryTable`：基于内存的实现，用于测试与本地开发；
//! - `InsertEntity` / `RetrieveEntity` / `DeleteEntity`：对应的存储操作。
//!
mod client;
mod client_inmemory;
mod operations;

pub use client::{EntityKey, TableClient, TableEntity};
pub use client_inmemory::InMemoryTable;
pub use operations::{
    DATA_PROPERTY, DeleteEntity, DeleteEntityCommand, DeleteEntityOptions, InsertEntity,
    InsertEntityCommand, InsertEntityOptions, RetrieveEntity, RetrieveEntityCommand,
    RetrieveEntityOptions,
};
