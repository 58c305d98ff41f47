//! 缓存子系统
//!
//! - `CacheStore`：按字节存取、带 TTL 的键值存储协议，支持通配删除与原子 get-or-set；
//! - `CacheStoreExt`：基于 JSON 的类型化读写；
//! - `key`：规范化序列化 + SHA-256 派生稳定缓存键；
//! - 内置实现：`InMemoryCacheStore`（并发安全）与 `NoOpCacheStore`（禁用缓存）。
//!
mod error;
pub mod key;
mod memory;
mod noop;
mod store;

pub use error::{CacheError, CacheResult};
pub use memory::InMemoryCacheStore;
pub use noop::NoOpCacheStore;
pub use store::{CacheFactory, CacheStore, CacheStoreExt};
