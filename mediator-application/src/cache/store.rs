use super::{CacheError, CacheResult};
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;

/// `get_or_set` 的值工厂：仅在键缺失时调用一次
pub type CacheFactory<'a> = Box<dyn FnOnce() -> BoxFuture<'a, CacheResult<Vec<u8>>> + Send + 'a>;

/// 缓存存储协议
///
/// - 值为不透明字节，过期条目在读取时即视为不存在；
/// - `ttl = None` 表示不过期；
/// - 实现需支持并发调用，调用方无需额外加锁。
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    /// 返回键是否存在并被删除
    async fn remove(&self, key: &str) -> CacheResult<bool>;

    /// 按通配模式删除（`*`、`?`、`[...]`），返回删除数量
    async fn remove_by_pattern(&self, pattern: &str) -> CacheResult<usize>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// 原子读取或创建：同一键的并发调用只执行一次工厂
    async fn get_or_set(
        &self,
        key: &str,
        factory: CacheFactory<'_>,
        ttl: Option<Duration>,
    ) -> CacheResult<Vec<u8>>;

    fn provider_name(&self) -> &'static str;
}

/// 基于 JSON 的类型化读写
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    async fn get_json<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl).await
    }

    async fn get_or_set_json<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CacheResult<T>> + Send,
    {
        let factory: CacheFactory<'_> = Box::new(move || {
            async move {
                let value = factory().await?;
                serde_json::to_vec(&value).map_err(CacheError::from)
            }
            .boxed()
        });
        let bytes = self.get_or_set(key, factory, ttl).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
