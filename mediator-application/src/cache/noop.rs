use super::{CacheFactory, CacheResult, CacheStore};
use async_trait::async_trait;
use std::time::Duration;

/// 禁用缓存时使用：读取总是未命中，写入总是成功
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpCacheStore;

#[async_trait]
impl CacheStore for NoOpCacheStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> CacheResult<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn remove_by_pattern(&self, _pattern: &str) -> CacheResult<usize> {
        Ok(0)
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn get_or_set(
        &self,
        _key: &str,
        factory: CacheFactory<'_>,
        _ttl: Option<Duration>,
    ) -> CacheResult<Vec<u8>> {
        factory().await
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}
