use super::ValidationFailure;
use crate::cache::key::{validation_cache_key, validation_cache_pattern};
use crate::cache::{CacheResult, CacheStore, CacheStoreExt};
use std::sync::Arc;
use std::time::Duration;

/// 校验结果缓存
///
/// 以 `(请求键, 校验器名)` 为键保存一次校验的失败列表（空列表代表通过）。
pub struct ValidationResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ValidationResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(
        &self,
        request_key: &str,
        validator: &str,
    ) -> CacheResult<Option<Vec<ValidationFailure>>> {
        self.store
            .get_json(&validation_cache_key(request_key, validator))
            .await
    }

    pub async fn put(
        &self,
        request_key: &str,
        validator: &str,
        failures: &[ValidationFailure],
    ) -> CacheResult<()> {
        self.store
            .set_json(
                &validation_cache_key(request_key, validator),
                &failures,
                Some(self.ttl),
            )
            .await
    }

    /// 丢弃某个请求的全部校验结果，返回删除数量
    pub async fn invalidate(&self, request_key: &str) -> CacheResult<usize> {
        self.store
            .remove_by_pattern(&validation_cache_pattern(request_key))
            .await
    }
}
