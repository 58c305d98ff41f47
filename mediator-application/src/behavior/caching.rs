use super::{Behavior, Next};
use crate::cache::CacheStore;
use crate::cache::key::cache_key_for;
use crate::{context::AppContext, error::AppError, query::CacheableQuery};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 查询结果缓存行为（cache-aside）
///
/// - 命中：直接返回缓存的响应，不调用后续环节；
/// - 未命中：调用后续环节，非空响应按自定义 TTL 或默认 TTL 写入后返回；
/// - 缓存故障或反序列化失败只告警，按未命中处理；
/// - 读缓存期间取消返回 `AppError::Cancelled`，处理器完成后才取消则照常返回响应但不写缓存。
pub struct CachingBehavior<Q> {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
    _query: PhantomData<fn() -> Q>,
}

impl<Q> CachingBehavior<Q>
where
    Q: CacheableQuery,
    Q::Response: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self {
            store,
            default_ttl,
            _query: PhantomData,
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Q::Response>, AppError> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!(query = Q::NAME, cache_key = key, error = %err, "cache read failed");
                return Ok(None);
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(response) => Ok(Some(response)),
            Err(err) => {
                warn!(query = Q::NAME, cache_key = key, error = %err, "cached response unreadable");
                Ok(None)
            }
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), AppError> {
        match self.store.set(key, bytes, Some(ttl)).await {
            Ok(()) => debug!(
                query = Q::NAME,
                cache_key = key,
                ttl_secs = ttl.as_secs(),
                "response cached"
            ),
            Err(err) => warn!(query = Q::NAME, cache_key = key, error = %err, "cache write failed"),
        }
        Ok(())
    }
}

#[async_trait]
impl<Q> Behavior<Q> for CachingBehavior<Q>
where
    Q: CacheableQuery,
    Q::Response: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "caching"
    }

    async fn handle(
        &self,
        ctx: &AppContext,
        request: Q,
        next: Next<'_, Q>,
    ) -> Result<Q::Response, AppError> {
        let key = cache_key_for(&request)?;
        let ttl = request.cache_ttl().unwrap_or(self.default_ttl);

        if let Some(hit) = ctx.cancellable(self.read(&key)).await? {
            debug!(query = Q::NAME, cache_key = %key, "cache hit");
            return Ok(hit);
        }
        debug!(query = Q::NAME, cache_key = %key, "cache miss");

        let response = next.run(ctx, request).await?;

        let value = serde_json::to_value(&response)?;
        if !value.is_null() {
            let bytes = serde_json::to_vec(&value)?;
            // 响应已经算出，取消只放弃写缓存
            if let Err(err) = ctx.cancellable(self.write(&key, bytes, ttl)).await {
                debug!(query = Q::NAME, cache_key = %key, error = %err, "cache write skipped");
            }
        }
        Ok(response)
    }
}
