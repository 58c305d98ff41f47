//! 进程内缓存（InMemoryCacheStore）
//!
//! 以 `DashMap` 保存条目，读取时检查过期并顺带清除；
//! 条目数达到上限时先清扫过期条目，仍不足再按到期时间淘汰最早的一批。
//! `get_or_set` 对同一键使用独立的异步锁，保证并发下工厂只执行一次；
//! 无论成功、失败还是被取消，最后一个持有者离开时都会回收该锁。
//! 时间基于 `tokio::time::Instant`，测试中可暂停/推进时钟。

use super::{CacheError, CacheFactory, CacheResult, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

/// 默认条目上限
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        // 超出时钟表示范围的 TTL 视为永不过期
        Self {
            value,
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

// 先到期的排在前面，永不过期的排在最后
fn expiry_order(a: &Option<Instant>, b: &Option<Instant>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

type KeyLocks = DashMap<String, Arc<Mutex<()>>>;

/// 某个键的 `get_or_set` 锁；离开作用域时若无其他等待者则从映射表移除
struct KeyLock<'a> {
    locks: &'a KeyLocks,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        // 仅剩映射表与本持有者
        self.locks.remove_if(self.key, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) <= 2
        });
    }
}

#[derive(Debug)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    locks: KeyLocks,
    max_entries: usize,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定条目上限（至少为 1）
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            locks: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// 当前条目数（含尚未被清除的过期条目）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清除所有过期条目，返回清除数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn read_live(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
            trace!(key, "expired cache entry evicted");
        }
        None
    }

    fn insert(&self, key: &str, entry: CacheEntry) {
        self.make_room(key);
        self.entries.insert(key.to_string(), entry);
    }

    fn make_room(&self, key: &str) {
        if self.entries.len() < self.max_entries || self.entries.contains_key(key) {
            return;
        }

        let purged = self.purge_expired();
        if self.entries.len() < self.max_entries {
            trace!(purged, "expired cache entries swept");
            return;
        }

        let mut candidates: Vec<(Option<Instant>, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().expires_at, entry.key().clone()))
            .collect();
        candidates.sort_by(|a, b| expiry_order(&a.0, &b.0));

        let overflow = self.entries.len() + 1 - self.max_entries;
        let evict = overflow.max(self.max_entries / 5);
        for (_, victim) in candidates.into_iter().take(evict) {
            self.entries.remove(&victim);
        }
        debug!(
            evicted = evict,
            max_entries = self.max_entries,
            "cache at capacity, evicted entries closest to expiry"
        );
    }

    fn key_lock<'a>(&'a self, key: &'a str) -> KeyLock<'a> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        KeyLock {
            locks: &self.locks,
            key,
            lock,
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.read_live(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        self.insert(key, CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn remove_by_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let matcher = glob::Pattern::new(pattern).map_err(|err| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;

        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matcher.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| entry.is_live(now))
            .count();
        trace!(pattern, removed, "cache entries removed by pattern");
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.read_live(key).is_some())
    }

    async fn get_or_set(
        &self,
        key: &str,
        factory: CacheFactory<'_>,
        ttl: Option<Duration>,
    ) -> CacheResult<Vec<u8>> {
        if let Some(value) = self.read_live(key) {
            return Ok(value);
        }

        let slot = self.key_lock(key);
        let _guard = slot.lock.lock().await;

        // 等锁期间可能已被其他调用写入
        if let Some(value) = self.read_live(key) {
            return Ok(value);
        }

        let value = factory().await?;
        self.insert(key, CacheEntry::new(value.clone(), ttl));
        Ok(value)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
