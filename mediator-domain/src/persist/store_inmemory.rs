//! 内存版实体存储（InMemoryEntityStore）
//!
//! 满足 `EntityStore` 协议的轻量实现：
//! - 事务内变更先暂存，提交时在写锁下整体校验并生效；
//! - 新增/更新/删除分别做存在性检查，冲突即失败；
//! - 典型用途：测试环境、示例与本地开发。

use super::store::{ChangeKind, EntityChange, EntityStore, StoreTransaction};
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Tables = HashMap<String, BTreeMap<String, Value>>;

#[derive(Default)]
struct Inner {
    tables: RwLock<Tables>,
    sequences: Mutex<HashMap<String, u64>>,
}

/// 简单的内存实体存储
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    inner: Arc<Inner>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已提交的记录数
    pub async fn count(&self, entity_type: &str) -> usize {
        self.inner
            .tables
            .read()
            .await
            .get(entity_type)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn load(&self, entity_type: &str, key: &str) -> Result<Option<Value>> {
        let tables = self.inner.tables.read().await;
        Ok(tables.get(entity_type).and_then(|t| t.get(key)).cloned())
    }

    async fn next_sequence(&self, entity_type: &str) -> Result<u64> {
        let mut sequences = self.inner.sequences.lock().await;
        let seq = sequences.entry(entity_type.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            inner: self.inner.clone(),
            pending: Vec::new(),
        }))
    }
}

struct InMemoryTransaction {
    inner: Arc<Inner>,
    pending: Vec<EntityChange>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn apply(&mut self, changes: Vec<EntityChange>) -> Result<usize> {
        let tables = self.inner.tables.read().await;
        let mut staged: Vec<EntityChange> = Vec::with_capacity(changes.len());

        for change in changes {
            let exists = exists_after(&tables, self.pending.iter().chain(staged.iter()), &change);
            check(&change, exists)?;
            staged.push(change);
        }

        let count = staged.len();
        self.pending.extend(staged);
        Ok(count)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { inner, pending } = *self;
        let mut tables = inner.tables.write().await;

        // 先整体校验，再整体写入，保证要么全部生效要么全部不生效
        for (i, change) in pending.iter().enumerate() {
            let exists = exists_after(&tables, pending[..i].iter(), change);
            check(change, exists)?;
        }

        for change in pending {
            let table = tables.entry(change.entity_type.to_string()).or_default();
            match change.kind {
                ChangeKind::Insert(v) | ChangeKind::Update(v) => {
                    table.insert(change.key, v);
                }
                ChangeKind::Delete => {
                    table.remove(&change.key);
                }
            }
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

// 结合已提交数据与之前的暂存变更，判断某个键在本次变更前是否存在
fn exists_after<'a>(
    tables: &Tables,
    earlier: impl DoubleEndedIterator<Item = &'a EntityChange>,
    change: &EntityChange,
) -> bool {
    let last = earlier
        .rev()
        .find(|c| c.entity_type == change.entity_type && c.key == change.key);

    match last {
        Some(c) => !matches!(c.kind, ChangeKind::Delete),
        None => tables
            .get(change.entity_type)
            .is_some_and(|t| t.contains_key(&change.key)),
    }
}

fn check(change: &EntityChange, exists: bool) -> Result<()> {
    match (&change.kind, exists) {
        (ChangeKind::Insert(_), true) => Err(DomainError::conflict(format!(
            "{}#{} already exists",
            change.entity_type, change.key
        ))),
        (ChangeKind::Update(_), false) | (ChangeKind::Delete, false) => {
            Err(DomainError::not_found(change.entity_type, &change.key))
        }
        _ => Ok(()),
    }
}
