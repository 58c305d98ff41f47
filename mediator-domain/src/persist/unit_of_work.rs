//! 工作单元（Unit of Work）
//!
//! 负责一次业务操作的事务边界：
//! 1. 处理器通过 `repository::<E>()` 登记实体变更；
//! 2. `save_changes` 将变更写入存储，成功后收集并清空所有实体的待分发事件；
//! 3. 无活动事务时立即分发事件；有活动事务时事件暂存，待 `commit_transaction` 成功后分发；
//! 4. 提交失败会先回滚再返回错误，暂存事件随之丢弃，不会被分发。
//!
//! 事件分发是尽力而为的通知：分发失败只记录日志，不影响已提交的数据。
//!
use super::change_tracker::ChangeTracker;
use super::repository::Repository;
use super::serialized_event::SerializedEvent;
use super::store::{EntityStore, StoreTransaction};
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult as Result};
use crate::eventing::EventBus;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 工作单元协议
#[async_trait]
pub trait UnitOfWork: Send {
    /// 开启事务；已有活动事务时为空操作
    async fn begin_transaction(&mut self) -> Result<()>;

    /// 保存已登记的变更，返回写入的记录数
    async fn save_changes(&mut self) -> Result<usize>;

    /// 保存并提交；任一步失败都会回滚后返回错误
    async fn commit_transaction(&mut self) -> Result<()>;

    /// 回滚事务并丢弃全部已登记的变更与事件
    async fn rollback_transaction(&mut self) -> Result<()>;

    fn has_active_transaction(&self) -> bool;

    /// 按实体类型获取仓储视图
    fn repository<E: Entity>(&mut self) -> Repository<'_, E>
    where
        Self: Sized;
}

/// 基于 `EntityStore` 与 `EventBus` 的工作单元实现
pub struct StoreUnitOfWork {
    store: Arc<dyn EntityStore>,
    event_bus: Arc<dyn EventBus>,
    tracker: ChangeTracker,
    transaction: Option<Box<dyn StoreTransaction>>,
    staged_events: Vec<SerializedEvent>,
}

impl StoreUnitOfWork {
    pub fn new(store: Arc<dyn EntityStore>, event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            store,
            event_bus,
            tracker: ChangeTracker::new(),
            transaction: None,
            staged_events: Vec::new(),
        }
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// 已保存但等待事务提交后分发的事件数
    pub fn staged_event_count(&self) -> usize {
        self.staged_events.len()
    }

    async fn dispatch(&self, events: Vec<SerializedEvent>) {
        if events.is_empty() {
            return;
        }

        match self.event_bus.publish_batch(&events).await {
            Ok(()) => debug!(count = events.len(), "domain events dispatched"),
            Err(err) => error!(
                error = %err,
                count = events.len(),
                "domain event dispatch failed after commit"
            ),
        }
    }

    async fn rollback_after(&mut self, cause: &DomainError) {
        if let Err(err) = self.rollback_transaction().await {
            warn!(error = %err, cause = %cause, "rollback failed");
        }
    }
}

#[async_trait]
impl UnitOfWork for StoreUnitOfWork {
    async fn begin_transaction(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Ok(());
        }
        self.transaction = Some(self.store.begin().await?);
        debug!("transaction started");
        Ok(())
    }

    async fn save_changes(&mut self) -> Result<usize> {
        if !self.tracker.has_changes() {
            return Ok(0);
        }

        // 事件先序列化但不清空，写入失败时实体上的事件保持原样
        let changes = self.tracker.pending_changes()?;
        let events = self.tracker.pending_events()?;

        let count = match self.transaction.as_mut() {
            Some(tx) => tx.apply(changes).await?,
            None => {
                let mut tx = self.store.begin().await?;
                let count = match tx.apply(changes).await {
                    Ok(count) => count,
                    Err(err) => {
                        if let Err(rb) = tx.rollback().await {
                            warn!(error = %rb, "rollback of implicit transaction failed");
                        }
                        return Err(err);
                    }
                };
                tx.commit().await?;
                count
            }
        };

        self.tracker.accept_changes();
        debug!(count, events = events.len(), "changes saved");

        if self.transaction.is_some() {
            self.staged_events.extend(events);
        } else {
            self.dispatch(events).await;
        }

        Ok(count)
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        if self.transaction.is_none() {
            self.save_changes().await?;
            return Ok(());
        }

        if let Err(err) = self.save_changes().await {
            error!(error = %err, "save failed during commit, rolling back");
            self.rollback_after(&err).await;
            return Err(err);
        }

        let Some(tx) = self.transaction.take() else {
            return Ok(());
        };

        if let Err(err) = tx.commit().await {
            error!(error = %err, "transaction commit failed");
            self.staged_events.clear();
            self.tracker.clear();
            return Err(err);
        }

        debug!("transaction committed");
        let events = std::mem::take(&mut self.staged_events);
        self.dispatch(events).await;
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        self.staged_events.clear();
        self.tracker.clear();

        match self.transaction.take() {
            Some(tx) => {
                tx.rollback().await?;
                debug!("transaction rolled back");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn has_active_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn repository<E: Entity>(&mut self) -> Repository<'_, E>
    where
        Self: Sized,
    {
        Repository::new(&mut self.tracker, self.store.as_ref())
    }
}

impl Drop for StoreUnitOfWork {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            warn!(
                staged_events = self.staged_events.len(),
                "unit of work dropped with an active transaction; changes discarded"
            );
        }
    }
}

/// 工作单元工厂：每个请求/操作作用域创建一个独立实例
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    store: Arc<dyn EntityStore>,
    event_bus: Arc<dyn EventBus>,
}

impl UnitOfWorkFactory {
    pub fn new(store: Arc<dyn EntityStore>, event_bus: Arc<dyn EventBus>) -> Self {
        Self { store, event_bus }
    }

    pub fn create(&self) -> StoreUnitOfWork {
        StoreUnitOfWork::new(self.store.clone(), self.event_bus.clone())
    }
}
