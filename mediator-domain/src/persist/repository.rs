use super::change_tracker::{ChangeTracker, EntityState};
use super::store::EntityStore;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult as Result};
use std::marker::PhantomData;

/// 按实体类型访问工作单元的仓储视图
///
/// - 读取：先查跟踪器，再查已提交数据（读到的实体自动纳入跟踪）；
/// - 写入：`add/update/remove` 只登记变更，由工作单元统一保存。
pub struct Repository<'u, E>
where
    E: Entity,
{
    tracker: &'u mut ChangeTracker,
    store: &'u dyn EntityStore,
    _marker: PhantomData<E>,
}

impl<'u, E> Repository<'u, E>
where
    E: Entity,
{
    pub(crate) fn new(tracker: &'u mut ChangeTracker, store: &'u dyn EntityStore) -> Self {
        Self {
            tracker,
            store,
            _marker: PhantomData,
        }
    }

    pub async fn find(&mut self, id: &E::Id) -> Result<Option<E>> {
        match self.tracker.get::<E>(id) {
            Some((_, EntityState::Deleted)) => return Ok(None),
            Some((entity, _)) => return Ok(Some(entity)),
            None => {}
        }

        let Some(record) = self.store.load(E::TYPE, &id.to_string()).await? else {
            return Ok(None);
        };

        let entity: E = serde_json::from_value(record)?;
        self.tracker.attach(entity.clone());
        Ok(Some(entity))
    }

    pub async fn get(&mut self, id: &E::Id) -> Result<E> {
        self.find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(E::TYPE, id))
    }

    pub fn add(&mut self, entity: E) -> Result<()> {
        self.tracker.add(entity)
    }

    pub fn update(&mut self, entity: E) -> Result<()> {
        self.tracker.update(entity)
    }

    pub fn remove(&mut self, entity: E) -> Result<()> {
        self.tracker.remove(entity)
    }

    /// 分配下一个数值型标识
    pub async fn next_id(&self) -> Result<u64> {
        self.store.next_sequence(E::TYPE).await
    }
}
