//! 变更跟踪（ChangeTracker）
//!
//! 工作单元内登记过的实体按首次登记顺序保存，保存时据此生成存储变更
//! 与待分发事件。实体以所有权方式移交给跟踪器，读取时返回克隆。
//!
use super::serialized_event::SerializedEvent;
use super::store::{ChangeKind, EntityChange};
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult as Result};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;

/// 实体在工作单元内的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

// 类型擦除后的被跟踪实体
trait TrackedEntity: Send + Sync {
    fn key(&self) -> String;
    fn to_record(&self) -> Result<Value>;
    fn pending_events(&self) -> Result<Vec<SerializedEvent>>;
    fn pending_event_count(&self) -> usize;
    fn clear_events(&mut self);
    fn as_any(&self) -> &dyn Any;
}

impl<E> TrackedEntity for E
where
    E: Entity,
{
    fn key(&self) -> String {
        self.id().to_string()
    }

    fn to_record(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn pending_events(&self) -> Result<Vec<SerializedEvent>> {
        self.events()
            .iter()
            .map(|recorded| SerializedEvent::from_recorded(self, recorded))
            .collect()
    }

    fn pending_event_count(&self) -> usize {
        self.events().len()
    }

    fn clear_events(&mut self) {
        self.events_mut().clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Entry {
    entity_type: &'static str,
    state: EntityState,
    entity: Box<dyn TrackedEntity>,
}

/// 变更跟踪器
#[derive(Default)]
pub struct ChangeTracker {
    entries: Vec<Entry>,
    index: HashMap<(&'static str, String), usize>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询已跟踪的实体（返回克隆与状态）
    pub fn get<E: Entity>(&self, id: &E::Id) -> Option<(E, EntityState)> {
        let idx = *self.index.get(&(E::TYPE, id.to_string()))?;
        let entry = &self.entries[idx];
        entry
            .entity
            .as_any()
            .downcast_ref::<E>()
            .map(|e| (e.clone(), entry.state))
    }

    pub fn state_of<E: Entity>(&self, id: &E::Id) -> Option<EntityState> {
        self.index
            .get(&(E::TYPE, id.to_string()))
            .map(|idx| self.entries[*idx].state)
    }

    /// 以未变更状态纳入跟踪（从存储读取的实体）
    pub fn attach<E: Entity>(&mut self, entity: E) {
        if self.state_of::<E>(entity.id()).is_none() {
            self.push(entity, EntityState::Unchanged);
        }
    }

    /// 登记新实体
    pub fn add<E: Entity>(&mut self, entity: E) -> Result<()> {
        match self.state_of::<E>(entity.id()) {
            None => {
                self.push(entity, EntityState::Added);
                Ok(())
            }
            Some(EntityState::Deleted) => {
                self.replace(entity, EntityState::Modified);
                Ok(())
            }
            Some(_) => Err(DomainError::conflict(format!(
                "{}#{} is already tracked",
                E::TYPE,
                entity.id()
            ))),
        }
    }

    /// 登记已修改的实体
    pub fn update<E: Entity>(&mut self, entity: E) -> Result<()> {
        match self.state_of::<E>(entity.id()) {
            None => self.push(entity, EntityState::Modified),
            Some(EntityState::Added) => self.replace(entity, EntityState::Added),
            Some(EntityState::Unchanged | EntityState::Modified) => {
                self.replace(entity, EntityState::Modified)
            }
            Some(EntityState::Deleted) => {
                return Err(DomainError::InvalidState {
                    reason: format!("{}#{} is marked for deletion", E::TYPE, entity.id()),
                });
            }
        }
        Ok(())
    }

    /// 登记待删除的实体（实体上记录的事件仍会在提交后分发）
    pub fn remove<E: Entity>(&mut self, entity: E) -> Result<()> {
        match self.state_of::<E>(entity.id()) {
            None => self.push(entity, EntityState::Deleted),
            Some(EntityState::Added) => {
                return Err(DomainError::InvalidState {
                    reason: format!("{}#{} has not been saved yet", E::TYPE, entity.id()),
                });
            }
            Some(_) => self.replace(entity, EntityState::Deleted),
        }
        Ok(())
    }

    /// 需要写入存储的变更，按登记顺序
    pub fn pending_changes(&self) -> Result<Vec<EntityChange>> {
        let mut changes = Vec::new();
        for entry in &self.entries {
            let kind = match entry.state {
                EntityState::Unchanged => continue,
                EntityState::Added => ChangeKind::Insert(entry.entity.to_record()?),
                EntityState::Modified => ChangeKind::Update(entry.entity.to_record()?),
                EntityState::Deleted => ChangeKind::Delete,
            };
            changes.push(EntityChange {
                entity_type: entry.entity_type,
                key: entry.entity.key(),
                kind,
            });
        }
        Ok(changes)
    }

    /// 收集全部待分发事件：先按实体登记顺序，再按实体内记录顺序。不清空队列。
    pub fn pending_events(&self) -> Result<Vec<SerializedEvent>> {
        let mut events = Vec::with_capacity(self.pending_event_count());
        for entry in &self.entries {
            events.extend(entry.entity.pending_events()?);
        }
        Ok(events)
    }

    pub fn pending_event_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.entity.pending_event_count())
            .sum()
    }

    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.state != EntityState::Unchanged || e.entity.pending_event_count() > 0)
    }

    /// 保存成功后调用：清空事件队列，已删除实体停止跟踪，其余标记为未变更
    pub fn accept_changes(&mut self) {
        self.entries.retain(|e| e.state != EntityState::Deleted);
        for entry in &mut self.entries {
            entry.entity.clear_events();
            entry.state = EntityState::Unchanged;
        }
        self.reindex();
    }

    /// 丢弃全部跟踪的实体（回滚时调用）
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push<E: Entity>(&mut self, entity: E, state: EntityState) {
        self.index
            .insert((E::TYPE, entity.id().to_string()), self.entries.len());
        self.entries.push(Entry {
            entity_type: E::TYPE,
            state,
            entity: Box::new(entity),
        });
    }

    fn replace<E: Entity>(&mut self, entity: E, state: EntityState) {
        if let Some(idx) = self.index.get(&(E::TYPE, entity.id().to_string())) {
            let entry = &mut self.entries[*idx];
            entry.state = state;
            entry.entity = Box::new(entity);
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.entity_type, e.entity.key()), i))
            .collect();
    }
}
