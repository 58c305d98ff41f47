use super::DomainEvent;
use chrono::{DateTime, Utc};
use std::slice::Iter;
use uuid::Uuid;

/// 已记录、尚未分发的事件
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent<E> {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub payload: E,
}

/// 实体持有的待分发事件队列
///
/// - 仅追加，保持记录顺序；
/// - 只能由工作单元在保存成功后整体清空；
/// - 不参与实体的序列化（由 `#[serde(skip)]` 排除）。
#[derive(Debug, Clone)]
pub struct EventBuffer<E> {
    pending: Vec<RecordedEvent<E>>,
}

impl<E> Default for EventBuffer<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<E> EventBuffer<E>
where
    E: DomainEvent,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条新事件，分配事件 ID 与发生时间
    pub fn record(&mut self, payload: E) -> &RecordedEvent<E> {
        self.pending.push(RecordedEvent {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            payload,
        });
        &self.pending[self.pending.len() - 1]
    }

    pub fn pending(&self) -> &[RecordedEvent<E>] {
        &self.pending
    }

    pub fn iter(&self) -> Iter<'_, RecordedEvent<E>> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 取出全部事件并清空队列
    pub fn drain(&mut self) -> Vec<RecordedEvent<E>> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
