//! 事件分发模型（SerializedEvent）
//!
//! 事件离开实体后的标准形态：类型擦除为 JSON 载荷，附带来源实体与元数据，
//! 便于事件总线在不同实体类型之间统一路由。
//!
use crate::{
    domain_event::{DomainEvent, RecordedEvent},
    entity::Entity,
    error::DomainResult,
};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件唯一标识符
    event_id: String,
    /// 事件类型，用于处理器路由
    event_type: String,
    /// 事件版本，用于事件版本控制
    event_version: usize,
    /// 实体 ID，标识事件所属的实体实例
    entity_id: String,
    /// 实体类型
    entity_type: String,
    /// 事件发生时间
    occurred_at: DateTime<Utc>,
    /// 事件负载，存储事件的具体数据
    payload: Value,
}

impl SerializedEvent {
    /// 由实体上记录的事件构造
    pub fn from_recorded<E>(entity: &E, recorded: &RecordedEvent<E::Event>) -> DomainResult<Self>
    where
        E: Entity,
    {
        Ok(Self {
            event_id: recorded.event_id.to_string(),
            event_type: recorded.payload.event_type().to_string(),
            event_version: recorded.payload.event_version(),
            entity_id: entity.id().to_string(),
            entity_type: E::TYPE.to_string(),
            occurred_at: recorded.occurred_at,
            payload: serde_json::to_value(&recorded.payload)?,
        })
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> usize {
        self.event_version
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// 将载荷还原为具体事件类型
    pub fn decode<E>(&self) -> DomainResult<E>
    where
        E: DomainEvent,
    {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}
