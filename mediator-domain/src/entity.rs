//! 实体（Entity）基础抽象
//!
//! 为可持久化的实体提供统一的标识与事件缓冲能力。
//! 事件缓冲以组合方式挂在实体上，由 `#[entity]` 宏自动追加。
//!
use crate::domain_event::{DomainEvent, EventBuffer};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Display, str::FromStr};

/// 具备唯一标识与待分发事件队列的实体抽象
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 实体类型名（稳定字符串，用于存储分区与事件元数据）
    const TYPE: &'static str;

    /// 实体标识类型，要求可解析、可显示与可克隆
    type Id: FromStr + Clone + Display + Send + Sync;

    /// 该实体产生的领域事件类型
    type Event: DomainEvent;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;

    fn events(&self) -> &EventBuffer<Self::Event>;

    fn events_mut(&mut self) -> &mut EventBuffer<Self::Event>;

    /// 记录一条领域事件，待工作单元提交后分发
    fn record_event(&mut self, event: Self::Event) {
        self.events_mut().record(event);
    }
}
