//! 领域事件（Domain Event）与实体事件缓冲
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`），以及实体用于暂存
//! 待分发事件的 `EventBuffer`（组合而非继承）。

mod domain_event_trait;
mod event_buffer;

pub use domain_event_trait::DomainEvent;
pub use event_buffer::{EventBuffer, RecordedEvent};
