use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件只描述“发生了什么”，事件标识与发生时间由 [`EventBuffer`](super::EventBuffer)
/// 在记录时分配。
pub trait DomainEvent:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 事件类型（形如 `UserEvent.Created` 或自定义类型名），用于处理器路由
    fn event_type(&self) -> &str;

    /// 事件载荷版本（用于版本兼容）
    fn event_version(&self) -> usize {
        1
    }
}
