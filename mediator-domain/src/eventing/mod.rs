//! 事件子系统（eventing）
//!
//! 提供领域事件发布/订阅与处理的基础抽象与进程内实现：
//! - `EventBus`：统一发布/订阅接口，工作单元提交后经此分发事件；
//! - `EventHandler`：按事件类型消费事件；
//! - `InProcessEventBus`：进程内路由到处理器并广播给订阅者。
//!
//! 跨进程传输（消息队列等）不在本模块范围内，可另行实现 `EventBus` 接入。
//!
pub mod bus;
pub mod bus_inprocess;
pub mod handler;

pub use bus::EventBus;
pub use bus_inprocess::{InProcessEventBus, InProcessEventBusConfig};
pub use handler::{EventHandler, HandledEventType};
