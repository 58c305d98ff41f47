//! 请求管道的领域层基础库（mediator-domain）
//!
//! 提供事务边界与领域事件相关的通用抽象与构件：
//! - 实体（`entity`）：标识 + 组合式事件缓冲
//! - 领域事件（`domain_event`）：事件载荷协议与 `EventBuffer`
//! - 事件系统（`eventing`）：总线与处理器，以及进程内实现
//! - 持久化（`persist`）：实体存储协议、变更跟踪、仓储视图与工作单元
//!
//! 本 crate 与具体存储和传输实现解耦，仅定义领域层接口与最小必要的错误类型。
//!
//! 典型用法：
//! 1. 用 `#[entity]` 与 `#[domain_event]` 定义实体与事件，在实体方法中 `record_event`；
//! 2. 处理器通过 `UnitOfWorkFactory::create` 获得工作单元，经 `repository::<E>()` 登记变更；
//! 3. `commit_transaction` 持久化并把实体上积累的事件交给 `EventBus` 分发。
//!
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod persist;

// 允许在本 crate 内部通过 ::mediator_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::mediator_domain 路径。
extern crate self as mediator_domain;
