//! 持久化与工作单元（persist）
//!
//! 定义实体存储协议、变更跟踪与工作单元，支持：
//! - 按实体类型的仓储视图（`Repository`），登记新增/修改/删除；
//! - 事务边界（`UnitOfWork`）：保存、提交、回滚；
//! - 提交成功后收集实体事件并经 `EventBus` 恰好分发一次（`SerializedEvent`）。
//!
//! 存储引擎本身由上层实现 `EntityStore` 注入，这里附带一个内存实现用于测试与示例。
//!
mod change_tracker;
mod repository;
mod serialized_event;
mod store;
mod store_inmemory;
mod unit_of_work;

pub use change_tracker::{ChangeTracker, EntityState};
pub use repository::Repository;
pub use serialized_event::SerializedEvent;
pub use store::{ChangeKind, EntityChange, EntityStore, StoreTransaction};
pub use store_inmemory::InMemoryEntityStore;
pub use unit_of_work::{StoreUnitOfWork, UnitOfWork, UnitOfWorkFactory};
