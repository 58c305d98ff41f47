//! 请求管道的应用层（mediator-application）
//!
//! 每个入站操作（命令或查询）经 `Dispatcher` 路由到为其类型构建的 `Pipeline`，
//! 依次穿过日志、性能、校验（或带缓存的校验）与结果缓存等行为后到达处理器。
//! 处理器内部通过 `mediator_domain` 的工作单元提交状态变更并分发领域事件。
//!
pub mod behavior;
pub mod cache;
pub mod command;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod query;
pub mod request;
pub mod request_bus;
pub mod validation;

pub use dispatcher::Dispatcher;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use request_bus::RequestBus;

// 允许过程宏生成的 ::mediator_application 路径在本 crate 内部解析
extern crate self as mediator_application;
