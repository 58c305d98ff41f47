//! 请求校验
//!
//! 每种请求可注册零到多个相互独立的校验器，失败按属性路径分组为
//! `属性 -> 有序消息列表`，即对外可见的校验错误形态。
//! 昂贵校验器（如需查询外部系统）可通过 `ValidationResultCache` 在 TTL 内复用结果。
//!
mod failure;
mod result_cache;
pub mod rules;
mod validator;

pub use failure::{ValidationErrors, ValidationFailure};
pub use result_cache::ValidationResultCache;
pub use rules::RuleValidator;
pub use validator::{ValidationCost, Validator};
