use crate::request::Request;
use std::time::Duration;

/// 应用层查询（Query）
///
/// 表达只读意图，不改变领域状态。
/// - 与 [`Command`](crate::command::Command) 相对，`Query` 应避免副作用；
/// - 需要结果缓存时再实现 [`CacheableQuery`]。
pub trait Query: Request {}

/// 可缓存查询
///
/// 只有实现了该 trait 的查询才能挂载缓存行为。
/// 未提供自定义键时，缓存键由 `NAME` 与请求内容哈希派生。
pub trait CacheableQuery: Query {
    /// 自定义缓存键，原样使用
    fn cache_key(&self) -> Option<String> {
        None
    }

    /// 覆盖默认 TTL
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }
}
