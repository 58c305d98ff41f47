use serde::Serialize;

/// 应用层请求（Request）
///
/// 命令与查询的共同基础：
/// - `NAME` 是稳定的类型标识，用于路由、缓存键与日志；
/// - 请求需可序列化，缓存与校验结果缓存据此生成内容哈希；
/// - 请求在一次调用内不可变，处理器按值取得所有权。
pub trait Request: Serialize + Send + Sync + 'static {
    /// 请求的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 处理结果类型
    type Response: Send + 'static;
}
