use crate::request::Request;

/// 应用层命令（Command）
///
/// 表达一次业务意图（写操作），可能改变领域状态。
/// - 由 [`RequestHandler`](crate::handler::RequestHandler) 处理，状态变更经工作单元提交；
/// - 不需要返回值时 `Response = ()`；
/// - 命令不参与结果缓存。
pub trait Command: Request {}
