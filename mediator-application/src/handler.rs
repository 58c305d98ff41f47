use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;

/// 请求处理器
///
/// 每种请求类型恰好注册一个处理器；处理器位于行为链末端，
/// 缓存命中时不会被调用。长耗时处理器应观察 `ctx` 中的取消信号。
#[async_trait]
pub trait RequestHandler<R>: Send + Sync
where
    R: Request,
{
    async fn handle(&self, ctx: &AppContext, request: R) -> Result<R::Response, AppError>;
}
