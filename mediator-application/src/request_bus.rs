use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;

/// 请求总线（Request Bus）
///
/// - 负责根据请求的具体类型路由到对应的管道；
/// - 命令与查询共用同一入口，返回请求关联的响应类型；
/// - 该 trait 带有泛型方法，通常以具体实现类型注入使用。
#[async_trait]
pub trait RequestBus: Send + Sync {
    async fn send<R>(&self, ctx: &AppContext, request: R) -> Result<R::Response, AppError>
    where
        R: Request;
}
