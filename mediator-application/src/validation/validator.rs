use super::ValidationFailure;
use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;

/// 校验器开销分级，决定是否参与校验结果缓存
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationCost {
    /// 纯内存规则，每次重新执行
    #[default]
    Cheap,
    /// 涉及外部调用，结果可在 TTL 内复用
    Expensive,
}

/// 请求校验器
///
/// 返回空列表表示通过；`Err` 仅用于非预期故障（例如外部依赖不可用），
/// 不会被当作校验失败吞掉。
#[async_trait]
pub trait Validator<R>: Send + Sync
where
    R: Request,
{
    /// 稳定名称，参与校验结果缓存键
    fn name(&self) -> &str;

    fn cost(&self) -> ValidationCost {
        ValidationCost::Cheap
    }

    async fn validate(&self, ctx: &AppContext, request: &R)
    -> Result<Vec<ValidationFailure>, AppError>;
}
