use super::{Behavior, Next};
use crate::validation::{ValidationErrors, Validator};
use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

/// 校验行为：并发执行全部校验器，合并失败
///
/// 任一失败即返回 `AppError::Validation`（含完整分组），不再调用后续环节。
/// 校验器自身的非预期错误原样向上传播。
pub struct ValidationBehavior<R>
where
    R: Request,
{
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R> ValidationBehavior<R>
where
    R: Request,
{
    pub fn new(validators: Vec<Arc<dyn Validator<R>>>) -> Self {
        Self { validators }
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

#[async_trait]
impl<R> Behavior<R> for ValidationBehavior<R>
where
    R: Request,
{
    fn name(&self) -> &'static str {
        "validation"
    }

    async fn handle(
        &self,
        ctx: &AppContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, AppError> {
        if self.validators.is_empty() {
            return next.run(ctx, request).await;
        }

        let outcomes = ctx
            .cancellable(try_join_all(
                self.validators.iter().map(|v| v.validate(ctx, &request)),
            ))
            .await?;

        let errors = ValidationErrors::from_failures(outcomes.into_iter().flatten());
        if !errors.is_empty() {
            debug!(
                request = R::NAME,
                properties = errors.len(),
                failures = errors.failure_count(),
                "request failed validation"
            );
            return Err(AppError::Validation(errors));
        }

        next.run(ctx, request).await
    }
}
