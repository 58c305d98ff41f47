//! 请求行为链（Behavior）
//!
//! 行为是包裹处理器的横切拦截器，按固定顺序嵌套：进入时由外向内执行，
//! 返回时由内向外经过同一条链。每个行为拿到 `Next`，决定是否继续调用下一环；
//! 缓存命中、校验失败等场景下可以不调用 `Next` 而直接返回。
//!
mod cached_validation;
mod caching;
mod logging;
mod performance;
mod validation;

pub use cached_validation::CachedValidationBehavior;
pub use caching::CachingBehavior;
pub use logging::LoggingBehavior;
pub use performance::PerformanceBehavior;
pub use validation::ValidationBehavior;

use crate::{context::AppContext, error::AppError, handler::RequestHandler, request::Request};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

#[async_trait]
pub trait Behavior<R>: Send + Sync
where
    R: Request,
{
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        ctx: &AppContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, AppError>;
}

/// 行为链中剩余的部分：后续行为与末端处理器
pub struct Next<'a, R>
where
    R: Request,
{
    behaviors: &'a [Arc<dyn Behavior<R>>],
    handler: &'a dyn RequestHandler<R>,
}

impl<'a, R> Next<'a, R>
where
    R: Request,
{
    pub(crate) fn new(
        behaviors: &'a [Arc<dyn Behavior<R>>],
        handler: &'a dyn RequestHandler<R>,
    ) -> Self {
        Self { behaviors, handler }
    }

    /// 继续执行链上的下一环
    pub async fn run(self, ctx: &AppContext, request: R) -> Result<R::Response, AppError> {
        match self.behaviors.split_first() {
            Some((head, rest)) => {
                trace!(request = R::NAME, behavior = head.name(), "executing behavior");
                head.handle(ctx, request, Next::new(rest, self.handler))
                    .await
            }
            None => {
                // 处理器只在进入前检查取消，之后由其自行观察 ctx：
                // 提交与事件分发一旦开始就不能被中途丢弃
                ctx.ensure_active()?;
                trace!(request = R::NAME, "invoking handler");
                self.handler.handle(ctx, request).await
            }
        }
    }

    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{context::AppContext, error::AppError, handler::RequestHandler, request::Request};
    use async_trait::async_trait;
    use serde::Serialize;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, Serialize)]
    pub struct Echo {
        pub value: String,
    }

    impl Request for Echo {
        const NAME: &'static str = "Echo";
        type Response = String;
    }

    /// 记录调用次数的处理器
    #[derive(Default)]
    pub struct CountingHandler {
        pub calls: Arc<AtomicUsize>,
    }

    impl CountingHandler {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RequestHandler<Echo> for CountingHandler {
        async fn handle(&self, _ctx: &AppContext, request: Echo) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.value == "fail" {
                return Err(AppError::Infra("handler failed".into()));
            }
            Ok(request.value.to_uppercase())
        }
    }
}
