use super::{Behavior, Next};
use crate::{context::AppContext, error::AppError, error::ErrorKind, request::Request};
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// 日志行为（最外层）
///
/// 记录请求接收、成功与失败及耗时：
/// - 非预期错误按 error 级别记录；
/// - 校验失败、未找到等可恢复错误仅 debug 记录，不视为系统故障。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

impl LoggingBehavior {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<R> Behavior<R> for LoggingBehavior
where
    R: Request,
{
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(
        &self,
        ctx: &AppContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, AppError> {
        let start = Instant::now();
        debug!(
            request = R::NAME,
            correlation_id = ctx.correlation_id.as_deref(),
            actor_id = ctx.actor_id.as_deref(),
            "request received"
        );

        let result = next.run(ctx, request).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(request = R::NAME, duration_ms, "request succeeded"),
            Err(err) if err.kind() == ErrorKind::Unexpected => error!(
                request = R::NAME,
                correlation_id = ctx.correlation_id.as_deref(),
                duration_ms,
                error = %err,
                "request failed"
            ),
            Err(err) => debug!(
                request = R::NAME,
                kind = ?err.kind(),
                duration_ms,
                error = %err,
                "request rejected"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{CountingHandler, Echo};
    use super::*;

    #[tokio::test]
    async fn passes_response_and_errors_through() {
        let handler = CountingHandler::default();
        let ctx = AppContext::default();

        let ok = LoggingBehavior
            .handle(&ctx, Echo { value: "a".into() }, Next::new(&[], &handler))
            .await
            .unwrap();
        assert_eq!(ok, "A");

        let err = LoggingBehavior
            .handle(&ctx, Echo { value: "fail".into() }, Next::new(&[], &handler))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Infra(_)));
        assert_eq!(handler.calls(), 2);
    }
}
