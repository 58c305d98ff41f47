use super::{Behavior, Next};
use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{trace, warn};

/// 性能行为：统计 `next` 的耗时，超过阈值时告警
///
/// 不改变控制流与响应，错误原样透传。
#[derive(Debug)]
pub struct PerformanceBehavior {
    threshold: Duration,
    slow_requests: AtomicU64,
}

impl PerformanceBehavior {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            slow_requests: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// 自创建以来超过阈值的请求数
    pub fn slow_request_count(&self) -> u64 {
        self.slow_requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<R> Behavior<R> for PerformanceBehavior
where
    R: Request,
{
    fn name(&self) -> &'static str {
        "performance"
    }

    async fn handle(
        &self,
        ctx: &AppContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, AppError> {
        let start = Instant::now();
        let result = next.run(ctx, request).await;
        let elapsed = start.elapsed();

        if elapsed > self.threshold {
            self.slow_requests.fetch_add(1, Ordering::Relaxed);
            warn!(
                request = R::NAME,
                correlation_id = ctx.correlation_id.as_deref(),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.threshold.as_millis() as u64,
                succeeded = result.is_ok(),
                "slow request"
            );
        } else {
            trace!(request = R::NAME, elapsed_ms = elapsed.as_millis() as u64, "request timed");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RequestHandler;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sleep {
        millis: u64,
        fail: bool,
    }

    impl crate::request::Request for Sleep {
        const NAME: &'static str = "Sleep";
        type Response = u64;
    }

    struct SleepHandler;

    #[async_trait]
    impl RequestHandler<Sleep> for SleepHandler {
        async fn handle(&self, _ctx: &AppContext, req: Sleep) -> Result<u64, AppError> {
            tokio::time::sleep(Duration::from_millis(req.millis)).await;
            if req.fail {
                return Err(AppError::Conflict("late".into()));
            }
            Ok(req.millis)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn flags_only_requests_over_threshold() {
        let perf = PerformanceBehavior::new(Duration::from_millis(500));
        let ctx = AppContext::default();

        let fast = perf
            .handle(
                &ctx,
                Sleep {
                    millis: 100,
                    fail: false,
                },
                Next::new(&[], &SleepHandler),
            )
            .await
            .unwrap();
        assert_eq!(fast, 100);
        assert_eq!(perf.slow_request_count(), 0);

        let slow = perf
            .handle(
                &ctx,
                Sleep {
                    millis: 600,
                    fail: false,
                },
                Next::new(&[], &SleepHandler),
            )
            .await
            .unwrap();
        assert_eq!(slow, 600);
        assert_eq!(perf.slow_request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_errors_unchanged() {
        let perf = PerformanceBehavior::new(Duration::from_millis(500));
        let err = perf
            .handle(
                &AppContext::default(),
                Sleep {
                    millis: 700,
                    fail: true,
                },
                Next::new(&[], &SleepHandler),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(perf.slow_request_count(), 1);
    }
}
