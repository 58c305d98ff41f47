use crate::error::AppError;
use bon::Builder;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息，例如：
/// - 关联追踪 `correlation_id` 与执行者 `actor_id`，写入日志 span；
/// - 幂等键（`idempotency_key`）：用于在基础设施层实现请求幂等；
/// - 取消信号（`cancellation`）：校验器与缓存调用在取消时被放弃；
///   处理器在进入前检查一次，之后通过 `ctx` 协作式地观察。
///
/// 典型用法：
/// ```rust
/// use mediator_application::context::AppContext;
///
/// let ctx = AppContext::builder()
///     .correlation_id("cor-123".to_string())
///     .actor_id("u-1".to_string())
///     .build();
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Builder, Clone, Debug, Default)]
pub struct AppContext {
    pub correlation_id: Option<String>,
    pub actor_id: Option<String>,
    /// 幂等键（可选）：为空则由上层或基础设施决定是否参与幂等
    pub idempotency_key: Option<String>,
    #[builder(default)]
    pub cancellation: CancellationToken,
}

impl AppContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// 已取消时返回 `AppError::Cancelled`
    pub fn ensure_active(&self) -> Result<(), AppError> {
        if self.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    /// 运行 `fut`，若期间收到取消信号则放弃并返回 `AppError::Cancelled`
    pub async fn cancellable<F, T>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(AppError::Cancelled),
            out = fut => out,
        }
    }

    /// 派生子上下文：共享追踪信息，取消父上下文会级联取消子上下文
    pub fn child(&self) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            actor_id: self.actor_id.clone(),
            idempotency_key: None,
            cancellation: self.cancellation.child_token(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancellable_stops_pending_future() {
        let ctx = AppContext::default();
        let token = ctx.cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let out: Result<(), AppError> = ctx
            .cancellable(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(out, Err(AppError::Cancelled)));
    }

    #[test]
    fn child_follows_parent_cancellation() {
        let parent = AppContext::builder()
            .correlation_id("cor-1".to_string())
            .build();
        let child = parent.child();
        assert_eq!(child.correlation_id.as_deref(), Some("cor-1"));

        parent.cancellation.cancel();
        assert!(child.is_cancelled());
        assert!(matches!(child.ensure_active(), Err(AppError::Cancelled)));
    }
}
