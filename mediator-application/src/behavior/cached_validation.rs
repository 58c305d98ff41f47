use super::{Behavior, Next};
use crate::cache::key::derive_cache_key;
use crate::validation::{
    ValidationCost, ValidationErrors, ValidationFailure, ValidationResultCache, Validator,
};
use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// 带结果缓存的校验行为，与 `ValidationBehavior` 占用同一槽位
///
/// 对昂贵校验器按 `(请求内容哈希, 校验器名)` 复用 TTL 内的结果；
/// 廉价校验器每次重新执行。缓存读写故障只告警，退化为直接校验。
pub struct CachedValidationBehavior<R>
where
    R: Request,
{
    validators: Vec<Arc<dyn Validator<R>>>,
    cache: Arc<ValidationResultCache>,
}

impl<R> CachedValidationBehavior<R>
where
    R: Request,
{
    pub fn new(validators: Vec<Arc<dyn Validator<R>>>, cache: Arc<ValidationResultCache>) -> Self {
        Self { validators, cache }
    }

    async fn run_one(
        &self,
        ctx: &AppContext,
        validator: &dyn Validator<R>,
        request: &R,
        request_key: &str,
    ) -> Result<Vec<ValidationFailure>, AppError> {
        if validator.cost() == ValidationCost::Cheap {
            return validator.validate(ctx, request).await;
        }

        match self.cache.get(request_key, validator.name()).await {
            Ok(Some(failures)) => {
                debug!(
                    request = R::NAME,
                    validator = validator.name(),
                    "validation cache hit"
                );
                return Ok(failures);
            }
            Ok(None) => debug!(
                request = R::NAME,
                validator = validator.name(),
                "validation cache miss"
            ),
            Err(err) => warn!(
                request = R::NAME,
                validator = validator.name(),
                error = %err,
                "validation cache read failed"
            ),
        }

        let failures = validator.validate(ctx, request).await?;
        if let Err(err) = self.cache.put(request_key, validator.name(), &failures).await {
            warn!(
                request = R::NAME,
                validator = validator.name(),
                error = %err,
                "validation cache write failed"
            );
        }
        Ok(failures)
    }
}

#[async_trait]
impl<R> Behavior<R> for CachedValidationBehavior<R>
where
    R: Request,
{
    fn name(&self) -> &'static str {
        "cached_validation"
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

        let request_key = derive_cache_key(&request)?;
        let outcomes = ctx
            .cancellable(try_join_all(self.validators.iter().map(|v| {
                self.run_one(ctx, v.as_ref(), &request, &request_key)
            })))
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

#[cfg(test)]
mod tests {
    use super::super::test_support::{CountingHandler, Echo};
    use super::*;
    use crate::cache::InMemoryCacheStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counted {
        name: &'static str,
        cost: ValidationCost,
        runs: AtomicUsize,
        reject: bool,
    }

    impl Counted {
        fn new(name: &'static str, cost: ValidationCost, reject: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                cost,
                runs: AtomicUsize::new(0),
                reject,
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Validator<Echo> for Counted {
        fn name(&self) -> &str {
            self.name
        }

        fn cost(&self) -> ValidationCost {
            self.cost
        }

        async fn validate(
            &self,
            _ctx: &AppContext,
            _request: &Echo,
        ) -> Result<Vec<ValidationFailure>, AppError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Ok(vec![ValidationFailure::new("Value", "Value is taken.")]);
            }
            Ok(vec![])
        }
    }

    fn cache(ttl: Duration) -> Arc<ValidationResultCache> {
        Arc::new(ValidationResultCache::new(
            Arc::new(InMemoryCacheStore::new()),
            ttl,
        ))
    }

    fn echo(value: &str) -> Echo {
        Echo {
            value: value.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expensive_runs_once_within_ttl_cheap_every_time() {
        let expensive = Counted::new("Unique", ValidationCost::Expensive, false);
        let cheap = Counted::new("Shape", ValidationCost::Cheap, false);
        let behavior = CachedValidationBehavior::new(
            vec![
                expensive.clone() as Arc<dyn Validator<Echo>>,
                cheap.clone() as Arc<dyn Validator<Echo>>,
            ],
            cache(Duration::from_secs(300)),
        );
        let handler = CountingHandler::default();
        let ctx = AppContext::default();

        for _ in 0..2 {
            behavior
                .handle(&ctx, echo("same"), Next::new(&[], &handler))
                .await
                .unwrap();
        }
        assert_eq!(expensive.runs(), 1);
        assert_eq!(cheap.runs(), 2);
        assert_eq!(handler.calls(), 2);

        // 内容不同的请求使用不同的键
        behavior
            .handle(&ctx, echo("other"), Next::new(&[], &handler))
            .await
            .unwrap();
        assert_eq!(expensive.runs(), 2);

        tokio::time::advance(Duration::from_secs(301)).await;
        behavior
            .handle(&ctx, echo("same"), Next::new(&[], &handler))
            .await
            .unwrap();
        assert_eq!(expensive.runs(), 3);
    }

    #[tokio::test]
    async fn cached_failures_still_short_circuit() {
        let expensive = Counted::new("Unique", ValidationCost::Expensive, true);
        let behavior = CachedValidationBehavior::new(
            vec![expensive.clone() as Arc<dyn Validator<Echo>>],
            cache(Duration::from_secs(300)),
        );
        let handler = CountingHandler::default();
        let ctx = AppContext::default();

        for _ in 0..2 {
            let err = behavior
                .handle(&ctx, echo("dup"), Next::new(&[], &handler))
                .await
                .unwrap_err();
            assert_eq!(
                err.validation_errors().unwrap().get("Value").unwrap(),
                ["Value is taken."]
            );
        }
        assert_eq!(expensive.runs(), 1);
        assert_eq!(handler.calls(), 0);
    }

    struct RemoteLookup;

    #[async_trait]
    impl Validator<Echo> for RemoteLookup {
        fn name(&self) -> &str {
            "RemoteLookup"
        }

        fn cost(&self) -> ValidationCost {
            ValidationCost::Expensive
        }

        async fn validate(
            &self,
            _ctx: &AppContext,
            _request: &Echo,
        ) -> Result<Vec<ValidationFailure>, AppError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_validation_caches_nothing() {
        let store = Arc::new(InMemoryCacheStore::new());
        let behavior = CachedValidationBehavior::new(
            vec![Arc::new(RemoteLookup) as Arc<dyn Validator<Echo>>],
            Arc::new(ValidationResultCache::new(
                store.clone(),
                Duration::from_secs(300),
            )),
        );
        let handler = CountingHandler::default();
        let ctx = AppContext::default();
        let token = ctx.cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = behavior
            .handle(&ctx, echo("x"), Next::new(&[], &handler))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(handler.calls(), 0);
        assert!(store.is_empty());
    }
}
