//! 请求管道：固定顺序的行为链 + 末端处理器
//!
//! 槽位顺序（外 → 内）：
//! 1. `LoggingBehavior`
//! 2. `PerformanceBehavior`
//! 3. `ValidationBehavior` 或 `CachedValidationBehavior`（由 `ValidationStrategy` 决定）
//! 4. `CachingBehavior`（仅 `CacheableQuery` 且显式启用）
//! 5. 处理器
//!
//! 校验总在缓存之前执行，因此校验失败既不会调用处理器，也不会写入缓存。
use crate::behavior::{
    Behavior, CachedValidationBehavior, CachingBehavior, LoggingBehavior, Next,
    PerformanceBehavior, ValidationBehavior,
};
use crate::cache::{CacheStore, InMemoryCacheStore};
use crate::config::{PipelineConfig, ValidationStrategy};
use crate::handler::RequestHandler;
use crate::query::CacheableQuery;
use crate::validation::{ValidationResultCache, Validator};
use crate::{context::AppContext, error::AppError, request::Request};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// 为某一请求类型构建完成的管道
pub struct Pipeline<R>
where
    R: Request,
{
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    handler: Arc<dyn RequestHandler<R>>,
}

impl<R> Pipeline<R>
where
    R: Request,
{
    pub fn builder(handler: Arc<dyn RequestHandler<R>>) -> PipelineBuilder<R> {
        PipelineBuilder::new(handler)
    }

    pub async fn execute(&self, ctx: &AppContext, request: R) -> Result<R::Response, AppError> {
        Next::new(&self.behaviors, self.handler.as_ref())
            .run(ctx, request)
            .await
    }

    /// 行为名称，按执行顺序
    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

type CachingSlot<R> = Box<dyn FnOnce(&PipelineConfig) -> Arc<dyn Behavior<R>> + Send>;

pub struct PipelineBuilder<R>
where
    R: Request,
{
    config: PipelineConfig,
    handler: Arc<dyn RequestHandler<R>>,
    validators: Vec<Arc<dyn Validator<R>>>,
    validation_store: Option<Arc<dyn CacheStore>>,
    caching: Option<CachingSlot<R>>,
    logging: bool,
    performance: Option<Arc<PerformanceBehavior>>,
    measure: bool,
}

impl<R> PipelineBuilder<R>
where
    R: Request,
{
    pub fn new(handler: Arc<dyn RequestHandler<R>>) -> Self {
        Self {
            config: PipelineConfig::default(),
            handler,
            validators: Vec::new(),
            validation_store: None,
            caching: None,
            logging: true,
            performance: None,
            measure: true,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator<R>>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validators(mut self, validators: impl IntoIterator<Item = Arc<dyn Validator<R>>>) -> Self {
        self.validators.extend(validators);
        self
    }

    /// 使用带结果缓存的校验，结果写入 `store`
    pub fn cached_validation(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.config.validation = ValidationStrategy::Cached;
        self.validation_store = Some(store);
        self
    }

    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    pub fn without_performance(mut self) -> Self {
        self.measure = false;
        self
    }

    /// 共享一个性能行为实例，便于外部读取慢请求计数
    pub fn performance(mut self, behavior: Arc<PerformanceBehavior>) -> Self {
        self.measure = true;
        self.performance = Some(behavior);
        self
    }

    pub fn build(self) -> Pipeline<R> {
        let mut behaviors: Vec<Arc<dyn Behavior<R>>> = Vec::new();

        if self.logging {
            behaviors.push(Arc::new(LoggingBehavior));
        }

        if self.measure {
            let perf = self.performance.unwrap_or_else(|| {
                Arc::new(PerformanceBehavior::new(self.config.slow_request_threshold))
            });
            behaviors.push(perf);
        }

        match self.config.validation {
            ValidationStrategy::Direct => {
                behaviors.push(Arc::new(ValidationBehavior::new(self.validators)));
            }
            ValidationStrategy::Cached => {
                let store = self
                    .validation_store
                    .unwrap_or_else(|| Arc::new(InMemoryCacheStore::new()));
                let cache = Arc::new(ValidationResultCache::new(
                    store,
                    self.config.validation_cache_ttl,
                ));
                behaviors.push(Arc::new(CachedValidationBehavior::new(
                    self.validators,
                    cache,
                )));
            }
        }

        if let Some(caching) = self.caching {
            behaviors.push(caching(&self.config));
        }

        Pipeline {
            behaviors,
            handler: self.handler,
        }
    }
}

impl<Q> PipelineBuilder<Q>
where
    Q: CacheableQuery,
    Q::Response: Serialize + DeserializeOwned,
{
    /// 启用查询结果缓存；默认 TTL 取自构建时的配置
    pub fn caching(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.caching = Some(Box::new(move |config: &PipelineConfig| {
            Arc::new(CachingBehavior::<Q>::new(store, config.default_cache_ttl))
                as Arc<dyn Behavior<Q>>
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::test_support::{CountingHandler, Echo};
    use crate::validation::RuleValidator;

    #[test]
    fn default_slots_in_order() {
        let pipeline = Pipeline::<Echo>::builder(Arc::new(CountingHandler::default())).build();
        assert_eq!(
            pipeline.behavior_names(),
            vec!["logging", "performance", "validation"]
        );
    }

    #[test]
    fn cached_strategy_replaces_validation_slot() {
        let cfg = PipelineConfig::builder()
            .validation(ValidationStrategy::Cached)
            .build();
        let pipeline = Pipeline::<Echo>::builder(Arc::new(CountingHandler::default()))
            .config(cfg)
            .without_logging()
            .without_performance()
            .build();
        assert_eq!(pipeline.behavior_names(), vec!["cached_validation"]);
    }

    #[tokio::test]
    async fn execute_runs_validators_then_handler() {
        let handler = Arc::new(CountingHandler::default());
        let pipeline = Pipeline::builder(handler.clone() as Arc<dyn RequestHandler<Echo>>)
            .validator(Arc::new(RuleValidator::new("NoShout").rule(
                "Value",
                |e: &Echo| e.value != "LOUD",
                "Value must be lowercase.",
            )))
            .build();

        let ctx = AppContext::default();
        let ok = pipeline
            .execute(&ctx, Echo { value: "hi".into() })
            .await
            .unwrap();
        assert_eq!(ok, "HI");

        let err = pipeline
            .execute(&ctx, Echo { value: "LOUD".into() })
            .await
            .unwrap_err();
        assert!(err.validation_errors().is_some());
        assert_eq!(handler.calls(), 1);
    }
}
