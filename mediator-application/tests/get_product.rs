use async_trait::async_trait;
use mediator_application::cache::key::derive_cache_key;
use mediator_application::cache::{CacheStore, CacheStoreExt, InMemoryCacheStore};
use mediator_application::config::PipelineConfig;
use mediator_application::context::AppContext;
use mediator_application::error::AppError;
use mediator_application::handler::RequestHandler;
use mediator_application::validation::{RuleValidator, Validator};
use mediator_application::{Dispatcher, Pipeline, RequestBus};
use mediator_macros::query;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct ProductDto {
    id: u64,
    name: String,
    price_cents: u64,
}

#[query(response = Option<ProductDto>, cacheable)]
struct GetProductQuery {
    product_id: u64,
}

#[derive(Default)]
struct GetProductHandler {
    calls: AtomicUsize,
}

#[async_trait]
impl RequestHandler<GetProductQuery> for GetProductHandler {
    async fn handle(
        &self,
        _ctx: &AppContext,
        q: GetProductQuery,
    ) -> Result<Option<ProductDto>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(ProductDto {
            id: q.product_id,
            name: format!("Product {}", q.product_id),
            price_cents: 1999,
        }))
    }
}

fn setup(config: PipelineConfig) -> (Dispatcher, Arc<GetProductHandler>, Arc<InMemoryCacheStore>) {
    let handler = Arc::new(GetProductHandler::default());
    let store = Arc::new(InMemoryCacheStore::new());
    let positive = RuleValidator::new("ProductIdRules").rule(
        "ProductId",
        |q: &GetProductQuery| q.product_id > 0,
        "ProductId must be positive.",
    );

    let dispatcher = Dispatcher::new();
    dispatcher
        .register(
            Pipeline::<GetProductQuery>::builder(handler.clone())
                .config(config)
                .validator(Arc::new(positive) as Arc<dyn Validator<GetProductQuery>>)
                .caching(store.clone())
                .build(),
        )
        .unwrap();
    (dispatcher, handler, store)
}

#[tokio::test]
async fn second_call_is_served_from_cache() {
    let (dispatcher, handler, store) = setup(PipelineConfig::default());
    let ctx = AppContext::default();

    let first = dispatcher
        .send(&ctx, GetProductQuery { product_id: 42 })
        .await
        .unwrap();
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    let key = derive_cache_key(&GetProductQuery { product_id: 42 }).unwrap();
    assert!(key.starts_with("GetProductQuery_"));
    assert!(store.exists(&key).await.unwrap());
    let cached: Option<ProductDto> = store.get_json(&key).await.unwrap();
    assert_eq!(cached, first);

    let second = dispatcher
        .send(&ctx, GetProductQuery { product_id: 42 })
        .await
        .unwrap();
    let third = dispatcher
        .send(&ctx, GetProductQuery { product_id: 42 })
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    dispatcher
        .send(&ctx, GetProductQuery { product_id: 7 })
        .await
        .unwrap();
    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn validation_failure_skips_handler_and_cache() {
    let (dispatcher, handler, store) = setup(PipelineConfig::default());

    let err = dispatcher
        .send(&AppContext::default(), GetProductQuery { product_id: 0 })
        .await
        .unwrap_err();

    assert!(err.validation_errors().is_some());
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_default_ttl() {
    let config = PipelineConfig::builder()
        .default_cache_ttl(Duration::from_secs(60))
        .build();
    let (dispatcher, handler, _store) = setup(config);
    let ctx = AppContext::default();

    dispatcher
        .send(&ctx, GetProductQuery { product_id: 1 })
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    dispatcher
        .send(&ctx, GetProductQuery { product_id: 1 })
        .await
        .unwrap();

    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidating_by_pattern_forces_refresh() {
    let (dispatcher, handler, store) = setup(PipelineConfig::default());
    let ctx = AppContext::default();

    dispatcher
        .send(&ctx, GetProductQuery { product_id: 5 })
        .await
        .unwrap();
    assert_eq!(store.remove_by_pattern("GetProductQuery_*").await.unwrap(), 1);
    dispatcher
        .send(&ctx, GetProductQuery { product_id: 5 })
        .await
        .unwrap();

    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}
