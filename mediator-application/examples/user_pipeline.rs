//! 端到端示例：注册用户（命令 + 校验 + 工作单元 + 领域事件）与按 ID 查询用户（查询缓存）
//!
//! 运行：`RUST_LOG=debug cargo run -p mediator-application --example user_pipeline`
use async_trait::async_trait;
use mediator_application::cache::{CacheStore, InMemoryCacheStore};
use mediator_application::config::{PipelineConfig, ValidationStrategy};
use mediator_application::context::AppContext;
use mediator_application::error::AppError;
use mediator_application::handler::RequestHandler;
use mediator_application::validation::{
    RuleValidator, ValidationCost, ValidationFailure, Validator, rules,
};
use mediator_application::{Dispatcher, Pipeline, RequestBus};
use mediator_domain::entity::Entity;
use mediator_domain::eventing::{EventHandler, HandledEventType, InProcessEventBus};
use mediator_domain::persist::{
    EntityStore, InMemoryEntityStore, SerializedEvent, UnitOfWork, UnitOfWorkFactory,
};
use mediator_macros::{command, domain_event, entity, query};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[domain_event]
enum UserEvent {
    #[event(event_type = "UserCreated")]
    Created { user_id: u64, email: String },
}

#[entity(id = u64, event = UserEvent, name = "user")]
struct User {
    name: String,
    email: String,
}

#[command(response = u64)]
struct CreateUserCommand {
    name: String,
    email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct UserDto {
    id: u64,
    name: String,
    email: String,
}

#[query(response = Option<UserDto>, cacheable)]
struct GetUserQuery {
    user_id: u64,
}

struct CreateUserHandler {
    uow: UnitOfWorkFactory,
}

#[async_trait]
impl RequestHandler<CreateUserCommand> for CreateUserHandler {
    async fn handle(&self, _ctx: &AppContext, cmd: CreateUserCommand) -> Result<u64, AppError> {
        let mut uow = self.uow.create();
        uow.begin_transaction().await?;

        let id = uow.repository::<User>().next_id().await?;
        let mut user = User {
            id,
            name: cmd.name,
            email: cmd.email.clone(),
            events: Default::default(),
        };
        user.record_event(UserEvent::Created {
            user_id: id,
            email: cmd.email,
        });
        uow.repository::<User>().add(user)?;

        uow.commit_transaction().await?;
        Ok(id)
    }
}

struct GetUserHandler {
    uow: UnitOfWorkFactory,
}

#[async_trait]
impl RequestHandler<GetUserQuery> for GetUserHandler {
    async fn handle(&self, _ctx: &AppContext, q: GetUserQuery) -> Result<Option<UserDto>, AppError> {
        let mut uow = self.uow.create();
        let user = uow.repository::<User>().find(&q.user_id).await?;
        Ok(user.map(|u| UserDto {
            id: *u.id(),
            name: u.name,
            email: u.email,
        }))
    }
}

/// 模拟需要访问存储的昂贵校验：邮箱唯一
struct EmailUnique {
    store: Arc<InMemoryEntityStore>,
}

#[async_trait]
impl Validator<CreateUserCommand> for EmailUnique {
    fn name(&self) -> &str {
        "EmailUnique"
    }

    fn cost(&self) -> ValidationCost {
        ValidationCost::Expensive
    }

    async fn validate(
        &self,
        _ctx: &AppContext,
        cmd: &CreateUserCommand,
    ) -> Result<Vec<ValidationFailure>, AppError> {
        let taken = self
            .store
            .load("user.email", &cmd.email.to_lowercase())
            .await?
            .is_some();
        Ok(taken
            .then(|| ValidationFailure::new("Email", "Email is already registered."))
            .into_iter()
            .collect())
    }
}

struct WelcomeMailer;

#[async_trait]
impl EventHandler for WelcomeMailer {
    fn handler_name(&self) -> &str {
        "welcome-mailer"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::One("UserCreated".to_string())
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        info!(user = event.entity_id(), "sending welcome mail");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = Arc::new(InMemoryEntityStore::new());
    let bus = Arc::new(InProcessEventBus::with_handlers(vec![Arc::new(WelcomeMailer)]));
    let factory = UnitOfWorkFactory::new(store.clone(), bus);
    let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());

    let config = PipelineConfig::builder()
        .slow_request_threshold(Duration::from_millis(200))
        .validation(ValidationStrategy::Cached)
        .build();

    let shape = RuleValidator::new("CreateUserRules")
        .rule(
            "Name",
            |c: &CreateUserCommand| rules::not_blank(&c.name),
            "Name is required.",
        )
        .rule(
            "Email",
            |c: &CreateUserCommand| rules::email(&c.email),
            "Email must be valid.",
        );

    let dispatcher = Dispatcher::new();
    dispatcher.register(
        Pipeline::<CreateUserCommand>::builder(Arc::new(CreateUserHandler {
            uow: factory.clone(),
        }))
        .config(config.clone())
        .validator(Arc::new(shape) as Arc<dyn Validator<CreateUserCommand>>)
        .validator(Arc::new(EmailUnique {
            store: store.clone(),
        }))
        .cached_validation(cache.clone())
        .build(),
    )?;
    dispatcher.register(
        Pipeline::<GetUserQuery>::builder(Arc::new(GetUserHandler { uow: factory }))
            .config(config)
            .caching(cache)
            .build(),
    )?;

    let ctx = AppContext::builder()
        .correlation_id("demo-1".to_string())
        .build();

    let id = dispatcher
        .send(
            &ctx,
            CreateUserCommand {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        )
        .await?;
    info!(id, "user created");

    match dispatcher
        .send(
            &ctx,
            CreateUserCommand {
                name: "".into(),
                email: "not-an-email".into(),
            },
        )
        .await
    {
        Err(AppError::Validation(errors)) => {
            info!(errors = %serde_json::to_string(&errors)?, "rejected")
        }
        other => info!(?other, "unexpected outcome"),
    }

    for _ in 0..2 {
        let user = dispatcher.send(&ctx, GetUserQuery { user_id: id }).await?;
        info!(?user, "user loaded");
    }

    Ok(())
}
