use async_trait::async_trait;
use mediator_application::context::AppContext;
use mediator_application::error::{AppError, ErrorKind};
use mediator_application::handler::RequestHandler;
use mediator_application::validation::{RuleValidator, Validator, rules};
use mediator_application::{Dispatcher, Pipeline, RequestBus};
use mediator_domain::entity::Entity;
use mediator_domain::eventing::{EventHandler, HandledEventType, InProcessEventBus};
use mediator_domain::persist::{
    InMemoryEntityStore, SerializedEvent, UnitOfWork, UnitOfWorkFactory,
};
use mediator_macros::{command, domain_event, entity};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[domain_event]
enum UserEvent {
    #[event(event_type = "UserCreated")]
    Created {
        user_id: u64,
        name: String,
        email: String,
    },
}

#[entity(id = u64, event = UserEvent, name = "user")]
struct User {
    name: String,
    email: String,
}

impl User {
    fn register(id: u64, name: String, email: String) -> Self {
        let mut user = User {
            id,
            name: name.clone(),
            email: email.clone(),
            events: Default::default(),
        };
        user.record_event(UserEvent::Created {
            user_id: id,
            name,
            email,
        });
        user
    }
}

#[command(response = u64)]
struct CreateUserCommand {
    name: String,
    email: String,
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
        uow.repository::<User>()
            .add(User::register(id, cmd.name, cmd.email))?;

        uow.commit_transaction().await?;
        Ok(id)
    }
}

#[derive(Default)]
struct Published {
    events: Mutex<Vec<SerializedEvent>>,
}

struct Recorder(Arc<Published>);

#[async_trait]
impl EventHandler for Recorder {
    fn handler_name(&self) -> &str {
        "recorder"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        self.0.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct App {
    dispatcher: Dispatcher,
    store: InMemoryEntityStore,
    published: Arc<Published>,
}

/// 分发前先等待一段时间，模拟较慢的下游
struct SlowRecorder(Arc<Published>);

#[async_trait]
impl EventHandler for SlowRecorder {
    fn handler_name(&self) -> &str {
        "slow-recorder"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.0.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn app() -> App {
    app_with(|published| Arc::new(Recorder(published)) as Arc<dyn EventHandler>)
}

fn app_with(recorder: impl FnOnce(Arc<Published>) -> Arc<dyn EventHandler>) -> App {
    let store = InMemoryEntityStore::new();
    let published = Arc::new(Published::default());
    let bus = InProcessEventBus::with_handlers(vec![recorder(published.clone())]);
    let factory = UnitOfWorkFactory::new(Arc::new(store.clone()), Arc::new(bus));

    let create_rules = RuleValidator::new("CreateUserRules")
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
    dispatcher
        .register(
            Pipeline::<CreateUserCommand>::builder(Arc::new(CreateUserHandler { uow: factory }))
                .validator(Arc::new(create_rules) as Arc<dyn Validator<CreateUserCommand>>)
                .build(),
        )
        .unwrap();

    App {
        dispatcher,
        store,
        published,
    }
}

#[tokio::test]
async fn valid_command_creates_user_and_dispatches_one_event() {
    let app = app();
    let ctx = AppContext::builder()
        .correlation_id("cor-1".to_string())
        .build();

    let id = app
        .dispatcher
        .send(
            &ctx,
            CreateUserCommand {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(id, 1);
    assert_eq!(app.store.count("user").await, 1);

    let events = app.published.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type(), "UserCreated");
    assert_eq!(events[0].entity_type(), "user");
    assert_eq!(events[0].entity_id(), "1");
    match events[0].decode::<UserEvent>().unwrap() {
        UserEvent::Created { user_id, email, .. } => {
            assert_eq!(user_id, 1);
            assert_eq!(email, "ada@example.com");
        }
    }
}

#[tokio::test]
async fn second_user_gets_next_id() {
    let app = app();
    let ctx = AppContext::default();
    for (name, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
        app.dispatcher
            .send(
                &ctx,
                CreateUserCommand {
                    name: name.into(),
                    email: email.into(),
                },
            )
            .await
            .unwrap();
    }

    assert_eq!(app.store.count("user").await, 2);
    assert_eq!(app.published.events.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_command_reports_grouped_failures_without_persisting() {
    let app = app();

    let err = app
        .dispatcher
        .send(
            &AppContext::default(),
            CreateUserCommand {
                name: "".into(),
                email: "not-an-email".into(),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        serde_json::to_value(err.validation_errors().unwrap()).unwrap(),
        serde_json::json!({
            "Name": ["Name is required."],
            "Email": ["Email must be valid."],
        })
    );
    assert_eq!(app.store.count("user").await, 0);
    assert!(app.published.events.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_commit_still_dispatches_the_event() {
    let app = app_with(|published| Arc::new(SlowRecorder(published)) as Arc<dyn EventHandler>);
    let ctx = AppContext::default();
    let token = ctx.cancellation.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    let id = app
        .dispatcher
        .send(
            &ctx,
            CreateUserCommand {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        )
        .await
        .unwrap();

    assert!(ctx.is_cancelled());
    assert_eq!(id, 1);
    assert_eq!(app.store.count("user").await, 1);
    assert_eq!(app.published.events.lock().unwrap().len(), 1);
}
