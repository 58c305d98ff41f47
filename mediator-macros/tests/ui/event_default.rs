use mediator_domain::domain_event::DomainEvent;
use mediator_macros::domain_event;
use serde::{Deserialize, Serialize};

// 已有的 derive 与宏默认派生合并，不会重复
#[domain_event(version = 3)]
#[derive(Debug, Clone, Serialize, Deserialize)]
enum UserEvent {
    Registered { email: String },
    Renamed(String),
    Deactivated,
}

fn main() {
    let registered = UserEvent::Registered {
        email: "a@b.c".to_string(),
    };
    assert_eq!(registered.event_type(), "UserEvent.Registered");
    assert_eq!(registered.event_version(), 3);
    assert_eq!(
        UserEvent::Renamed("x".to_string()).event_type(),
        "UserEvent.Renamed"
    );
    assert_eq!(UserEvent::Deactivated.event_type(), "UserEvent.Deactivated");
    assert_eq!(UserEvent::Deactivated, UserEvent::Deactivated);
}
