use mediator_domain::domain_event::DomainEvent;
use mediator_macros::domain_event;

#[domain_event(version = 1)]
enum BankEvent {
    #[event(event_type = "bank.opened")]
    Opened { name: String },
    #[event(event_type = "bank.renamed", event_version = 2)]
    Renamed { to: String },
}

fn main() {
    let opened = BankEvent::Opened {
        name: "n".to_string(),
    };
    assert_eq!(opened.event_type(), "bank.opened");
    assert_eq!(opened.event_version(), 1);

    let renamed = BankEvent::Renamed {
        to: "m".to_string(),
    };
    assert_eq!(renamed.event_type(), "bank.renamed");
    assert_eq!(renamed.event_version(), 2);
}
