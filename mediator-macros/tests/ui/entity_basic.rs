use mediator_domain::entity::Entity;
use mediator_macros::{domain_event, entity};

#[domain_event]
enum AccountEvent {
    Opened { owner: String },
}

#[entity(id = u64, event = AccountEvent, name = "account")]
struct Account {
    owner: String,
}

#[entity(event = AccountEvent, debug = false)]
struct Ledger {
    id: String,
    balance: i64,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("id", &self.id).finish()
    }
}

fn main() {
    let mut account = Account {
        id: 7,
        owner: "alice".to_string(),
        events: Default::default(),
    };
    account.record_event(AccountEvent::Opened {
        owner: account.owner.clone(),
    });

    assert_eq!(Account::TYPE, "account");
    assert_eq!(*account.id(), 7);
    assert_eq!(account.events().len(), 1);

    // 事件缓冲不参与序列化
    let json = serde_json::to_value(&account).unwrap();
    assert!(json.get("events").is_none());

    let ledger = Ledger {
        id: "l-1".to_string(),
        balance: 0,
        events: Default::default(),
    };
    assert_eq!(Ledger::TYPE, "Ledger");
    assert_eq!(ledger.balance, 0);
    assert!(format!("{ledger:?}").contains("l-1"));
}
