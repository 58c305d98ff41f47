use proc_macro::TokenStream;

mod domain_event;
mod entity;
mod request;
mod utils;

use request::RequestKind;

/// 实体宏
/// - 追加字段：`id: IdType`（置于最前）与 `events: EventBuffer<Event>`（置于最后）
/// - 自动为目标结构体实现 `::mediator_domain::entity::Entity`
/// - 支持参数：`#[entity(event = EventType, id = IdType, name = "...", debug = false)]`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 领域事件宏
/// 作用于枚举，实现 `::mediator_domain::domain_event::DomainEvent`。
/// - #[domain_event(version = N)] 指定默认版本号（默认 1）
/// - 变体可通过 #[event(event_type = "...", event_version = N)] 覆写事件类型与版本号
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 命令宏：`#[command(response = T, name = "...")]`
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    request::expand(RequestKind::Command, attr, item)
}

/// 查询宏：`#[query(response = T, name = "...", cacheable)]`
///
/// `cacheable` 会生成默认的 `CacheableQuery` 实现；
/// 需要自定义缓存键或 TTL 时省略该标志并手动实现。
#[proc_macro_attribute]
pub fn query(attr: TokenStream, item: TokenStream) -> TokenStream {
    request::expand(RequestKind::Query, attr, item)
}
