use mediator_application::query::CacheableQuery;
use mediator_application::request::Request;
use mediator_macros::{command, query};

#[command(response = u64)]
struct CreateUserCommand {
    email: String,
}

#[query(response = Option<String>, name = "product.get", cacheable)]
struct GetProductQuery {
    product_id: String,
}

#[query(response = Vec<String>)]
struct ListProductsQuery;

fn assert_cacheable<Q: CacheableQuery>(q: &Q) -> Option<String> {
    q.cache_key()
}

fn main() {
    let cmd = CreateUserCommand {
        email: "a@b.c".to_string(),
    };
    assert_eq!(CreateUserCommand::NAME, "CreateUserCommand");
    assert_eq!(cmd.clone().email, "a@b.c");

    let q = GetProductQuery {
        product_id: "p-1".to_string(),
    };
    assert_eq!(GetProductQuery::NAME, "product.get");
    assert!(assert_cacheable(&q).is_none());
    assert_eq!(q.product_id, "p-1");

    assert_eq!(ListProductsQuery::NAME, "ListProductsQuery");
    let _: <ListProductsQuery as Request>::Response = Vec::new();
}
