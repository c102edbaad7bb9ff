use std::sync::Arc;

use docrest::{memory::InMemoryStore, prelude::*};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

fn items_schema() -> Arc<Schema> {
    Schema::builder("items")
        .field(Field::new("code").required().unique())
        .build()
}

async fn mount(schema: Arc<Schema>, backend: &InMemoryStore) -> CollectionHandler<&InMemoryStore> {
    let handler = CollectionHandler::new(schema, backend);
    handler.init().await.unwrap();
    handler
}

fn post(body: Value) -> HttpRequest {
    HttpRequest::builder(Method::POST).json_content().body(body).build()
}

fn get(query: &[(&str, &str)]) -> HttpRequest {
    query
        .iter()
        .fold(HttpRequest::builder(Method::GET), |builder, (name, value)| {
            builder.query(*name, *value)
        })
        .build()
}

fn body(response: &HttpResponse) -> &Value {
    response.body.as_ref().expect("response has a body")
}

async fn insert<B: StoreBackend>(handler: &CollectionHandler<B>, document: Value) -> String {
    let response = handler.handle(post(document)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    body(&response)["data"][0]["_id"].as_str().unwrap().to_string()
}

fn codes(response: &HttpResponse) -> Vec<&str> {
    body(response)["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|document| document["code"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn insert_then_get_one_round_trip() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let created = items.handle(post(json!({ "code": "abc", "qty": 3 }))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let created = body(&created);
    assert_eq!(created["hasMore"], json!(false));
    assert_eq!(created["totalCount"], json!(1));
    let id = created["data"][0]["_id"].as_str().unwrap();
    assert_eq!(id.len(), 24);

    let fetched = items
        .handle(HttpRequest::builder(Method::GET).param("id", id).build())
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    let fetched = body(&fetched);
    assert_eq!(fetched["_id"], json!(id));
    assert_eq!(fetched["code"], json!("abc"));
    assert_eq!(fetched["qty"], json!(3));
    assert_eq!(fetched["isActive"], json!(true));
    assert!(fetched.get("__v").is_none());
}

#[tokio::test]
async fn insert_many_from_array() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let created = items
        .handle(post(json!([{ "code": "a" }, { "code": "b" }])))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(body(&created)["totalCount"], json!(2));
    assert_eq!(codes(&created), vec!["a", "b"]);
}

#[tokio::test]
async fn insert_without_required_field_is_unprocessable() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let response = items.handle(post(json!({ "qty": 1 }))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(&response)["type"], json!("missing_field"));
    assert!(
        body(&response)["message"]
            .as_str()
            .unwrap()
            .contains("Path `code` is required.")
    );

    let listed = items.handle(get(&[])).await;
    assert_eq!(body(&listed)["totalCount"], json!(0));
}

#[tokio::test]
async fn array_with_incomplete_item_is_unprocessable() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let response = items.handle(post(json!([{ "code": "a" }, {}]))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(&response)["type"], json!("missing_field"));

    let listed = items.handle(get(&[])).await;
    assert_eq!(body(&listed)["totalCount"], json!(0));
}

#[tokio::test]
async fn typed_items_through_the_handler() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Item {
        #[serde(flatten)]
        base: BaseFields,
        code: String,
        qty: i64,
    }

    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let draft = Item { base: BaseFields::default(), code: "abc".into(), qty: 4 };
    let id = insert(&items, draft.to_json().unwrap()).await;

    let fetched = items
        .handle(HttpRequest::builder(Method::GET).param("id", id.as_str()).build())
        .await;
    let item = Item::from_json(body(&fetched).clone()).unwrap();
    assert_eq!(item.base.id.as_deref(), Some(id.as_str()));
    assert!(item.base.is_active);
    assert_eq!(item.code, "abc");
    assert_eq!(item.qty, 4);
}

#[tokio::test]
async fn duplicate_unique_field_conflicts() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    insert(&items, json!({ "code": "abc" })).await;

    let response = items.handle(post(json!({ "code": "abc" }))).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(body(&response)["type"], json!("already_exists"));
}

#[tokio::test]
async fn reusing_an_existing_id_conflicts() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    let id = insert(&items, json!({ "code": "abc" })).await;

    let response = items.handle(post(json!({ "_id": id, "code": "other" }))).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(body(&response)["type"], json!("already_exists"));
}

#[tokio::test]
async fn malformed_writes_are_rejected_before_the_store() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let not_json = HttpRequest::builder(Method::POST)
        .header("content-type", "text/plain")
        .body(json!({ "code": "abc" }))
        .build();
    let empty_object = post(json!({}));
    let empty_array = post(json!([]));
    let no_body = HttpRequest::builder(Method::POST).json_content().build();

    for request in [not_json, empty_object, empty_array, no_body] {
        let response = items.handle(request).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(body(&response), &json!({ "type": "invalid" }));
    }

    let listed = items.handle(get(&[("showInactive", "true")])).await;
    assert_eq!(body(&listed)["totalCount"], json!(0));
}

#[tokio::test]
async fn lists_only_active_documents_by_default() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    insert(&items, json!({ "code": "kept" })).await;
    let id = insert(&items, json!({ "code": "gone" })).await;

    let deactivated = items
        .handle(HttpRequest::builder(Method::DELETE).param("id", id.as_str()).build())
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);

    let active = items.handle(get(&[])).await;
    assert_eq!(codes(&active), vec!["kept"]);

    let all = items.handle(get(&[("showInactive", "true")])).await;
    assert_eq!(body(&all)["totalCount"], json!(2));

    let falsy = items.handle(get(&[("showInactive", "false")])).await;
    assert_eq!(codes(&falsy), vec!["kept"]);

    let inactive = items.handle(get(&[("q", "isActive:false")])).await;
    assert_eq!(codes(&inactive), vec!["gone"]);
}

#[tokio::test]
async fn pagination_reports_has_more() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    insert(&items, json!({ "code": "a" })).await;
    insert(&items, json!({ "code": "b" })).await;

    let first = items
        .handle(get(&[("page", "0"), ("per_page", "1"), ("sort", "code")]))
        .await;
    assert_eq!(body(&first)["hasMore"], json!(true));
    assert_eq!(body(&first)["totalCount"], json!(2));
    assert_eq!(codes(&first), vec!["a"]);

    let second = items
        .handle(get(&[("page", "1"), ("per_page", "1"), ("sort", "code")]))
        .await;
    assert_eq!(body(&second)["hasMore"], json!(false));
    assert_eq!(codes(&second), vec!["b"]);

    let unpaged = items.handle(get(&[("page", "x"), ("per_page", "1")])).await;
    assert_eq!(body(&unpaged)["hasMore"], json!(false));
    assert_eq!(codes(&unpaged).len(), 2);
}

#[tokio::test]
async fn criteria_projection_and_sort() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    insert(&items, json!({ "code": "abc", "qty": 1, "dims": { "w": 2 } })).await;
    insert(&items, json!({ "code": "xabcx", "qty": 2 })).await;
    insert(&items, json!({ "code": "zzz", "qty": 0, "note": null })).await;

    let pattern = items.handle(get(&[("q", "code:ABC"), ("sort", "-code")])).await;
    assert_eq!(codes(&pattern), vec!["xabcx", "abc"]);

    let number = items.handle(get(&[("q", "qty:0")])).await;
    assert_eq!(codes(&number), vec!["zzz"]);

    let nested = items.handle(get(&[("q", "dims.w:2")])).await;
    assert_eq!(codes(&nested), vec!["abc"]);

    let null = items.handle(get(&[("q", "note:null"), ("sort", "code")])).await;
    assert_eq!(codes(&null), vec!["abc", "xabcx", "zzz"]);

    let undefined = items.handle(get(&[("q", "note:undefined"), ("sort", "code")])).await;
    assert_eq!(codes(&undefined), vec!["abc", "xabcx"]);

    let projected = items.handle(get(&[("q", "code:zzz"), ("fields", "code")])).await;
    let document = &body(&projected)["data"][0];
    assert!(document.get("_id").is_some());
    assert_eq!(document["code"], json!("zzz"));
    assert!(document.get("qty").is_none());
}

#[tokio::test]
async fn malformed_queries_never_fail() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    insert(&items, json!({ "code": "abc" })).await;

    for raw in ["invalid", "invalid:", "invalid.path:nothing,invalid.path:nothing", ":,::", "%"] {
        let response = items.handle(get(&[("q", raw)])).await;
        assert_eq!(response.status, StatusCode::OK, "q={raw}");
    }
}

#[tokio::test]
async fn update_one_sets_fields() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    let id = insert(&items, json!({ "code": "abc", "qty": 1 })).await;

    let patch = |id: Option<&str>, body: Value| {
        let builder = HttpRequest::builder(Method::PATCH).json_content().body(body);
        match id {
            Some(id) => builder.param("id", id).build(),
            None => builder.build(),
        }
    };

    let updated = items.handle(patch(Some(id.as_str()), json!({ "qty": 5 }))).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(body(&updated)["qty"], json!(5));
    assert_eq!(body(&updated)["code"], json!("abc"));
    assert_eq!(body(&updated)["_id"], json!(id));

    let missing = items
        .handle(patch(Some("000000000000000000000000"), json!({ "qty": 5 })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(body(&missing), &json!({ "type": "missing" }));

    let no_id = items.handle(patch(None, json!({ "qty": 5 }))).await;
    assert_eq!(no_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(body(&no_id), &json!({ "type": "invalid" }));

    let only_id = items.handle(patch(Some(id.as_str()), json!({ "_id": id }))).await;
    assert_eq!(only_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(body(&only_id), &json!({ "type": "invalid" }));
}

#[tokio::test]
async fn deactivate_one() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    let id = insert(&items, json!({ "code": "abc" })).await;
    let delete = |id: &str| HttpRequest::builder(Method::DELETE).param("id", id).build();

    let response = items.handle(delete(id.as_str())).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(body(&response), &json!({ "deactivated": true, "_id": id }));

    let fetched = items
        .handle(HttpRequest::builder(Method::GET).param("id", id.as_str()).build())
        .await;
    assert_eq!(body(&fetched)["isActive"], json!(false));

    let missing = items.handle(delete("000000000000000000000000")).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.body.is_none());

    let no_id = items.handle(HttpRequest::builder(Method::DELETE).build()).await;
    assert_eq!(no_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(body(&no_id), &json!({ "type": "missing" }));

    let other = insert(&items, json!({ "code": "def" })).await;
    let uppercase = items.handle(delete(other.to_uppercase().as_str())).await;
    assert_eq!(uppercase.status, StatusCode::OK);
    assert_eq!(body(&uppercase), &json!({ "deactivated": true, "_id": other }));
}

#[tokio::test]
async fn get_one_missing_and_malformed_ids() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;
    insert(&items, json!({ "code": "abc" })).await;

    let missing = items
        .handle(
            HttpRequest::builder(Method::GET)
                .param("id", "000000000000000000000000")
                .build(),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body.is_none());

    let malformed = items
        .handle(HttpRequest::builder(Method::GET).param("id", "not-an-id").build())
        .await;
    assert_eq!(malformed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&malformed)["type"], json!(""));
}

#[tokio::test]
async fn unsupported_method() {
    let backend = InMemoryStore::new();
    let items = mount(items_schema(), &backend).await;

    let response = items.handle(HttpRequest::builder(Method::PUT).build()).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body(&response),
        &json!({ "error": { "type": "not_supported", "message": "Method PUT not supported." } })
    );
}

#[tokio::test]
async fn populates_references_recursively() {
    let backend = InMemoryStore::new();
    let parts = Schema::builder("parts").field(Field::new("code").required()).build();
    let kits = Schema::builder("kits")
        .field(Field::new("name").required())
        .field(Field::new("part").reference(&parts))
        .build();
    let bundles = Schema::builder("bundles")
        .field(Field::new("kits").reference(&kits))
        .build();

    let parts_handler = mount(parts, &backend).await;
    let kits_handler = mount(kits, &backend).await;
    let bundles_handler = mount(bundles, &backend).await;

    let part = insert(&parts_handler, json!({ "code": "bolt" })).await;
    let kit = insert(&kits_handler, json!({ "name": "starter", "part": part })).await;
    let bundle = insert(&bundles_handler, json!({ "kits": [kit] })).await;

    let shallow = kits_handler.handle(get(&[("populate", "part")])).await;
    assert_eq!(body(&shallow)["data"][0]["part"]["code"], json!("bolt"));
    assert_eq!(body(&shallow)["data"][0]["part"]["_id"], json!(part));

    let unpopulated = kits_handler.handle(get(&[])).await;
    assert_eq!(body(&unpopulated)["data"][0]["part"], json!(part));

    let deep = bundles_handler
        .handle(
            HttpRequest::builder(Method::GET)
                .param("id", bundle.as_str())
                .query("populate", "kits:part")
                .build(),
        )
        .await;
    assert_eq!(deep.status, StatusCode::OK);
    assert_eq!(body(&deep)["kits"][0]["name"], json!("starter"));
    assert_eq!(body(&deep)["kits"][0]["part"]["code"], json!("bolt"));
}

#[tokio::test]
async fn invalid_reference_is_unprocessable() {
    let backend = InMemoryStore::new();
    let parts = Schema::builder("parts").build();
    let kits = Schema::builder("kits")
        .field(Field::new("part").reference(&parts))
        .build();
    let kits_handler = mount(kits, &backend).await;

    let response = kits_handler.handle(post(json!({ "part": "nope" }))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}
