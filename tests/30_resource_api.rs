mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::json;

use backoffice_api::database::{MemoryStore, PageWindow, Payload, Predicate, Record, ResourceStore, StoreError};
use backoffice_api::resources::Product;

/// Memory store that counts every call made to it
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore<Product>,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceStore<Product> for CountingStore {
    async fn fetch(&self, predicate: &Predicate, window: &PageWindow) -> Result<Vec<Record>, StoreError> {
        self.tick();
        self.inner.fetch(predicate, window).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.tick();
        self.inner.count(predicate).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Record>, StoreError> {
        self.tick();
        self.inner.get_by_id(id).await
    }

    async fn insert(&self, payload: &Payload) -> Result<Record, StoreError> {
        self.tick();
        self.inner.insert(payload).await
    }

    async fn update_by_id(&self, id: i64, payload: &Payload) -> Result<Option<Record>, StoreError> {
        self.tick();
        self.inner.update_by_id(id, payload).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        self.tick();
        self.inner.delete_by_id(id).await
    }
}

async fn seed_products(app: &axum::Router, count: usize) -> Result<()> {
    let admin = common::admin_token();
    for i in 0..count {
        let res = common::send(
            app,
            Method::POST,
            "/api/products",
            Some(&admin),
            Some(json!({ "name": format!("Product {i}"), "category": if i % 2 == 0 { "even" } else { "odd" } })),
        )
        .await?;
        assert_eq!(res.status, StatusCode::CREATED);
    }
    Ok(())
}

#[tokio::test]
async fn second_page_of_twenty_five() -> Result<()> {
    let (app, _) = common::app()?;
    seed_products(&app, 25).await?;

    let res = common::send(&app, Method::GET, "/api/products?page=2&limit=10", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["pagination"], json!({ "page": 2, "limit": 10, "total": 25, "pages": 3 }));
    assert_eq!(res.body["data"].as_array().unwrap().len(), 10);
    Ok(())
}

#[tokio::test]
async fn out_of_range_paging_is_clamped() -> Result<()> {
    let (app, _) = common::app()?;
    seed_products(&app, 3).await?;

    let res = common::send(&app, Method::GET, "/api/products?page=0&limit=500", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["pagination"], json!({ "page": 1, "limit": 100, "total": 3, "pages": 1 }));
    Ok(())
}

#[tokio::test]
async fn filters_and_search_narrow_the_total() -> Result<()> {
    let (app, _) = common::app()?;
    seed_products(&app, 6).await?;

    let filtered = common::send(&app, Method::GET, "/api/products?category=odd", None, None).await?;
    assert_eq!(filtered.body["pagination"]["total"], json!(3));

    let searched = common::send(&app, Method::GET, "/api/products?search=product%205", None, None).await?;
    assert_eq!(searched.body["pagination"]["total"], json!(1));
    assert_eq!(searched.body["data"][0]["name"], json!("Product 5"));

    let bad = common::send(&app, Method::GET, "/api/products?bad%20field=1", None, None).await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn create_then_get() -> Result<()> {
    let (app, _) = common::app()?;
    let admin = common::admin_token();

    let created = common::send(&app, Method::POST, "/api/products", Some(&admin), Some(json!({ "name": "Widget" }))).await?;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_i64().unwrap();
    assert!(created.body["data"]["created_at"].is_string());

    let fetched = common::send(&app, Method::GET, &format!("/api/products/{id}"), None, None).await?;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["name"], json!("Widget"));
    assert_eq!(fetched.body["data"]["created_at"], created.body["data"]["created_at"]);
    Ok(())
}

#[tokio::test]
async fn invalid_payload_lists_field_errors() -> Result<()> {
    let (app, _) = common::app()?;
    let admin = common::admin_token();

    let res = common::send(&app, Method::POST, "/api/products", Some(&admin), Some(json!({ "id": 5, "price": "free" }))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["details"]["id"].is_string());
    assert!(res.body["details"]["name"].is_string());
    assert!(res.body["details"]["price"].is_string());
    Ok(())
}

#[tokio::test]
async fn non_numeric_id_never_reaches_the_store() -> Result<()> {
    let ctx = common::context()?;
    let store = Arc::new(CountingStore::default());
    let app = common::resource_app::<Product>(store.clone(), ctx);
    let admin = common::admin_token();

    let get = common::send(&app, Method::GET, "/api/products/abc", None, None).await?;
    assert_eq!(get.status, StatusCode::BAD_REQUEST);
    assert_eq!(get.body["success"], json!(false));

    let update = common::send(&app, Method::PUT, "/api/products/abc", Some(&admin), Some(json!({ "name": "x" }))).await?;
    assert_eq!(update.status, StatusCode::BAD_REQUEST);

    let delete = common::send(&app, Method::DELETE, "/api/products/abc", Some(&admin), None).await?;
    assert_eq!(delete.status, StatusCode::BAD_REQUEST);

    assert_eq!(store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_ids_stay_not_found() -> Result<()> {
    let (app, _) = common::app()?;
    let admin = common::admin_token();

    for _ in 0..2 {
        let update = common::send(&app, Method::PATCH, "/api/products/404", Some(&admin), Some(json!({ "name": "x" }))).await?;
        assert_eq!(update.status, StatusCode::NOT_FOUND);
        assert_eq!(update.body["success"], json!(false));

        let delete = common::send(&app, Method::DELETE, "/api/products/404", Some(&admin), None).await?;
        assert_eq!(delete.status, StatusCode::NOT_FOUND);
    }
    Ok(())
}

#[tokio::test]
async fn delete_returns_confirmation() -> Result<()> {
    let (app, _) = common::app()?;
    let admin = common::admin_token();
    seed_products(&app, 1).await?;

    let res = common::send(&app, Method::DELETE, "/api/products/1", Some(&admin), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["id"], json!(1));
    assert!(res.body["data"]["message"].is_string());
    assert!(res.body["data"].get("name").is_none());

    let gone = common::send(&app, Method::GET, "/api/products/1", None, None).await?;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn concurrent_updates_both_succeed() -> Result<()> {
    let (app, _) = common::app()?;
    let admin = common::admin_token();
    seed_products(&app, 1).await?;

    let (first, second) = tokio::join!(
        common::send(&app, Method::PUT, "/api/products/1", Some(&admin), Some(json!({ "name": "First" }))),
        common::send(&app, Method::PUT, "/api/products/1", Some(&admin), Some(json!({ "name": "Second" }))),
    );
    assert_eq!(first?.status, StatusCode::OK);
    assert_eq!(second?.status, StatusCode::OK);

    let stored = common::send(&app, Method::GET, "/api/products/1", None, None).await?;
    let name = stored.body["data"]["name"].as_str().unwrap();
    assert!(name == "First" || name == "Second");
    Ok(())
}
