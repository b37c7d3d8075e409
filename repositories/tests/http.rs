use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use categories_core::CategoryRepository;
use categories_core::model::{CategoryId, NewCategory, PatchCategory};
use engine::Pagination;
use engine::error::display_message;
use optional_field::Field;
use ratings_core::RatingRepository;
use ratings_core::model::{RatingId, StoreId};
use repositories::http::ApiClient;
use repositories::http::categories::CategoryRepo;
use repositories::http::ratings::RatingRepo;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::net::TcpListener;

fn category_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "parent_id": null,
        "is_active": true,
        "store_count": 3,
        "created": "2025-01-01T00:00:00Z"
    })
}

fn rating_json(id: u64, store_id: u64, likes: u64) -> Value {
    json!({
        "id": id,
        "store_id": store_id,
        "user_id": "u1",
        "score": 4,
        "text": "fine",
        "created_at": "2025-02-01T12:00:00Z",
        "likes": likes
    })
}

async fn list_categories(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let page = query.get("page").cloned().unwrap_or_default();
    let page_size = query.get("page_size").cloned().unwrap_or_else(|| "none".into());
    Json(json!({
        "data": [category_json(1, &format!("page {page}")), category_json(2, &format!("size {page_size}"))],
        "pagination": { "page": 1, "page_size": 2, "total": 7, "total_pages": 4 }
    }))
}

async fn search_categories(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let q = query.get("q").cloned().unwrap_or_default();
    Json(json!({ "data": [category_json(5, &q)] }))
}

async fn get_category(Path(id): Path<u64>) -> impl IntoResponse {
    if id == 1 {
        (StatusCode::OK, Json(json!({ "data": category_json(1, "Bakery") })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "no such category" })),
        )
    }
}

async fn patch_category(Path(id): Path<u64>, Json(patch): Json<Value>) -> impl IntoResponse {
    if id != 1 {
        return (StatusCode::NOT_FOUND, Json(json!({})));
    }
    let mut category = category_json(1, "Bakery");
    category["description"] = patch["description"].clone();
    (StatusCode::OK, Json(json!({ "data": category })))
}

async fn delete_category(Path(id): Path<u64>) -> impl IntoResponse {
    match id {
        1 => (StatusCode::NO_CONTENT, String::new()),
        2 => (StatusCode::NOT_FOUND, String::new()),
        _ => (
            StatusCode::FORBIDDEN,
            json!({ "error": "categories with stores cannot be deleted" }).to_string(),
        ),
    }
}

async fn create_category(Json(body): Json<Value>) -> impl IntoResponse {
    if body["name"] == "taken" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "category name already exists" })),
        );
    }
    let name = body["name"].as_str().unwrap_or_default().to_owned();
    (StatusCode::CREATED, Json(json!({ "data": category_json(40, &name) })))
}

async fn store_ratings(Path(store_id): Path<u64>) -> Json<Value> {
    Json(json!({ "data": [rating_json(10, store_id, 0), rating_json(11, store_id, 2)] }))
}

async fn like_rating(Path(id): Path<u64>) -> impl IntoResponse {
    if id == 10 {
        (StatusCode::OK, Json(json!({ "data": rating_json(10, 1, 1) })))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "message": "no such rating" })))
    }
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream is down")
}

async fn garbage() -> &'static str {
    "this is not json"
}

async fn serve() -> ApiClient {
    let router = Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/search", get(search_categories))
        .route(
            "/api/categories/{id}",
            get(get_category)
                .patch(patch_category)
                .delete(delete_category),
        )
        .route("/api/ratings", get(unavailable))
        .route("/api/ratings/{id}", get(garbage))
        .route("/api/stores/{store_id}/ratings", get(store_ratings))
        .route("/api/ratings/{id}/like", post(like_rating));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    ApiClient::with_client(client, &format!("http://{addr}/api/")).unwrap()
}

#[tokio::test]
async fn list_reads_envelope_and_sends_paging() {
    let repo = CategoryRepo::new(serve().await);

    let listing = repo.list(Pagination::with_page_size(3, 2)).await.unwrap();

    let names = listing.data.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(vec!["page 3", "size 2"], names);
    assert_eq!(4, listing.pagination.unwrap().total_pages);
}

#[tokio::test]
async fn page_size_is_left_to_the_api_by_default() {
    let repo = CategoryRepo::new(serve().await);

    let listing = repo.list(Pagination::default()).await.unwrap();

    assert_eq!("size none", listing.data[1].name);
}

#[tokio::test]
async fn search_sends_query() {
    let repo = CategoryRepo::new(serve().await);

    let listing = repo
        .search("bread & butter".into(), Pagination::default())
        .await
        .unwrap();

    assert_eq!("bread & butter", listing.data[0].name);
    assert!(listing.pagination.is_none());
}

#[tokio::test]
async fn missing_entity_is_none() {
    let repo = CategoryRepo::new(serve().await);

    assert_eq!("Bakery", repo.get(CategoryId(1)).await.unwrap().unwrap().name);
    assert!(repo.get(CategoryId(2)).await.unwrap().is_none());
    assert!(
        repo.patch(CategoryId(2), PatchCategory::activate(false))
            .await
            .unwrap()
            .is_none()
    );
    assert!(repo.delete(CategoryId(2)).await.unwrap().is_none());
}

#[tokio::test]
async fn patch_sends_cleared_fields_as_null() {
    let repo = CategoryRepo::new(serve().await);

    let patched = repo
        .patch(CategoryId(1), PatchCategory::new(None, Field::Present(None)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(None, patched.description);
}

#[tokio::test]
async fn delete_accepts_empty_success() {
    let repo = CategoryRepo::new(serve().await);

    assert_eq!(Some(()), repo.delete(CategoryId(1)).await.unwrap());
}

#[tokio::test]
async fn error_field_becomes_message() {
    let repo = CategoryRepo::new(serve().await);

    let report = repo.delete(CategoryId(3)).await.unwrap_err();

    assert_eq!("categories with stores cannot be deleted", display_message(&report));
}

#[tokio::test]
async fn message_field_becomes_message() {
    let repo = CategoryRepo::new(serve().await);

    let created = repo.create(NewCategory::new("Florist", None)).await.unwrap();
    assert_eq!(CategoryId(40), created.id);

    let report = repo.create(NewCategory::new("taken", None)).await.unwrap_err();
    assert_eq!("category name already exists", display_message(&report));
}

#[tokio::test]
async fn status_line_is_the_fallback_message() {
    let repo = RatingRepo::new(serve().await);

    let report = repo.list(Pagination::default()).await.unwrap_err();

    assert_eq!("503 Service Unavailable", display_message(&report));
}

#[tokio::test]
async fn undecodable_body_is_an_error() {
    let repo = RatingRepo::new(serve().await);

    let report = repo.get(RatingId(1)).await.unwrap_err();

    assert_eq!("failed to get rating", display_message(&report));
}

#[tokio::test]
async fn unreachable_api_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let repo = RatingRepo::new(ApiClient::with_client(client, &format!("http://{addr}")).unwrap());

    let report = repo.list(Pagination::default()).await.unwrap_err();

    assert_eq!("failed to list ratings", display_message(&report));
}

#[tokio::test]
async fn store_ratings_and_likes() {
    let repo = RatingRepo::new(serve().await);

    let listing = repo
        .list_for_store(StoreId(8), Pagination::default())
        .await
        .unwrap();
    assert!(listing.data.iter().all(|r| r.store_id == StoreId(8)));

    let liked = repo.like(RatingId(10)).await.unwrap().unwrap();
    assert_eq!(1, liked.likes);
    assert!(repo.like(RatingId(99)).await.unwrap().is_none());
}
