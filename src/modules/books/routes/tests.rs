use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::ModuleRegistry;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::modules::books;

fn app() -> Router {
    let mut registry = ModuleRegistry::new();
    registry.register(books::create_module());
    bookshelf_http::build_router(&registry, &Settings::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn post_book(app: &Router, book: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/books", Some(book)).await
}

fn titles(books: &Value) -> Vec<&str> {
    books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect()
}

fn book(title: &str, isbn: &str, price: f64, stock: i32, category: &str) -> Value {
    json!({
        "title": title,
        "author": "Robert C. Martin",
        "isbn": isbn,
        "description": "Software craftsmanship",
        "price": price,
        "stock": stock,
        "category": category
    })
}

#[tokio::test]
async fn create_then_fetch() {
    let app = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(book("Clean Code", "9780132350884", 45.99, 15, "Technology")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["price"], json!(45.99));
    assert_eq!(created["category"], "Technology");
    assert!(created["createdAt"].is_string());

    let (status, fetched) = send(&app, Method::GET, "/api/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["isbn"], "9780132350884");

    let (status, by_isbn) = send(&app, Method::GET, "/api/books/isbn/9780132350884", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_isbn["title"], "Clean Code");
}

#[tokio::test]
async fn duplicate_isbn_is_a_conflict() {
    let app = app();
    let payload = book("Clean Code", "9780132350884", 45.99, 15, "Technology");

    post_book(&app, payload.clone()).await;
    let (status, body) = post_book(&app, payload).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(
        body["error"]["message"],
        "A book with ISBN 9780132350884 already exists"
    );

    let (_, all) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_body_reports_every_required_field() {
    let app = app();

    let (status, body) = post_book(&app, json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    let details = body["error"]["details"].as_object().unwrap();
    assert_eq!(details.len(), 6);
    assert_eq!(details["title"], "Title is required");
    assert_eq!(details["category"], "Category is required");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/books")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_book_is_not_found() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/books/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Book not found with ID: 999");
    assert!(body["error"]["trace_id"].is_string());
}

#[tokio::test]
async fn update_and_delete() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/books",
        Some(book("Clean Code", "9780132350884", 45.99, 15, "Technology")),
    )
    .await;

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/books/1",
        Some(book(
            "Clean Code 2nd Edition",
            "9780132350884",
            49.99,
            12,
            "Technology",
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Clean Code 2nd Edition");

    let (status, body) = send(&app, Method::DELETE, "/api/books/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::DELETE, "/api/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_lookups_and_patch() {
    let app = app();
    post_book(&app, book("Stocked", "1111111111", 10.0, 5, "Fiction")).await;
    post_book(&app, book("Sold Out", "2222222222", 10.0, 0, "Fiction")).await;

    let (_, in_stock) = send(&app, Method::GET, "/api/books/in-stock", None).await;
    assert_eq!(in_stock.as_array().unwrap().len(), 1);
    assert_eq!(in_stock[0]["title"], "Stocked");

    let (_, out) = send(&app, Method::GET, "/api/books/out-of-stock", None).await;
    assert_eq!(out[0]["title"], "Sold Out");

    let (_, low) = send(&app, Method::GET, "/api/books/low-stock", None).await;
    assert_eq!(low.as_array().unwrap().len(), 2);

    let (status, patched) = send(&app, Method::PATCH, "/api/books/2/stock?stock=40", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["stock"], 40);

    let (_, out) = send(&app, Method::GET, "/api/books/out-of-stock", None).await;
    assert!(out.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn price_range_is_inclusive() {
    let app = app();
    post_book(&app, book("Cheap", "1111111111", 10.0, 1, "Fiction")).await;
    post_book(&app, book("Middle", "2222222222", 20.0, 1, "Fiction")).await;
    post_book(&app, book("Pricey", "3333333333", 30.0, 1, "Fiction")).await;

    let (status, books) = send(
        &app,
        Method::GET,
        "/api/books/price-range?minPrice=10&maxPrice=20",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&books), vec!["Cheap", "Middle"]);

    let (_, at_least) = send(&app, Method::GET, "/api/books/min-price/30", None).await;
    assert_eq!(at_least[0]["title"], "Pricey");

    let (_, at_most) = send(&app, Method::GET, "/api/books/max-price/20", None).await;
    assert_eq!(titles(&at_most), vec!["Cheap", "Middle"]);

    let (_, at_most) = send(&app, Method::GET, "/api/books/max-price/9.99", None).await;
    assert!(titles(&at_most).is_empty());

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/books/price-range?minPrice=abc&maxPrice=20",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn categories_round_trip_by_label() {
    let app = app();
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(book("7 Habits", "9788497594260", 22.99, 45, "Self-Help")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["category"], "Self-Help");

    let (_, books) = send(&app, Method::GET, "/api/books/category/Self-Help", None).await;
    assert_eq!(books.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/books/category/Astrology", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, labels) = send(&app, Method::GET, "/api/books/categories", None).await;
    let labels = labels.as_array().unwrap();
    assert_eq!(labels.len(), 20);
    assert!(labels.contains(&json!("Self-Help")));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(book("Unknown", "1234567890", 10.0, 1, "Astrology")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exists_and_statistics() {
    let app = app();
    post_book(&app, book("A", "1111111111", 10.0, 1, "Fiction")).await;
    post_book(&app, book("B", "2222222222", 20.0, 1, "Fiction")).await;

    let (_, exists) = send(&app, Method::GET, "/api/books/exists/1111111111", None).await;
    assert_eq!(exists, json!(true));
    let (_, exists) = send(&app, Method::GET, "/api/books/exists/9999999999", None).await;
    assert_eq!(exists, json!(false));

    let (_, counts) = send(&app, Method::GET, "/api/books/statistics/category", None).await;
    assert_eq!(counts, json!([["Fiction", 2]]));

    let (_, averages) = send(&app, Method::GET, "/api/books/statistics/average-price", None).await;
    assert_eq!(averages, json!([["Fiction", 15.0]]));
}

#[tokio::test]
async fn title_and_author_path_lookups() {
    let app = app();
    let mut orwell = book("Animal Farm", "1111111111", 9.99, 3, "Fiction");
    orwell["author"] = json!("George Orwell");
    post_book(&app, orwell).await;
    post_book(&app, book("Clean Code", "2222222222", 45.99, 1, "Technology")).await;
    post_book(&app, book("Clean Architecture", "3333333333", 39.99, 1, "Technology")).await;

    let (status, by_author) = send(
        &app,
        Method::GET,
        "/api/books/author/George%20Orwell",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&by_author), vec!["Animal Farm"]);

    let (_, by_author) = send(&app, Method::GET, "/api/books/author/MARTIN", None).await;
    assert_eq!(titles(&by_author), vec!["Clean Code", "Clean Architecture"]);

    let (status, by_title) = send(&app, Method::GET, "/api/books/title/clean", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&by_title), vec!["Clean Code", "Clean Architecture"]);

    let (_, by_title) = send(&app, Method::GET, "/api/books/title/Animal%20Farm", None).await;
    assert_eq!(titles(&by_title), vec!["Animal Farm"]);

    let (_, none) = send(&app, Method::GET, "/api/books/title/dune", None).await;
    assert!(titles(&none).is_empty());
}

#[tokio::test]
async fn sorted_routes_order_results() {
    let app = app();
    post_book(&app, book("Middlemarch", "1111111111", 25.0, 1, "Fiction")).await;
    post_book(&app, book("Zen Garden", "2222222222", 9.99, 1, "Fiction")).await;
    post_book(&app, book("Atlas", "3333333333", 45.99, 1, "Fiction")).await;

    let (_, desc) = send(&app, Method::GET, "/api/books/sorted/price-desc", None).await;
    assert_eq!(titles(&desc), vec!["Atlas", "Middlemarch", "Zen Garden"]);

    let (_, by_title) = send(&app, Method::GET, "/api/books/sorted/title", None).await;
    assert_eq!(titles(&by_title), vec!["Atlas", "Middlemarch", "Zen Garden"]);

    let (_, asc) = send(&app, Method::GET, "/api/books/sorted/price-asc", None).await;
    assert_eq!(titles(&asc), vec!["Zen Garden", "Middlemarch", "Atlas"]);
}

#[tokio::test]
async fn search_filter_and_sort() {
    let app = app();
    post_book(&app, book("Clean Code", "1111111111", 45.99, 1, "Technology")).await;
    post_book(&app, book("Clean Agile", "2222222222", 25.0, 1, "Business")).await;

    let (_, found) = send(&app, Method::GET, "/api/books/search?q=AGILE", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, filtered) = send(
        &app,
        Method::GET,
        "/api/books/filter?author=martin&category=Technology",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered[0]["title"], "Clean Code");

    let (status, _) = send(&app, Method::GET, "/api/books/filter?author=martin", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, sorted) = send(&app, Method::GET, "/api/books/sorted/price-asc", None).await;
    assert_eq!(sorted[0]["title"], "Clean Agile");

    let (status, _) = send(&app, Method::GET, "/api/books/sorted/isbn", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_includes_book_paths() {
    let app = app();

    let (status, doc) = send(&app, Method::GET, "/docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/books"]["post"].is_object());
    assert!(doc["paths"]["/api/books/{id}/stock"]["patch"].is_object());
    assert!(doc["components"]["schemas"]["Book"].is_object());
}
