//! HTTP handlers for the books module, mounted under `/api/books`.

mod openapi;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use bookshelf_http::error::AppError;
use bookshelf_http::extract::{JsonBody, PathParam, QueryParams};
use rust_decimal::Decimal;
use serde::Deserialize;

pub use openapi::document as openapi_document;

use super::dto::{BookRequest, BookResponse, CategoryAveragePrice, CategoryCount};
use super::models::BookCategory;
use super::repository::BookSort;
use super::service::BookService;

type SharedService = Arc<BookService>;
type ApiResult<T> = Result<T, AppError>;

/// Build the books router with its service attached.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/categories", get(categories))
        .route("/in-stock", get(in_stock))
        .route("/out-of-stock", get(out_of_stock))
        .route("/low-stock", get(low_stock))
        .route("/price-range", get(price_range))
        .route("/search", get(search))
        .route("/filter", get(filter))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/{id}/stock", patch(update_stock))
        .route("/isbn/{isbn}", get(get_by_isbn))
        .route("/exists/{isbn}", get(exists_by_isbn))
        .route("/author/{author}", get(by_author))
        .route("/title/{title}", get(by_title))
        .route("/category/{category}", get(by_category))
        .route("/max-price/{max_price}", get(by_max_price))
        .route("/min-price/{min_price}", get(by_min_price))
        .route("/sorted/{order}", get(sorted))
        .route("/statistics/category", get(count_by_category))
        .route("/statistics/average-price", get(average_price_by_category))
        .with_state(service)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(service): State<SharedService>,
    JsonBody(request): JsonBody<BookRequest>,
) -> ApiResult<(StatusCode, Json<BookResponse>)> {
    let book = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(State(service): State<SharedService>) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.list_all().await?))
}

async fn get_book(
    State(service): State<SharedService>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<BookResponse>> {
    Ok(Json(service.get_by_id(id).await?))
}

async fn get_by_isbn(
    State(service): State<SharedService>,
    PathParam(isbn): PathParam<String>,
) -> ApiResult<Json<BookResponse>> {
    Ok(Json(service.get_by_isbn(&isbn).await?))
}

async fn update_book(
    State(service): State<SharedService>,
    PathParam(id): PathParam<i64>,
    JsonBody(request): JsonBody<BookRequest>,
) -> ApiResult<Json<BookResponse>> {
    Ok(Json(service.update(id, request).await?))
}

async fn delete_book(
    State(service): State<SharedService>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn by_author(
    State(service): State<SharedService>,
    PathParam(author): PathParam<String>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.by_author(&author).await?))
}

async fn by_title(
    State(service): State<SharedService>,
    PathParam(title): PathParam<String>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.by_title(&title).await?))
}

async fn by_category(
    State(service): State<SharedService>,
    PathParam(category): PathParam<String>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let category = parse_category(&category)?;
    Ok(Json(service.by_category(category).await?))
}

async fn in_stock(State(service): State<SharedService>) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.in_stock().await?))
}

async fn out_of_stock(
    State(service): State<SharedService>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.out_of_stock().await?))
}

async fn low_stock(State(service): State<SharedService>) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.low_stock().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRangeParams {
    min_price: Decimal,
    max_price: Decimal,
}

async fn price_range(
    State(service): State<SharedService>,
    QueryParams(params): QueryParams<PriceRangeParams>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(
        service
            .by_price_range(params.min_price, params.max_price)
            .await?,
    ))
}

async fn by_max_price(
    State(service): State<SharedService>,
    PathParam(max_price): PathParam<Decimal>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.by_max_price(max_price).await?))
}

async fn by_min_price(
    State(service): State<SharedService>,
    PathParam(min_price): PathParam<Decimal>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.by_min_price(min_price).await?))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
}

async fn search(
    State(service): State<SharedService>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    Ok(Json(service.search(&params.q).await?))
}

#[derive(Debug, Deserialize)]
struct FilterParams {
    author: Option<String>,
    title: Option<String>,
    category: Option<String>,
}

/// `author` combined with exactly one of `category` or `title`.
async fn filter(
    State(service): State<SharedService>,
    QueryParams(params): QueryParams<FilterParams>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let books = match (params.author, params.title, params.category) {
        (Some(author), None, Some(category)) => {
            let category = parse_category(&category)?;
            service.by_author_and_category(&author, category).await?
        }
        (Some(author), Some(title), None) => service.by_title_and_author(&title, &author).await?,
        _ => {
            return Err(AppError::bad_request(
                "filter requires 'author' together with either 'category' or 'title'",
            ))
        }
    };
    Ok(Json(books))
}

async fn sorted(
    State(service): State<SharedService>,
    PathParam(order): PathParam<String>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let sort = BookSort::from_path_segment(&order)
        .ok_or_else(|| AppError::not_found(format!("Unknown sort order: {}", order)))?;
    Ok(Json(service.sorted(sort).await?))
}

#[derive(Debug, Deserialize)]
struct StockParams {
    stock: i32,
}

async fn update_stock(
    State(service): State<SharedService>,
    PathParam(id): PathParam<i64>,
    QueryParams(params): QueryParams<StockParams>,
) -> ApiResult<Json<BookResponse>> {
    Ok(Json(service.update_stock(id, params.stock).await?))
}

async fn exists_by_isbn(
    State(service): State<SharedService>,
    PathParam(isbn): PathParam<String>,
) -> ApiResult<Json<bool>> {
    Ok(Json(service.exists_by_isbn(&isbn).await?))
}

async fn count_by_category(
    State(service): State<SharedService>,
) -> ApiResult<Json<Vec<CategoryCount>>> {
    Ok(Json(service.count_by_category().await?))
}

async fn average_price_by_category(
    State(service): State<SharedService>,
) -> ApiResult<Json<Vec<CategoryAveragePrice>>> {
    Ok(Json(service.average_price_by_category().await?))
}

async fn categories() -> Json<&'static [BookCategory]> {
    Json(BookService::categories())
}

fn parse_category(raw: &str) -> ApiResult<BookCategory> {
    raw.parse()
        .map_err(|err: super::models::UnknownCategory| AppError::bad_request(err.to_string()))
}

#[cfg(test)]
mod tests;
