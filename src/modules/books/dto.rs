//! Wire shapes for the books API.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::{Validate, ValidationError, ValidationErrors};

use super::models::{normalize_price, Book, BookCategory, NewBook};

static ISBN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]{10}|[0-9]{13})$").expect("ISBN pattern is a valid regex")
});

const MAX_PRICE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);
const MAX_STOCK: i32 = 999_999;

/// Body of a create or full-update request.
///
/// Every field is optional at the serde layer so that missing fields surface
/// as validation messages instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "not_blank", message = "Title is required"),
        length(min = 1, max = 255, message = "Title must be between 1 and 255 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Author is required"),
        custom(function = "not_blank", message = "Author is required"),
        length(min = 1, max = 255, message = "Author must be between 1 and 255 characters")
    )]
    pub author: Option<String>,

    #[validate(
        required(message = "ISBN is required"),
        custom(function = "not_blank", message = "ISBN is required"),
        regex(path = *ISBN_PATTERN, message = "ISBN must be 10 or 13 digits")
    )]
    pub isbn: Option<String>,

    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(
        required(message = "Price is required"),
        custom(function = "valid_price")
    )]
    pub price: Option<Decimal>,

    #[validate(
        required(message = "Stock is required"),
        custom(function = "valid_stock")
    )]
    pub stock: Option<i32>,

    #[validate(required(message = "Category is required"))]
    pub category: Option<BookCategory>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Checked against the rounded value that will be stored.
fn valid_price(price: &Decimal) -> Result<(), ValidationError> {
    let price = normalize_price(*price);
    if price <= Decimal::ZERO {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Price must be greater than 0")));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Price cannot exceed 9999.99")));
    }
    Ok(())
}

fn valid_stock(stock: i32) -> Result<(), ValidationError> {
    if stock < 0 {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Stock must be greater than 0")));
    }
    if stock > MAX_STOCK {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Stock cannot exceed 999999")));
    }
    Ok(())
}

impl BookRequest {
    /// Validate every field and produce the values to persist.
    pub fn into_new_book(self) -> Result<NewBook, FieldErrors> {
        self.validate()?;

        Ok(NewBook {
            title: required(self.title, "title", "Title is required")?,
            author: required(self.author, "author", "Author is required")?,
            isbn: required(self.isbn, "isbn", "ISBN is required")?,
            description: self.description,
            price: required(self.price, "price", "Price is required")?,
            stock: required(self.stock, "stock", "Stock is required")?,
            category: required(self.category, "category", "Category is required")?,
        })
    }
}

fn required<T>(value: Option<T>, field: &str, message: &str) -> Result<T, FieldErrors> {
    value.ok_or_else(|| FieldErrors::single(field, message))
}

/// Field name to the first failing rule's message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.to_string());
        Self(errors)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let map = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, failures)| {
                failures.first().map(|failure| {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    (field.to_string(), message)
                })
            })
            .collect();
        Self(map)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// A book as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub category: BookCategory,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            description: book.description,
            price: book.price,
            stock: book.stock,
            category: book.category,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Number of books in a category, serialized as `["Fiction", 3]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount(pub BookCategory, pub u64);

/// Mean price of a category, serialized as `["Fiction", 24.99]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAveragePrice(
    pub BookCategory,
    #[serde(with = "rust_decimal::serde::float")] pub Decimal,
);
