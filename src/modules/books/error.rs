use bookshelf_db::DbError;
use bookshelf_http::error::AppError;
use serde_json::json;
use thiserror::Error;

use super::dto::FieldErrors;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Book not found with {field}: {value}")]
    NotFound { field: &'static str, value: String },

    #[error("A book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    #[error(transparent)]
    Store(DbError),
}

impl BookError {
    pub fn not_found_by_id(id: i64) -> Self {
        Self::NotFound {
            field: "ID",
            value: id.to_string(),
        }
    }

    pub fn not_found_by_isbn(isbn: &str) -> Self {
        Self::NotFound {
            field: "ISBN",
            value: isbn.to_string(),
        }
    }
}

impl From<FieldErrors> for BookError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Store errors that carry domain meaning are lifted into their book variants.
impl From<DbError> for BookError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { value, .. } => Self::DuplicateIsbn(value),
            DbError::NotFound { id, .. } => Self::not_found_by_id(id),
            other => Self::Store(other),
        }
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(fields) => AppError::validation(
                serde_json::to_value(&fields).unwrap_or_default(),
                "The provided data is invalid",
            ),
            BookError::NotFound { .. } => AppError::not_found(err.to_string()),
            BookError::DuplicateIsbn(ref isbn) => {
                AppError::conflict(json!({ "isbn": isbn }), err.to_string())
            }
            BookError::Store(store) => AppError::Internal(store.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn messages_name_field_and_value() {
        assert_eq!(
            BookError::not_found_by_id(42).to_string(),
            "Book not found with ID: 42"
        );
        assert_eq!(
            BookError::not_found_by_isbn("1234567890").to_string(),
            "Book not found with ISBN: 1234567890"
        );
        assert_eq!(
            BookError::DuplicateIsbn("1234567890".to_string()).to_string(),
            "A book with ISBN 1234567890 already exists"
        );
    }

    #[test]
    fn unique_violation_becomes_duplicate_isbn() {
        let err: BookError = DbError::UniqueViolation {
            table: "books",
            index: "books_isbn_unique",
            value: "9780132350884".to_string(),
        }
        .into();
        assert!(matches!(err, BookError::DuplicateIsbn(isbn) if isbn == "9780132350884"));
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (
                BookError::Validation(FieldErrors::single("title", "Title is required")),
                StatusCode::BAD_REQUEST,
            ),
            (BookError::not_found_by_id(1), StatusCode::NOT_FOUND),
            (
                BookError::DuplicateIsbn("1234567890".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                BookError::Store(DbError::IdMismatch {
                    table: "books",
                    expected: 1,
                    actual: 2,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
