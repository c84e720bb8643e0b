//! Persistence contract for books.
//!
//! Every list/search/sort lookup goes through [`BookRepository::find`], which
//! takes a [`BookFilter`] predicate and an optional [`BookSort`] key.

use std::cmp::Ordering;

use async_trait::async_trait;
use bookshelf_db::{DbError, Query, Table};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use super::models::{Book, BookCategory, NewBook};

/// Row predicate for book lookups. Text matches are case-insensitive substrings.
#[derive(Debug, Clone, PartialEq)]
pub enum BookFilter {
    All,
    AuthorContains(String),
    TitleContains(String),
    Category(BookCategory),
    StockAbove(i32),
    StockEquals(i32),
    StockBelow(i32),
    /// Inclusive on both ends.
    PriceBetween {
        min: Decimal,
        max: Decimal,
    },
    PriceAtMost(Decimal),
    PriceAtLeast(Decimal),
    TitleOrAuthorContains(String),
    AuthorContainsAndCategory {
        author: String,
        category: BookCategory,
    },
    TitleAndAuthorContain {
        title: String,
        author: String,
    },
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::AuthorContains(term) => contains_ignore_case(&book.author, term),
            BookFilter::TitleContains(term) => contains_ignore_case(&book.title, term),
            BookFilter::Category(category) => book.category == *category,
            BookFilter::StockAbove(threshold) => book.stock > *threshold,
            BookFilter::StockEquals(value) => book.stock == *value,
            BookFilter::StockBelow(threshold) => book.stock < *threshold,
            BookFilter::PriceBetween { min, max } => book.price >= *min && book.price <= *max,
            BookFilter::PriceAtMost(max) => book.price <= *max,
            BookFilter::PriceAtLeast(min) => book.price >= *min,
            BookFilter::TitleOrAuthorContains(term) => {
                contains_ignore_case(&book.title, term) || contains_ignore_case(&book.author, term)
            }
            BookFilter::AuthorContainsAndCategory { author, category } => {
                contains_ignore_case(&book.author, author) && book.category == *category
            }
            BookFilter::TitleAndAuthorContain { title, author } => {
                contains_ignore_case(&book.title, title)
                    && contains_ignore_case(&book.author, author)
            }
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Sort key for book listings. Ties keep ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSort {
    PriceAsc,
    PriceDesc,
    TitleAsc,
    AuthorAsc,
}

impl BookSort {
    pub fn compare(self, a: &Book, b: &Book) -> Ordering {
        match self {
            BookSort::PriceAsc => a.price.cmp(&b.price),
            BookSort::PriceDesc => b.price.cmp(&a.price),
            BookSort::TitleAsc => a.title.cmp(&b.title),
            BookSort::AuthorAsc => a.author.cmp(&b.author),
        }
    }

    /// Parse the `/sorted/{order}` path segment.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "price-asc" => Some(BookSort::PriceAsc),
            "price-desc" => Some(BookSort::PriceDesc),
            "title" => Some(BookSort::TitleAsc),
            "author" => Some(BookSort::AuthorAsc),
            _ => None,
        }
    }
}

/// Storage operations the book service relies on.
///
/// Implementations own id assignment, timestamps, and the ISBN unique index;
/// a colliding ISBN must surface as [`DbError::UniqueViolation`].
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn insert(&self, book: NewBook) -> Result<Book, DbError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, DbError>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, DbError>;

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, DbError>;

    /// Replace every mutable field of an existing book.
    async fn replace(&self, id: i64, book: NewBook) -> Result<Book, DbError>;

    async fn update_stock(&self, id: i64, stock: i32) -> Result<Book, DbError>;

    async fn delete(&self, id: i64) -> Result<(), DbError>;

    async fn count(&self) -> Result<usize, DbError>;

    async fn find(&self, filter: BookFilter, sort: Option<BookSort>) -> Result<Vec<Book>, DbError>;
}

/// [`BookRepository`] backed by an in-process [`Table`].
pub struct TableBookRepository {
    table: Table<Book>,
}

impl TableBookRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new("books", "books_isbn_unique"),
        }
    }
}

impl Default for TableBookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookRepository for TableBookRepository {
    async fn insert(&self, book: NewBook) -> Result<Book, DbError> {
        let now = OffsetDateTime::now_utc();
        self.table
            .insert_with(move |id| Book::create(id, book, now))
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, DbError> {
        Ok(self.table.get(id).await)
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, DbError> {
        Ok(self.table.get_by_unique(isbn).await)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, DbError> {
        Ok(self.table.contains_unique(isbn).await)
    }

    async fn replace(&self, id: i64, book: NewBook) -> Result<Book, DbError> {
        let now = OffsetDateTime::now_utc();
        self.table
            .update(id, move |row| row.replace(book, now))
            .await
    }

    async fn update_stock(&self, id: i64, stock: i32) -> Result<Book, DbError> {
        let now = OffsetDateTime::now_utc();
        self.table
            .update(id, move |row| row.set_stock(stock, now))
            .await
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.table.delete(id).await.map(|_| ())
    }

    async fn count(&self) -> Result<usize, DbError> {
        Ok(self.table.count().await)
    }

    async fn find(&self, filter: BookFilter, sort: Option<BookSort>) -> Result<Vec<Book>, DbError> {
        let mut query = Query::all().filter(move |book: &Book| filter.matches(book));
        if let Some(sort) = sort {
            query = query.order_by(move |a: &Book, b: &Book| sort.compare(a, b));
        }
        Ok(self.table.select(&query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(title: &str, author: &str, isbn: &str, price: i64, stock: i32) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            description: None,
            price: Decimal::new(price, 2),
            stock,
            category: BookCategory::Fiction,
        }
    }

    async fn populated() -> TableBookRepository {
        let repo = TableBookRepository::new();
        repo.insert(new_book("1984", "George Orwell", "9788497594257", 1999, 50))
            .await
            .unwrap();
        repo.insert(new_book(
            "The Lord of the Rings",
            "J.R.R. Tolkien",
            "9788445071405",
            2999,
            5,
        ))
        .await
        .unwrap();
        repo.insert(new_book("Animal Farm", "George Orwell", "9780451526342", 999, 0))
            .await
            .unwrap();
        repo
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn text_filters_ignore_case() {
        let repo = populated().await;

        let by_author = repo
            .find(BookFilter::AuthorContains("orwell".to_string()), None)
            .await
            .unwrap();
        assert_eq!(titles(&by_author), vec!["1984", "Animal Farm"]);

        let search = repo
            .find(BookFilter::TitleOrAuthorContains("TOLK".to_string()), None)
            .await
            .unwrap();
        assert_eq!(titles(&search), vec!["The Lord of the Rings"]);

        let both = repo
            .find(
                BookFilter::TitleAndAuthorContain {
                    title: "farm".to_string(),
                    author: "george".to_string(),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(titles(&both), vec!["Animal Farm"]);
    }

    #[tokio::test]
    async fn stock_and_price_filters() {
        let repo = populated().await;

        let low = repo.find(BookFilter::StockBelow(10), None).await.unwrap();
        assert_eq!(titles(&low), vec!["The Lord of the Rings", "Animal Farm"]);

        let between = repo
            .find(
                BookFilter::PriceBetween {
                    min: Decimal::new(1999, 2),
                    max: Decimal::new(2999, 2),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(titles(&between), vec!["1984", "The Lord of the Rings"]);

        let at_most = repo
            .find(BookFilter::PriceAtMost(Decimal::new(1999, 2)), None)
            .await
            .unwrap();
        assert_eq!(titles(&at_most), vec!["1984", "Animal Farm"]);
    }

    #[tokio::test]
    async fn sorts_are_applied() {
        let repo = populated().await;

        let asc = repo
            .find(BookFilter::All, Some(BookSort::PriceAsc))
            .await
            .unwrap();
        assert_eq!(titles(&asc), vec!["Animal Farm", "1984", "The Lord of the Rings"]);

        let by_author = repo
            .find(BookFilter::All, Some(BookSort::AuthorAsc))
            .await
            .unwrap();
        // Equal authors keep insertion order.
        assert_eq!(
            titles(&by_author),
            vec!["1984", "Animal Farm", "The Lord of the Rings"]
        );
    }

    #[tokio::test]
    async fn replace_refreshes_updated_at_only() {
        let repo = populated().await;
        let before = repo.find_by_id(1).await.unwrap().unwrap();

        let after = repo
            .replace(1, new_book("Nineteen Eighty-Four", "Orwell", "9788497594257", 2199, 49))
            .await
            .unwrap();

        assert_eq!(after.title, "Nineteen Eighty-Four");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn replace_with_taken_isbn_is_a_unique_violation() {
        let repo = populated().await;

        let err = repo
            .replace(1, new_book("1984", "George Orwell", "9788445071405", 1999, 50))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(
            repo.find_by_isbn("9788497594257").await.unwrap().map(|b| b.id),
            Some(1)
        );
    }

    #[test]
    fn sort_path_segments() {
        assert_eq!(
            BookSort::from_path_segment("price-desc"),
            Some(BookSort::PriceDesc)
        );
        assert_eq!(BookSort::from_path_segment("title"), Some(BookSort::TitleAsc));
        assert_eq!(BookSort::from_path_segment("isbn"), None);
    }
}
