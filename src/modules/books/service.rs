use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};

use super::dto::{BookRequest, BookResponse, CategoryAveragePrice, CategoryCount};
use super::error::BookError;
use super::models::BookCategory;
use super::repository::{BookFilter, BookRepository, BookSort};

/// Books with fewer units than this are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Catalog operations over a [`BookRepository`].
///
/// The ISBN pre-checks here give early, precise errors; the repository's
/// unique index is what actually guarantees uniqueness.
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, request: BookRequest) -> Result<BookResponse, BookError> {
        let fields = request.into_new_book()?;

        if self.repository.exists_by_isbn(&fields.isbn).await? {
            return Err(BookError::DuplicateIsbn(fields.isbn));
        }

        let book = self.repository.insert(fields).await?;
        tracing::info!(book_id = book.id, isbn = %book.isbn, "book created");
        Ok(book.into())
    }

    pub async fn list_all(&self) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::All, None).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BookResponse, BookError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| BookError::not_found_by_id(id))
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> Result<BookResponse, BookError> {
        self.repository
            .find_by_isbn(isbn)
            .await?
            .map(Into::into)
            .ok_or_else(|| BookError::not_found_by_isbn(isbn))
    }

    pub async fn update(&self, id: i64, request: BookRequest) -> Result<BookResponse, BookError> {
        let fields = request.into_new_book()?;

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(BookError::not_found_by_id(id));
        }
        if let Some(holder) = self.repository.find_by_isbn(&fields.isbn).await? {
            if holder.id != id {
                return Err(BookError::DuplicateIsbn(fields.isbn));
            }
        }

        let book = self.repository.replace(id, fields).await?;
        tracing::info!(book_id = book.id, isbn = %book.isbn, "book updated");
        Ok(book.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), BookError> {
        self.repository.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    /// Replace the stock count. The value is stored as given, without the
    /// range check applied to full updates.
    pub async fn update_stock(&self, id: i64, stock: i32) -> Result<BookResponse, BookError> {
        let book = self.repository.update_stock(id, stock).await?;
        tracing::info!(book_id = book.id, stock, "book stock updated");
        Ok(book.into())
    }

    pub async fn by_author(&self, author: &str) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::AuthorContains(author.to_string()), None)
            .await
    }

    pub async fn by_title(&self, title: &str) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::TitleContains(title.to_string()), None)
            .await
    }

    pub async fn by_category(
        &self,
        category: BookCategory,
    ) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::Category(category), None).await
    }

    pub async fn in_stock(&self) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::StockAbove(0), None).await
    }

    pub async fn out_of_stock(&self) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::StockEquals(0), None).await
    }

    pub async fn low_stock(&self) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::StockBelow(LOW_STOCK_THRESHOLD), None)
            .await
    }

    pub async fn by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::PriceBetween { min, max }, None).await
    }

    pub async fn by_max_price(&self, max: Decimal) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::PriceAtMost(max), None).await
    }

    pub async fn by_min_price(&self, min: Decimal) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::PriceAtLeast(min), None).await
    }

    /// Title OR author contains `term`, ignoring case.
    pub async fn search(&self, term: &str) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::TitleOrAuthorContains(term.to_string()), None)
            .await
    }

    pub async fn by_author_and_category(
        &self,
        author: &str,
        category: BookCategory,
    ) -> Result<Vec<BookResponse>, BookError> {
        let filter = BookFilter::AuthorContainsAndCategory {
            author: author.to_string(),
            category,
        };
        self.list(filter, None).await
    }

    pub async fn by_title_and_author(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Vec<BookResponse>, BookError> {
        let filter = BookFilter::TitleAndAuthorContain {
            title: title.to_string(),
            author: author.to_string(),
        };
        self.list(filter, None).await
    }

    pub async fn sorted(&self, sort: BookSort) -> Result<Vec<BookResponse>, BookError> {
        self.list(BookFilter::All, Some(sort)).await
    }

    pub async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, BookError> {
        Ok(self.repository.exists_by_isbn(isbn).await?)
    }

    /// Book count per category, omitting empty categories.
    pub async fn count_by_category(&self) -> Result<Vec<CategoryCount>, BookError> {
        let books = self.repository.find(BookFilter::All, None).await?;

        let mut counts: BTreeMap<BookCategory, u64> = BTreeMap::new();
        for book in &books {
            *counts.entry(book.category).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(category, count)| CategoryCount(category, count))
            .collect())
    }

    /// Mean price per category rounded to cents, omitting empty categories.
    pub async fn average_price_by_category(
        &self,
    ) -> Result<Vec<CategoryAveragePrice>, BookError> {
        let books = self.repository.find(BookFilter::All, None).await?;

        let mut totals: BTreeMap<BookCategory, (Decimal, u64)> = BTreeMap::new();
        for book in &books {
            let entry = totals.entry(book.category).or_default();
            entry.0 += book.price;
            entry.1 += 1;
        }

        Ok(totals
            .into_iter()
            .map(|(category, (sum, count))| {
                let mean = (sum / Decimal::from(count))
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                CategoryAveragePrice(category, mean)
            })
            .collect())
    }

    pub fn categories() -> &'static [BookCategory] {
        BookCategory::ALL
    }

    async fn list(
        &self,
        filter: BookFilter,
        sort: Option<BookSort>,
    ) -> Result<Vec<BookResponse>, BookError> {
        tracing::debug!(?filter, ?sort, "listing books");
        let books = self.repository.find(filter, sort).await?;
        Ok(books.into_iter().map(Into::into).collect())
    }
}
