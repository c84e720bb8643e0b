//! Sample catalog loaded into an empty store at startup.

use rust_decimal::Decimal;

use super::error::BookError;
use super::models::{BookCategory, NewBook};
use super::repository::BookRepository;

/// (title, author, isbn, description, price in cents, stock, category)
type SampleBook = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
    i32,
    BookCategory,
);

const SAMPLE_BOOKS: &[SampleBook] = &[
    (
        "The Lord of the Rings",
        "J.R.R. Tolkien",
        "9788445071405",
        "An epic fantasy story about the fight against evil",
        2999,
        50,
        BookCategory::Fantasy,
    ),
    (
        "1984",
        "George Orwell",
        "9788497594257",
        "A dystopia about totalitarian control",
        1999,
        30,
        BookCategory::Fiction,
    ),
    (
        "100 Years of Solitude",
        "Gabriel García Márquez",
        "9788497592208",
        "The story of the Buendía family in Macondo",
        2499,
        25,
        BookCategory::Fiction,
    ),
    (
        "The Little Prince",
        "Antoine de Saint-Exupéry",
        "9788497592796",
        "A poetic story about friendship and love",
        1599,
        100,
        BookCategory::Children,
    ),
    (
        "Don Quixote de la Mancha",
        "Miguel de Cervantes",
        "9788497594258",
        "The masterpiece of Spanish literature",
        3499,
        20,
        BookCategory::Fiction,
    ),
    (
        "Clean Code",
        "Robert C. Martin",
        "9780132350884",
        "Guide to writing clean and maintainable code",
        4599,
        15,
        BookCategory::Technology,
    ),
    (
        "Design Patterns",
        "Erich Gamma, Richard Helm, Ralph Johnson, John Vlissides",
        "9780201633610",
        "Design patterns in object-oriented programming",
        5599,
        10,
        BookCategory::Technology,
    ),
    (
        "Steve Jobs",
        "Walter Isaacson",
        "9788499893404",
        "The authorized biography of the co-founder of Apple",
        3999,
        35,
        BookCategory::Biography,
    ),
    (
        "Sapiens: De animales a dioses",
        "Yuval Noah Harari",
        "9788499926223",
        "Brief history of humanity",
        2799,
        40,
        BookCategory::History,
    ),
    (
        "El arte de la guerra",
        "Sun Tzu",
        "9788497594259",
        "Chinese military treatise on strategy",
        1899,
        60,
        BookCategory::Business,
    ),
    (
        "The 7 Habits of Highly Effective People",
        "Stephen R. Covey",
        "9788497594260",
        "Guide for personal and professional development",
        2299,
        45,
        BookCategory::SelfHelp,
    ),
    (
        "Cooking for Beginners",
        "María García",
        "9788497594261",
        "Easy and delicious recipes to start cooking",
        3299,
        25,
        BookCategory::Cooking,
    ),
    (
        "Traveling in Spain",
        "Carlos López",
        "9788497594262",
        "Complete guide to traveling in Spain",
        2899,
        30,
        BookCategory::Travel,
    ),
    (
        "Harry Potter y la piedra filosofal",
        "J.K. Rowling",
        "9788497594263",
        "The first book in the Harry Potter saga",
        2199,
        80,
        BookCategory::YoungAdult,
    ),
    (
        "The Da Vinci Code",
        "Dan Brown",
        "9788497594264",
        "A thriller about a religious mystery",
        2399,
        55,
        BookCategory::Thriller,
    ),
];

/// The sample catalog as insertable rows.
pub fn sample_catalog() -> Vec<NewBook> {
    SAMPLE_BOOKS
        .iter()
        .map(
            |&(title, author, isbn, description, cents, stock, category)| NewBook {
                title: title.to_string(),
                author: author.to_string(),
                isbn: isbn.to_string(),
                description: Some(description.to_string()),
                price: Decimal::new(cents, 2),
                stock,
                category,
            },
        )
        .collect()
}

/// Insert the sample catalog if the store holds no books.
///
/// Returns the number of books inserted, which is zero when the store was
/// already populated.
pub async fn seed_sample_catalog(repository: &dyn BookRepository) -> Result<usize, BookError> {
    let existing = repository.count().await?;
    if existing > 0 {
        tracing::info!(existing, "book store already populated; skipping sample data");
        return Ok(0);
    }

    let catalog = sample_catalog();
    let total = catalog.len();
    for book in catalog {
        repository.insert(book).await?;
    }

    tracing::info!(count = total, "loaded sample books into the store");
    Ok(total)
}
