use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use bookshelf_db::Row;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{Duration, OffsetDateTime};

macro_rules! book_categories {
    ($($variant:ident => $symbol:literal, $label:literal;)+) => {
        /// Closed set of book classifications.
        ///
        /// On the wire a category is always its display label, e.g. `"Self-Help"`.
        /// Declaration order is the canonical order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum BookCategory {
            $($variant,)+
        }

        impl BookCategory {
            /// Every category in canonical order.
            pub const ALL: &'static [BookCategory] = &[$(BookCategory::$variant,)+];

            /// Human-readable label used in JSON.
            pub fn label(self) -> &'static str {
                match self {
                    $(BookCategory::$variant => $label,)+
                }
            }

            /// Upper-snake symbolic name, e.g. `SELF_HELP`.
            pub fn symbol(self) -> &'static str {
                match self {
                    $(BookCategory::$variant => $symbol,)+
                }
            }
        }

        static LABELS: &[&str] = &[$($label,)+];
    };
}

book_categories! {
    Fiction => "FICTION", "Fiction";
    NonFiction => "NON_FICTION", "Non-Fiction";
    ScienceFiction => "SCIENCE_FICTION", "Science Fiction";
    Fantasy => "FANTASY", "Fantasy";
    Mystery => "MYSTERY", "Mystery";
    Thriller => "THRILLER", "Thriller";
    Romance => "ROMANCE", "Romance";
    Biography => "BIOGRAPHY", "Biography";
    History => "HISTORY", "History";
    Science => "SCIENCE", "Science";
    Technology => "TECHNOLOGY", "Technology";
    Business => "BUSINESS", "Business";
    SelfHelp => "SELF_HELP", "Self-Help";
    Cooking => "COOKING", "Cooking";
    Travel => "TRAVEL", "Travel";
    Children => "CHILDREN", "Children";
    YoungAdult => "YOUNG_ADULT", "Young Adult";
    Academic => "ACADEMIC", "Academic";
    Reference => "REFERENCE", "Reference";
    Other => "OTHER", "Other";
}

impl BookCategory {
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.symbol() == symbol)
    }
}

impl fmt::Display for BookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts a display label or a symbolic name, as path segments may carry either.
impl FromStr for BookCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value)
            .or_else(|| Self::from_symbol(value))
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown book category '{0}'")]
pub struct UnknownCategory(pub String);

impl Serialize for BookCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for BookCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Cow::<'de, str>::deserialize(deserializer)?;
        BookCategory::from_label(&label).ok_or_else(|| de::Error::unknown_variant(&label, LABELS))
    }
}

/// Validated field values for a create or full update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: BookCategory,
}

/// Prices are stored with two fractional digits.
pub fn normalize_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A persisted book. Equality and hashing use the ISBN only.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: BookCategory,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Book {
    /// Build the row for a first insert; both timestamps are `now`.
    pub fn create(id: i64, fields: NewBook, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: fields.title,
            author: fields.author,
            isbn: fields.isbn,
            description: fields.description,
            price: normalize_price(fields.price),
            stock: fields.stock,
            category: fields.category,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field and refresh `updated_at`.
    pub fn replace(&mut self, fields: NewBook, now: OffsetDateTime) {
        self.title = fields.title;
        self.author = fields.author;
        self.isbn = fields.isbn;
        self.description = fields.description;
        self.price = normalize_price(fields.price);
        self.stock = fields.stock;
        self.category = fields.category;
        self.touch(now);
    }

    pub fn set_stock(&mut self, stock: i32, now: OffsetDateTime) {
        self.stock = stock;
        self.touch(now);
    }

    /// `updated_at` never moves backwards or stays put, even if the clock does.
    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.isbn == other.isbn
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.isbn.hash(state);
    }
}

impl Row for Book {
    fn id(&self) -> i64 {
        self.id
    }

    fn unique_key(&self) -> &str {
        &self.isbn
    }
}
