//! In-process table store for bookshelf modules.
//!
//! A [`Table`] keeps rows ordered by a store-assigned `i64` id and maintains a
//! single unique secondary index. Every call takes the table lock exactly
//! once, so each call is an atomic unit of work: reads share the lock,
//! writes hold it exclusively. Unique-index violations are detected under the
//! write lock, which makes the index the authoritative uniqueness guard.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tokio::sync::RwLock;

/// A row that can be stored in a [`Table`].
pub trait Row: Clone + Send + Sync + 'static {
    /// Store-assigned identifier of the row.
    fn id(&self) -> i64;

    /// Value of the row's unique secondary key.
    fn unique_key(&self) -> &str;
}

/// Errors raised by table operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("no row with id {id} in table '{table}'")]
    NotFound { table: &'static str, id: i64 },

    #[error("duplicate value '{value}' for unique index '{index}' on table '{table}'")]
    UniqueViolation {
        table: &'static str,
        index: &'static str,
        value: String,
    },

    #[error("row built for id {expected} in table '{table}' reported id {actual}")]
    IdMismatch {
        table: &'static str,
        expected: i64,
        actual: i64,
    },
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A filter plus optional ordering evaluated against every row of a table.
///
/// Rows are visited in ascending id order and sorted with a stable sort, so
/// rows that compare equal keep ascending id order.
pub struct Query<T> {
    filter: Option<Predicate<T>>,
    order: Option<Comparator<T>>,
}

impl<T> Query<T> {
    /// Query matching every row, in id order.
    pub fn all() -> Self {
        Self {
            filter: None,
            order: None,
        }
    }

    /// Restrict the query to rows matching `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Order the result with `comparator`.
    pub fn order_by<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.order = Some(Box::new(comparator));
        self
    }

    fn matches(&self, row: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(row))
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::all()
    }
}

struct TableState<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
    unique: HashMap<String, i64>,
}

/// An in-memory table with auto-increment ids and one unique index.
pub struct Table<T: Row> {
    name: &'static str,
    unique_index: &'static str,
    state: RwLock<TableState<T>>,
}

impl<T: Row> Table<T> {
    /// Create an empty table whose unique index is called `unique_index`.
    pub fn new(name: &'static str, unique_index: &'static str) -> Self {
        Self {
            name,
            unique_index,
            state: RwLock::new(TableState {
                next_id: 1,
                rows: BTreeMap::new(),
                unique: HashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert a row built from the next id.
    ///
    /// The id is only consumed when the insert succeeds.
    pub async fn insert_with<F>(&self, build: F) -> Result<T, DbError>
    where
        F: FnOnce(i64) -> T,
    {
        let mut state = self.state.write().await;
        let id = state.next_id;
        let row = build(id);

        if row.id() != id {
            return Err(DbError::IdMismatch {
                table: self.name,
                expected: id,
                actual: row.id(),
            });
        }
        if state.unique.contains_key(row.unique_key()) {
            return Err(self.violation(row.unique_key()));
        }

        state.unique.insert(row.unique_key().to_string(), id);
        state.rows.insert(id, row.clone());
        state.next_id += 1;

        tracing::debug!(table = self.name, id, "row inserted");
        Ok(row)
    }

    /// Fetch a row by id.
    pub async fn get(&self, id: i64) -> Option<T> {
        self.state.read().await.rows.get(&id).cloned()
    }

    /// Fetch a row by its unique key.
    pub async fn get_by_unique(&self, key: &str) -> Option<T> {
        let state = self.state.read().await;
        state
            .unique
            .get(key)
            .and_then(|id| state.rows.get(id))
            .cloned()
    }

    /// Whether a row with the given unique key exists.
    pub async fn contains_unique(&self, key: &str) -> bool {
        self.state.read().await.unique.contains_key(key)
    }

    /// Apply `mutate` to a copy of the row and write it back.
    ///
    /// If the mutated row would collide with another row's unique key, or if
    /// `mutate` changes the id, the stored row is left untouched.
    pub async fn update<F>(&self, id: i64, mutate: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.state.write().await;
        let mut row = state
            .rows
            .get(&id)
            .cloned()
            .ok_or(DbError::NotFound {
                table: self.name,
                id,
            })?;
        let old_key = row.unique_key().to_string();

        mutate(&mut row);

        if row.id() != id {
            return Err(DbError::IdMismatch {
                table: self.name,
                expected: id,
                actual: row.id(),
            });
        }
        if row.unique_key() != old_key {
            if state.unique.contains_key(row.unique_key()) {
                return Err(self.violation(row.unique_key()));
            }
            state.unique.remove(&old_key);
            state.unique.insert(row.unique_key().to_string(), id);
        }
        state.rows.insert(id, row.clone());

        tracing::debug!(table = self.name, id, "row updated");
        Ok(row)
    }

    /// Remove a row by id, returning it.
    pub async fn delete(&self, id: i64) -> Result<T, DbError> {
        let mut state = self.state.write().await;
        let row = state.rows.remove(&id).ok_or(DbError::NotFound {
            table: self.name,
            id,
        })?;
        state.unique.remove(row.unique_key());

        tracing::debug!(table = self.name, id, "row deleted");
        Ok(row)
    }

    /// Number of rows currently stored.
    pub async fn count(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Evaluate a query against a consistent snapshot of the table.
    pub async fn select(&self, query: &Query<T>) -> Vec<T> {
        let mut rows: Vec<T> = {
            let state = self.state.read().await;
            state
                .rows
                .values()
                .filter(|row| query.matches(row))
                .cloned()
                .collect()
        };

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| order(a, b));
        }

        rows
    }

    fn violation(&self, value: &str) -> DbError {
        DbError::UniqueViolation {
            table: self.name,
            index: self.unique_index,
            value: value.to_string(),
        }
    }
}
