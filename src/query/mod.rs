//! Query - an immutable filter + sort description over a record type.
//!
//! Composing a query (`filter`, `sorted_by`, `then_sorted_by`) returns a new
//! value and leaves the original untouched, so a query can be shared between
//! one-shot reads and live subscriptions.
//!
//! ## Example
//!
//! ```ignore
//! let adults = Query::<UserRecord>::all()
//!     .filter(|u| u.age >= 18)
//!     .sorted_by("name", true);
//!
//! let users = store.query(&adults)?;
//! ```

mod compare;
mod execute;

use std::fmt;
use std::sync::Arc;

pub use compare::{compare_values, field_value};
pub(crate) use execute::Row;

/// A shareable record predicate.
pub type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

/// One sort key: a field name (dot paths reach into nested objects) and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub field: String,
    pub direction: SortDirection,
}

pub struct Query<R> {
    predicate: Option<Predicate<R>>,
    sort: Vec<SortEntry>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            sort: self.sort.clone(),
        }
    }
}

impl<R> Default for Query<R> {
    fn default() -> Self {
        Self {
            predicate: None,
            sort: Vec::new(),
        }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filtered", &self.predicate.is_some())
            .field("sort", &self.sort)
            .finish()
    }
}

impl<R: 'static> Query<R> {
    /// The empty query: every record, in natural enumeration order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Narrow the query. Calling `filter` again combines both predicates with AND.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<R> = match &self.predicate {
            Some(existing) => {
                let existing = Arc::clone(existing);
                Arc::new(move |record: &R| existing(record) && predicate(record))
            }
            None => Arc::new(predicate),
        };

        Self {
            predicate: Some(predicate),
            sort: self.sort.clone(),
        }
    }

    /// Sort by `key`, replacing any previous sort.
    pub fn sorted_by(&self, key: impl Into<String>, ascending: bool) -> Self {
        Self {
            predicate: self.predicate.clone(),
            sort: vec![SortEntry {
                field: key.into(),
                direction: SortDirection::from_ascending(ascending),
            }],
        }
    }

    /// Add a tie-breaker after the existing sort keys.
    pub fn then_sorted_by(&self, key: impl Into<String>, ascending: bool) -> Self {
        let mut sort = self.sort.clone();
        sort.push(SortEntry {
            field: key.into(),
            direction: SortDirection::from_ascending(ascending),
        });
        Self {
            predicate: self.predicate.clone(),
            sort,
        }
    }
}

impl<R> Query<R> {
    pub fn predicate(&self) -> Option<&Predicate<R>> {
        self.predicate.as_ref()
    }

    pub fn sort(&self) -> &[SortEntry] {
        &self.sort
    }

    pub fn is_empty(&self) -> bool {
        self.predicate.is_none() && self.sort.is_empty()
    }

    pub fn matches(&self, record: &R) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(record))
    }
}
