//! Document persistence behind a backend-agnostic trait.
//!
//! Records travel as BSON documents. Filters are conjunctions of equality
//! clauses on (possibly dotted) field paths, which is all the service needs
//! and keeps the in-memory backend honest about what Mongo would match.

mod memory;
mod mongo;
mod tenant;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use tenant::{TenantStore, TenantUnitOfWork};

use std::cmp::Ordering;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use thiserror::Error;

use crate::models::Collection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),

    /// A versioned write lost the race against another writer.
    #[error("write conflict on {0}")]
    WriteConflict(String),

    /// The backend aborted the transaction and it may be replayed as a whole.
    #[error("transient transaction failure: {0}")]
    Transient(String),

    #[error("duplicate key {0}")]
    DuplicateKey(String),

    #[error("failed to encode record: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("failed to decode record: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::WriteConflict(_) | StoreError::Transient(_))
    }
}

/// Conjunction of equality predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Bson)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("_id", id)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        let field = field.into();
        let value = value.into();
        // Later clauses on the same path replace earlier ones.
        self.clauses.retain(|(existing, _)| existing != &field);
        self.clauses.push((field, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn to_document(&self) -> Document {
        self.clauses
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(path, expected)| lookup(doc, path).is_some_and(|actual| bson_eq(actual, expected)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = bson_cmp(lookup(a, &self.field), lookup(b, &self.field));
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Backend holding every collection of the service.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Replace the single document matching `filter`. Returns false when
    /// nothing matched, which callers treat as a lost version race.
    async fn replace_one(
        &self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
    ) -> Result<bool, StoreError>;

    /// Remove the single document matching `filter`. Returns false when
    /// nothing matched.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<bool, StoreError>;

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// All-or-nothing group of writes. Reads observe the unit's own staged
/// writes. Dropping a unit without committing discards it.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert(&mut self, collection: Collection, doc: Document) -> Result<(), StoreError>;

    async fn find_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    async fn replace_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
    ) -> Result<bool, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn abort(&mut self) -> Result<(), StoreError>;
}

pub(crate) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn bson_eq(actual: &Bson, expected: &Bson) -> bool {
    match (as_f64(actual), as_f64(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Boolean(_)) => 3,
        Some(Bson::DateTime(_)) => 4,
        Some(_) => 5,
    }
}

fn bson_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(Bson::Boolean(x)), Some(Bson::Boolean(y))) => x.cmp(y),
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (as_f64(x), as_f64(y)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
