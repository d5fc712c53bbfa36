use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use tokio::sync::Mutex;

use super::{Filter, RecordStore, Sort, StoreError, UnitOfWork};
use crate::models::Collection;

type Tables = HashMap<Collection, Vec<Document>>;

/// In-process backend used for local runs and tests.
///
/// Units of work stage their writes and replay them against the live tables
/// at commit. Replacements re-check their filter at that point, so a version
/// predicate that went stale in the meantime fails the whole commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
enum Staged {
    Insert(Collection, Document),
    Replace(Collection, Filter, Document),
}

fn id_of(doc: &Document) -> Option<&Bson> {
    doc.get("_id")
}

fn apply_insert(tables: &mut Tables, collection: Collection, doc: Document) -> Result<(), StoreError> {
    let rows = tables.entry(collection).or_default();
    if let Some(id) = id_of(&doc) {
        if rows.iter().any(|row| id_of(row) == Some(id)) {
            return Err(StoreError::DuplicateKey(id.to_string()));
        }
    }
    rows.push(doc);
    Ok(())
}

fn apply_replace(tables: &mut Tables, collection: Collection, filter: &Filter, doc: Document) -> bool {
    let Some(rows) = tables.get_mut(&collection) else {
        return false;
    };
    match rows.iter_mut().find(|row| filter.matches(row)) {
        Some(row) => {
            *row = doc;
            true
        }
        None => false,
    }
}

fn apply_all(tables: &mut Tables, staged: &[Staged]) -> Result<(), StoreError> {
    for op in staged {
        match op {
            Staged::Insert(collection, doc) => apply_insert(tables, *collection, doc.clone())?,
            Staged::Replace(collection, filter, doc) => {
                if !apply_replace(tables, *collection, filter, doc.clone()) {
                    return Err(StoreError::WriteConflict(collection.name().to_string()));
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        apply_insert(&mut tables, collection, doc)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Document> = tables
            .get(&collection)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default();
        if let Some(sort) = sort {
            rows.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(rows)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| filter.matches(row)).cloned()))
    }

    async fn replace_one(
        &self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(apply_replace(&mut tables, collection, filter, doc))
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(rows) = tables.get_mut(&collection) else {
            return Ok(false);
        };
        match rows.iter().position(|row| filter.matches(row)) {
            Some(index) => {
                rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(MemoryUnitOfWork {
            tables: self.tables.clone(),
            staged: Vec::new(),
            finished: false,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    tables: Arc<Mutex<Tables>>,
    staged: Vec<Staged>,
    finished: bool,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "unit of work already committed or aborted"
            )));
        }
        Ok(())
    }

    /// Rows of one collection as this unit currently sees them.
    async fn view(&self, collection: Collection) -> Vec<Document> {
        let mut rows = self
            .tables
            .lock()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default();
        for op in &self.staged {
            match op {
                Staged::Insert(c, doc) if *c == collection => rows.push(doc.clone()),
                Staged::Replace(c, filter, doc) if *c == collection => {
                    if let Some(row) = rows.iter_mut().find(|row| filter.matches(row)) {
                        *row = doc.clone();
                    }
                }
                _ => {}
            }
        }
        rows
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert(&mut self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        self.ensure_open()?;
        if let Some(id) = id_of(&doc) {
            if self.view(collection).await.iter().any(|row| id_of(row) == Some(id)) {
                return Err(StoreError::DuplicateKey(id.to_string()));
            }
        }
        self.staged.push(Staged::Insert(collection, doc));
        Ok(())
    }

    async fn find_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .view(collection)
            .await
            .into_iter()
            .find(|row| filter.matches(row)))
    }

    async fn replace_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
    ) -> Result<bool, StoreError> {
        self.ensure_open()?;
        if !self.view(collection).await.iter().any(|row| filter.matches(row)) {
            return Ok(false);
        }
        self.staged.push(Staged::Replace(collection, filter.clone(), doc));
        Ok(true)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.finished = true;
        let mut tables = self.tables.lock().await;
        // Replay on a copy so a failed predicate leaves the live tables untouched.
        let mut next = tables.clone();
        apply_all(&mut next, &self.staged)?;
        *tables = next;
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.staged.clear();
        Ok(())
    }
}
