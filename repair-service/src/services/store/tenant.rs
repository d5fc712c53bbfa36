//! Organization scoping over a [`RecordStore`].
//!
//! Every read gets `organization == <org>` appended to its filter and every
//! write has `organization` overwritten with the caller's org before it
//! reaches the backend, whatever the record carried.

use std::collections::HashMap;
use std::sync::Arc;

use mongodb::bson::{self, Document};

use super::{Filter, RecordStore, Sort, StoreError, UnitOfWork};
use crate::models::Record;

const ORG_FIELD: &str = "organization";

#[derive(Clone)]
pub struct TenantStore {
    inner: Arc<dyn RecordStore>,
    org_id: String,
}

fn scope(org_id: &str, filter: Filter) -> Filter {
    filter.eq(ORG_FIELD, org_id)
}

fn stamp<R: Record>(org_id: &str, record: &R) -> Result<Document, StoreError> {
    let mut doc = bson::to_document(record)?;
    doc.insert(ORG_FIELD, org_id);
    Ok(doc)
}

fn decode<R: Record>(doc: Document) -> Result<R, StoreError> {
    Ok(bson::from_document(doc)?)
}

impl TenantStore {
    pub fn new(inner: Arc<dyn RecordStore>, org_id: impl Into<String>) -> Self {
        Self {
            inner,
            org_id: org_id.into(),
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub async fn insert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let doc = stamp(&self.org_id, record)?;
        self.inner.insert(R::COLLECTION, doc).await
    }

    pub async fn find<R: Record>(&self, filter: Filter, sort: Option<Sort>) -> Result<Vec<R>, StoreError> {
        let filter = scope(&self.org_id, filter);
        self.inner
            .find(R::COLLECTION, &filter, sort.as_ref())
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn find_one<R: Record>(&self, filter: Filter) -> Result<Option<R>, StoreError> {
        let filter = scope(&self.org_id, filter);
        self.inner
            .find_one(R::COLLECTION, &filter)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn find_by_id<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.find_one(Filter::by_id(id)).await
    }

    /// Resolve references by id. Ids that are missing, or belong to another
    /// organization, are absent from the map.
    pub async fn find_by_ids<'a, R: Record>(
        &self,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<HashMap<String, R>, StoreError> {
        let mut found = HashMap::new();
        for id in ids {
            if found.contains_key(id) {
                continue;
            }
            if let Some(record) = self.find_by_id::<R>(id).await? {
                found.insert(id.to_string(), record);
            }
        }
        Ok(found)
    }

    /// Replace `record` in place. `guard` adds predicates (usually the
    /// expected version) on top of the id and tenant match.
    pub async fn replace<R: Record>(&self, guard: Filter, record: &R) -> Result<bool, StoreError> {
        let filter = scope(&self.org_id, guard.eq("_id", record.id()));
        let doc = stamp(&self.org_id, record)?;
        self.inner.replace_one(R::COLLECTION, &filter, doc).await
    }

    pub async fn delete<R: Record>(&self, id: &str) -> Result<bool, StoreError> {
        let filter = scope(&self.org_id, Filter::by_id(id));
        self.inner.delete_one(R::COLLECTION, &filter).await
    }

    pub async fn begin(&self) -> Result<TenantUnitOfWork, StoreError> {
        Ok(TenantUnitOfWork {
            inner: self.inner.begin().await?,
            org_id: self.org_id.clone(),
        })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

pub struct TenantUnitOfWork {
    inner: Box<dyn UnitOfWork>,
    org_id: String,
}

impl TenantUnitOfWork {
    pub async fn insert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let doc = stamp(&self.org_id, record)?;
        self.inner.insert(R::COLLECTION, doc).await
    }

    pub async fn find_by_id<R: Record>(&mut self, id: &str) -> Result<Option<R>, StoreError> {
        let filter = scope(&self.org_id, Filter::by_id(id));
        self.inner
            .find_one(R::COLLECTION, &filter)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn replace<R: Record>(&mut self, guard: Filter, record: &R) -> Result<bool, StoreError> {
        let filter = scope(&self.org_id, guard.eq("_id", record.id()));
        let doc = stamp(&self.org_id, record)?;
        self.inner.replace_one(R::COLLECTION, &filter, doc).await
    }

    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    pub async fn abort(mut self) -> Result<(), StoreError> {
        self.inner.abort().await
    }
}
