use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, ClientSession, Collection as MongoCollection, Database, IndexModel,
};

use super::{Filter, RecordStore, Sort, StoreError, UnitOfWork};
use crate::models::Collection;

const DUPLICATE_KEY_CODE: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if err.contains_label(TRANSIENT_TRANSACTION_ERROR)
            || err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
        {
            return StoreError::Transient(err.to_string());
        }
        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
            if write_error.code == DUPLICATE_KEY_CODE {
                return StoreError::DuplicateKey(write_error.message.clone());
            }
        }
        StoreError::Backend(anyhow::Error::new(err))
    }
}

/// MongoDB backend. Units of work are client-session transactions, which
/// require a replica set or sharded cluster.
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            StoreError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    fn collection(&self, collection: Collection) -> MongoCollection<Document> {
        self.db.collection(collection.name())
    }

    /// Tenant lookup index on every collection, plus the listing order.
    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for repair-service");

        for collection in Collection::ALL {
            let tenant_index = IndexModel::builder()
                .keys(doc! { "organization": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("tenant_recent_lookup".to_string())
                        .build(),
                )
                .build();

            self.collection(collection)
                .create_index(tenant_index, None)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to create tenant index on {} collection: {}",
                        collection.name(),
                        e
                    );
                    StoreError::from(e)
                })?;
        }

        tracing::info!("Created index on <collection>.(organization, createdAt)");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        self.collection(collection).insert_one(doc, None).await?;
        Ok(())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>, StoreError> {
        let options = sort.map(|sort| {
            let mut order = Document::new();
            order.insert(sort.field.clone(), if sort.descending { -1 } else { 1 });
            FindOptions::builder().sort(order).build()
        });
        let cursor = self
            .collection(collection)
            .find(filter.to_document(), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one(filter.to_document(), None)
            .await?)
    }

    async fn replace_one(
        &self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
    ) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .replace_one(filter.to_document(), doc, None)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(filter.to_document(), None)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(Box::new(MongoUnitOfWork {
            db: self.db.clone(),
            session,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

pub struct MongoUnitOfWork {
    db: Database,
    session: ClientSession,
}

impl MongoUnitOfWork {
    fn collection(&self, collection: Collection) -> MongoCollection<Document> {
        self.db.collection(collection.name())
    }
}

#[async_trait]
impl UnitOfWork for MongoUnitOfWork {
    async fn insert(&mut self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        self.collection(collection)
            .insert_one_with_session(doc, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn find_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one_with_session(filter.to_document(), None, &mut self.session)
            .await?)
    }

    async fn replace_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
    ) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .replace_one_with_session(filter.to_document(), doc, None, &mut self.session)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.session.commit_transaction().await?;
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        self.session.abort_transaction().await?;
        Ok(())
    }
}
