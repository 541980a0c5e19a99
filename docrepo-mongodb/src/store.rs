use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, doc, oid::ObjectId};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::{info, trace};
use docrepo_core::{
    backend::{Connect, ReplaceOutcome, StoreBackend, StoreBackendBuilder, stamp_id},
    entity::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query, QueryVisitor, SortDirection},
    settings::ConnectionSettings,
};

use crate::query::MongoQueryTranslator;


/// MongoDB backend.
///
/// Holds a driver [`Client`] and a database name. Collections are looked up on
/// every call; the driver pools connections and caches nothing else that this
/// backend relies on.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn translate(filter: Option<&Expr>) -> DocumentStoreResult<Document> {
        let translated = match filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        trace!(filter = %translated, "translated filter");

        Ok(translated)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, collection: &str, id: ObjectId, document: Document) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .insert_one(stamp_id(id, document))
            .await
            .map_err(DocumentStoreError::backend)?;

        Ok(())
    }

    async fn replace_document(
        &self,
        collection: &str,
        id: ObjectId,
        document: Document,
        upsert: bool,
    ) -> DocumentStoreResult<ReplaceOutcome> {
        let result = self.get_collection(collection)
            .replace_one(doc! { ID_FIELD: id }, stamp_id(id, document))
            .upsert(upsert)
            .await
            .map_err(DocumentStoreError::backend)?;

        Ok(ReplaceOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: match result.upserted_id {
                Some(Bson::ObjectId(upserted)) => Some(upserted),
                Some(_) | None => None,
            },
        })
    }

    async fn delete_document(&self, collection: &str, id: ObjectId) -> DocumentStoreResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_one(doc! { ID_FIELD: id })
                .await
                .map_err(DocumentStoreError::backend)?
                .deleted_count
        )
    }

    async fn count_documents(&self, collection: &str, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        self.get_collection(collection)
            .count_documents(Self::translate(filter.as_ref())?)
            .await
            .map_err(DocumentStoreError::backend)
    }

    async fn find_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            })
        }

        self.get_collection(collection)
            .find(Self::translate(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(DocumentStoreError::backend)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(DocumentStoreError::backend)
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(DocumentStoreError::backend)
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(DocumentStoreError::backend)?;

        Ok(())
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        info!(database = %self.database, "shutting down mongodb client");

        self.client.clone().shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl Connect for MongoDbStore {
    async fn connect(settings: &ConnectionSettings) -> DocumentStoreResult<Self> {
        MongoDbStore::builder(settings.connection_string(), settings.database_name())
            .build()
            .await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        info!(database = %self.database, "connected mongodb client");

        Ok(MongoDbStore::new(client, self.database))
    }
}
