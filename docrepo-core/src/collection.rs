//! Collection handles and the capability to resolve them per entity type.
//!
//! A [`Collection`] is a collection name paired with a shared backend handle.
//! A [`CollectionResolver`] produces the collection an entity type lives in;
//! repositories are built from a resolver instead of from raw settings.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::collection::CollectionResolver;
//!
//! let users = context.resolve::<User>().await?;
//! assert_eq!(users.name(), "User");
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::sync::Arc;

use crate::{
    backend::{ReplaceOutcome, StoreBackend},
    entity::Entity,
    error::DocumentStoreResult,
    query::{Expr, Query},
};

/// A named collection bound to a backend handle.
///
/// Cloning is cheap; clones share the same backend.
#[derive(Debug)]
pub struct Collection<B: StoreBackend> {
    name: String,
    backend: Arc<B>,
}

impl<B: StoreBackend> Clone for Collection<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StoreBackend> Collection<B> {
    pub fn new(name: impl Into<String>, backend: Arc<B>) -> Self {
        Self { name: name.into(), backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backend this collection is bound to.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub async fn insert(&self, id: ObjectId, document: Document) -> DocumentStoreResult<()> {
        self.backend
            .insert_document(&self.name, id, document)
            .await
    }

    pub async fn replace(
        &self,
        id: ObjectId,
        document: Document,
        upsert: bool,
    ) -> DocumentStoreResult<ReplaceOutcome> {
        self.backend
            .replace_document(&self.name, id, document, upsert)
            .await
    }

    pub async fn delete(&self, id: ObjectId) -> DocumentStoreResult<u64> {
        self.backend.delete_document(&self.name, id).await
    }

    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        self.backend.count_documents(&self.name, filter).await
    }

    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<Document>> {
        self.backend.find_documents(&self.name, query).await
    }

    /// Returns the first document with the given identifier, if any.
    pub async fn find_by_id(&self, id: ObjectId) -> DocumentStoreResult<Option<Document>> {
        Ok(self
            .find(Query::by_id(id))
            .await?
            .into_iter()
            .next())
    }
}

/// Capability to resolve the collection holding entities of type `E`.
///
/// The collection is named after [`Entity::collection_name`].
#[async_trait]
pub trait CollectionResolver: Send + Sync {
    type Backend: StoreBackend;

    async fn resolve<E: Entity>(&self) -> DocumentStoreResult<Collection<Self::Backend>>;
}

/// A shared backend handle resolves collections directly and never fails.
#[async_trait]
impl<B: StoreBackend> CollectionResolver for Arc<B> {
    type Backend = B;

    async fn resolve<E: Entity>(&self) -> DocumentStoreResult<Collection<B>> {
        Ok(Collection::new(E::collection_name(), Arc::clone(self)))
    }
}
