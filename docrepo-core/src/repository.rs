//! Generic repository over a single entity collection.
//!
//! [`EntityRepository`] maps typed CRUD operations onto one round trip each
//! against the collection it resolved at construction time.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::prelude::*;
//!
//! let repository = EntityRepository::<User, _>::new(&context).await?;
//!
//! let mut user = User::named("Test");
//! repository.insert(&mut user).await?;
//! assert_eq!(repository.count().await?, 1);
//!
//! let found = repository.search_for(Filter::eq("name", "Test")).await?;
//! assert_eq!(found.len(), 1);
//!
//! repository.delete(&user).await?;
//! assert_eq!(repository.count().await?, 0);
//! ```

use bson::oid::ObjectId;
use std::marker::PhantomData;
use tracing::debug;

use crate::{
    backend::StoreBackend,
    collection::{Collection, CollectionResolver},
    entity::{Entity, EntityExt},
    error::DocumentStoreResult,
    query::{Expr, Query},
};

/// What a [`EntityRepository::save`] call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new document was created, either by insert or by upsert.
    Inserted,
    /// An existing document was replaced with different content.
    Updated,
    /// An existing document matched but its content was already identical.
    Unchanged,
}

/// Typed repository for entities of type `E` stored through backend `B`.
#[derive(Debug)]
pub struct EntityRepository<E: Entity, B: StoreBackend> {
    collection: Collection<B>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, B: StoreBackend> Clone for EntityRepository<E, B> {
    fn clone(&self) -> Self {
        Self::from_collection(self.collection.clone())
    }
}

impl<E: Entity, B: StoreBackend> EntityRepository<E, B> {
    /// Creates a repository bound to the collection `resolver` yields for `E`.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error, e.g.
    /// [`NotInitialized`](crate::error::DocumentStoreError::NotInitialized)
    /// from an empty context.
    pub async fn new<R>(resolver: &R) -> DocumentStoreResult<Self>
    where
        R: CollectionResolver<Backend = B>,
    {
        Ok(Self::from_collection(resolver.resolve::<E>().await?))
    }

    /// Creates a repository over an already resolved collection.
    pub fn from_collection(collection: Collection<B>) -> Self {
        Self { collection, _entity: PhantomData }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    pub fn collection(&self) -> &Collection<B> {
        &self.collection
    }

    /// Assigns a fresh identifier to `entity` and inserts it.
    ///
    /// Any identifier the entity carried before is overwritten. Returns `true`
    /// once the store has acknowledged the insert; store failures are returned
    /// as errors rather than `false`.
    pub async fn insert(&self, entity: &mut E) -> DocumentStoreResult<bool> {
        let id = ObjectId::new();
        entity.set_id(id);

        debug!(collection = self.collection_name(), %id, "inserting entity");

        self.collection
            .insert(id, entity.to_document()?)
            .await?;

        Ok(true)
    }

    /// Inserts a new entity, or replaces the stored document with the same identifier.
    ///
    /// An entity without an identifier is inserted as by [`insert`](Self::insert)
    /// and the insert result is returned. Otherwise the stored document is
    /// replaced, creating it if absent, and the result is `true` only when an
    /// existing document was modified: a document created by the upsert, or a
    /// replacement identical to the stored content, both yield `false`. Use
    /// [`save`](Self::save) to tell those cases apart.
    pub async fn update(&self, entity: &mut E) -> DocumentStoreResult<bool> {
        if !entity.is_persisted() {
            return self.insert(entity).await;
        }

        Ok(self.save(entity).await? == WriteOutcome::Updated)
    }

    /// Inserts or upserts `entity` and reports exactly what happened.
    pub async fn save(&self, entity: &mut E) -> DocumentStoreResult<WriteOutcome> {
        if !entity.is_persisted() {
            self.insert(entity).await?;
            return Ok(WriteOutcome::Inserted);
        }

        let id = entity.id();

        debug!(collection = self.collection_name(), %id, "replacing entity");

        let outcome = self.collection
            .replace(id, entity.to_document()?, true)
            .await?;

        Ok(if outcome.upserted_id.is_some() {
            WriteOutcome::Inserted
        } else if outcome.modified > 0 {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Unchanged
        })
    }

    /// Deletes the stored document matching `entity`'s identifier.
    ///
    /// Returns `true` if exactly one document was removed.
    pub async fn delete(&self, entity: &E) -> DocumentStoreResult<bool> {
        self.delete_by_id(entity.id()).await
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> DocumentStoreResult<bool> {
        debug!(collection = self.collection_name(), %id, "deleting entity");

        Ok(self.collection.delete(id).await? == 1)
    }

    /// Counts every document in the collection.
    pub async fn count(&self) -> DocumentStoreResult<u64> {
        self.collection.count(None).await
    }

    /// Counts the documents matching `filter`.
    pub async fn count_where(&self, filter: Expr) -> DocumentStoreResult<u64> {
        self.collection.count(Some(filter)).await
    }

    /// Loads the whole collection, in the order the store returns it.
    pub async fn get_all(&self) -> DocumentStoreResult<Vec<E>> {
        self.find(Query::new()).await
    }

    /// Returns the entities matching `filter`, in the order the store returns them.
    pub async fn search_for(&self, filter: Expr) -> DocumentStoreResult<Vec<E>> {
        self.find(Query::from(filter)).await
    }

    /// Runs a query with optional sort, limit and offset.
    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<E>> {
        debug!(collection = self.collection_name(), ?query, "querying entities");

        self.collection
            .find(query)
            .await?
            .into_iter()
            .map(E::from_document)
            .collect()
    }

    /// Returns the entity with the given identifier, or `None` if nothing matches.
    pub async fn get_single(&self, id: ObjectId) -> DocumentStoreResult<Option<E>> {
        debug!(collection = self.collection_name(), %id, "loading entity");

        self.collection
            .find_by_id(id)
            .await?
            .map(E::from_document)
            .transpose()
    }
}
