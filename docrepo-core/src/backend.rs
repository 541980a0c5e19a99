//! Storage backend abstraction.
//!
//! A backend owns the connection to a document store and performs single
//! round-trip operations against a named collection. Repositories never talk
//! to a driver directly; every operation goes through [`StoreBackend`].
//!
//! # Traits
//!
//! - [`StoreBackend`]: the operations a repository needs from a store
//! - [`Connect`]: opens a backend from [`ConnectionSettings`]
//! - [`StoreBackendBuilder`]: factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docrepo::backend::StoreBackend;
//! use bson::{doc, oid::ObjectId};
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = ObjectId::new();
//! backend.insert_document("User", id, doc! { "name": "Alice" }).await?;
//! assert_eq!(backend.count_documents("User", None).await?, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::{fmt::Debug, sync::Arc};

use crate::{
    entity::ID_FIELD,
    error::DocumentStoreResult,
    query::{Expr, Query},
    settings::ConnectionSettings,
};

/// Result of a replace operation, mirroring what document stores report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Number of documents that matched the identifier.
    pub matched: u64,
    /// Number of matched documents whose content actually changed.
    pub modified: u64,
    /// Identifier of the document created by an upsert, if one was created.
    pub upserted_id: Option<ObjectId>,
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and tolerate concurrent calls from
/// multiple tasks. Connection pooling, if any, is the backend's concern.
///
/// # Identifiers
///
/// Every document written through a backend is stamped with its identifier
/// under the `_id` key, replacing whatever value the caller put there.
///
/// # Error Handling
///
/// Driver failures are returned as
/// [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend)
/// with the driver error as source. Backends do not retry.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a new document. Fails if a document with the same identifier exists.
    async fn insert_document(
        &self,
        collection: &str,
        id: ObjectId,
        document: Document,
    ) -> DocumentStoreResult<()>;

    /// Replaces the document with the given identifier.
    ///
    /// When nothing matches and `upsert` is set, the document is inserted and
    /// its identifier reported in [`ReplaceOutcome::upserted_id`].
    async fn replace_document(
        &self,
        collection: &str,
        id: ObjectId,
        document: Document,
        upsert: bool,
    ) -> DocumentStoreResult<ReplaceOutcome>;

    /// Deletes the document with the given identifier and returns how many were removed.
    ///
    /// A missing document is not an error; the count is simply `0`.
    async fn delete_document(&self, collection: &str, id: ObjectId) -> DocumentStoreResult<u64>;

    /// Counts the documents matching `filter`, or every document when `filter` is `None`.
    async fn count_documents(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> DocumentStoreResult<u64>;

    /// Returns the documents selected by `query`, in the order the store yields them.
    async fn find_documents(
        &self,
        collection: &str,
        query: Query,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Lists the names of all collections in the database.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Drops a collection and all its documents. Dropping a missing collection succeeds.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Releases backend resources. The default implementation is a no-op.
    async fn shutdown(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    async fn insert_document(
        &self,
        collection: &str,
        id: ObjectId,
        document: Document,
    ) -> DocumentStoreResult<()> {
        (**self)
            .insert_document(collection, id, document)
            .await
    }

    async fn replace_document(
        &self,
        collection: &str,
        id: ObjectId,
        document: Document,
        upsert: bool,
    ) -> DocumentStoreResult<ReplaceOutcome> {
        (**self)
            .replace_document(collection, id, document, upsert)
            .await
    }

    async fn delete_document(&self, collection: &str, id: ObjectId) -> DocumentStoreResult<u64> {
        (**self).delete_document(collection, id).await
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> DocumentStoreResult<u64> {
        (**self).count_documents(collection, filter).await
    }

    async fn find_documents(
        &self,
        collection: &str,
        query: Query,
    ) -> DocumentStoreResult<Vec<Document>> {
        (**self).find_documents(collection, query).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        (**self).list_collections().await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        (**self).drop_collection(name).await
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        (**self).shutdown().await
    }
}

/// Opens a backend from connection settings.
#[async_trait]
pub trait Connect: StoreBackend + Sized {
    async fn connect(settings: &ConnectionSettings) -> DocumentStoreResult<Self>;
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}

/// Returns `document` with `_id` set to `id` as its first key.
pub fn stamp_id(id: ObjectId, document: Document) -> Document {
    std::iter::once((ID_FIELD.to_string(), id.into()))
        .chain(
            document
                .into_iter()
                .filter(|(key, _)| key != ID_FIELD),
        )
        .collect()
}
