//! Database context holding the live backend handle.
//!
//! A [`DbContext`] starts empty or initialized from [`ConnectionSettings`].
//! Initializing again replaces the bound handle; repositories created earlier
//! keep the collection they already resolved.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::{context::DbContext, settings::ConnectionSettings};
//! use docrepo::mongodb::MongoDbStore;
//!
//! let settings = ConnectionSettings::new("mongodb://localhost:27017", "shop");
//! let context = DbContext::<MongoDbStore>::with_settings(&settings).await?;
//! let users = EntityRepository::<User, _>::new(&context).await?;
//! ```

use async_trait::async_trait;
use mea::rwlock::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    backend::{Connect, StoreBackend},
    collection::{Collection, CollectionResolver},
    entity::Entity,
    error::{DocumentStoreError, DocumentStoreResult},
    settings::ConnectionSettings,
};

/// Holder of at most one live database handle.
///
/// The handle sits behind an async read/write lock, so initializing and
/// resolving collections from different tasks is safe.
#[derive(Debug)]
pub struct DbContext<B: StoreBackend> {
    backend: RwLock<Option<Arc<B>>>,
}

impl<B: StoreBackend> Default for DbContext<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StoreBackend> DbContext<B> {
    /// Creates a context with no handle bound.
    pub fn new() -> Self {
        Self { backend: RwLock::new(None) }
    }

    /// Creates a context bound to an already constructed backend.
    pub fn from_backend(backend: B) -> Self {
        Self { backend: RwLock::new(Some(Arc::new(backend))) }
    }

    /// Binds `backend`, replacing any handle bound before.
    pub async fn bind(&self, backend: B) {
        *self.backend.write().await = Some(Arc::new(backend));
    }

    pub async fn is_initialized(&self) -> bool {
        self.backend.read().await.is_some()
    }

    /// Returns the bound backend handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotInitialized`] if no handle is bound.
    pub async fn backend(&self) -> DocumentStoreResult<Arc<B>> {
        self.backend
            .read()
            .await
            .clone()
            .ok_or(DocumentStoreError::NotInitialized)
    }

    /// Returns the collection for entity type `E`, named after the type.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotInitialized`] if no handle is bound.
    pub async fn collection<E: Entity>(&self) -> DocumentStoreResult<Collection<B>> {
        self.collection_named(E::collection_name()).await
    }

    /// Returns the collection with the given name.
    pub async fn collection_named(&self, name: &str) -> DocumentStoreResult<Collection<B>> {
        let backend = self.backend().await?;

        debug!(collection = name, "resolved collection");

        Ok(Collection::new(name, backend))
    }

    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend()
            .await?
            .list_collections()
            .await
    }

    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend()
            .await?
            .drop_collection(name)
            .await
    }

    /// Shuts the bound backend down and unbinds it.
    ///
    /// Shutting down an empty context is a no-op.
    pub async fn shutdown(&self) -> DocumentStoreResult<()> {
        let backend = self.backend.write().await.take();

        if let Some(backend) = backend {
            backend.shutdown().await?;
        }

        Ok(())
    }
}

impl<B: Connect> DbContext<B> {
    /// Creates a context and initializes it from `settings`.
    pub async fn with_settings(settings: &ConnectionSettings) -> DocumentStoreResult<Self> {
        let context = Self::new();
        context.initialize(settings).await?;

        Ok(context)
    }

    /// Connects a backend from `settings` and binds it, replacing any previous handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::MissingSettings`] when `settings` is `None`,
    /// or the backend's error when connecting fails. A failed initialization
    /// leaves the previously bound handle in place.
    pub async fn initialize<'a>(
        &self,
        settings: impl Into<Option<&'a ConnectionSettings>>,
    ) -> DocumentStoreResult<()> {
        let settings = settings
            .into()
            .ok_or(DocumentStoreError::MissingSettings)?;
        let backend = B::connect(settings).await?;

        info!(database = settings.database_name(), "database context initialized");

        self.bind(backend).await;

        Ok(())
    }
}

#[async_trait]
impl<B: StoreBackend> CollectionResolver for DbContext<B> {
    type Backend = B;

    async fn resolve<E: Entity>(&self) -> DocumentStoreResult<Collection<B>> {
        self.collection::<E>().await
    }
}
