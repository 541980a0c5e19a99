//! Main docrepo crate providing typed repositories over document stores.
//!
//! This crate is the primary entry point for users of docrepo. It re-exports
//! the core types from the sub-crates, the `Entity` derive macro, and the
//! available storage backends.
//!
//! # Features
//!
//! - **Typed repositories** - Insert, update, delete, count and search any serde entity
//! - **Swappable backends** - In-memory storage for tests, MongoDB for production
//! - **Backend-neutral filters** - One filter API translated or evaluated per backend
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::InMemoryStore};
//! use docrepo::bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: ObjectId,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = ConnectionSettings::new("memory://", "app");
//!     let context = DbContext::<InMemoryStore>::with_settings(&settings).await.unwrap();
//!
//!     // Repositories resolve the collection named after the entity type
//!     let users = EntityRepository::<User, _>::new(&context).await.unwrap();
//!
//!     let mut user = User { id: empty_id(), name: "Alice".to_string() };
//!     users.insert(&mut user).await.unwrap();
//!
//!     let found = users
//!         .search_for(Filter::eq("name", "Alice"))
//!         .await
//!         .unwrap();
//!
//!     println!("Found users: {:?}", found);
//!
//!     context.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Update semantics
//!
//! [`EntityRepository::update`](repository::EntityRepository::update) returns
//! `true` only when it modified an existing document. Use
//! [`save`](repository::EntityRepository::save) to learn whether a document
//! was inserted, updated or left unchanged.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docrepo;

pub mod prelude;

pub use docrepo_core::{backend, collection, context, entity, error, query, repository, settings};
pub use docrepo_macros::Entity;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrepo_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrepo_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
