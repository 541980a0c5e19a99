//! In-memory document storage backend for docrepo.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and tests that should not depend on a running database server.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Store-like results** - Duplicate inserts fail, replaces report matched/modified counts
//! - **Full filter support** - Evaluates every filter operator, including dotted paths
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = DbContext::from_backend(InMemoryStore::new());
//!     let users = EntityRepository::<User, _>::new(&context).await?;
//!
//!     let mut user = User { id: empty_id(), name: "Alice".to_string() };
//!     users.insert(&mut user).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
