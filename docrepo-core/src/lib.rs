//! A typed generic repository layer over BSON document stores.
//!
//! This crate is the core of the docrepo project and provides:
//!
//! - **Entities** ([`entity`]) - The trait every stored record implements, identified by an `ObjectId`
//! - **Connection settings** ([`settings`]) - The connection string and database name used to open a store
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Filters and queries** ([`query`]) - Backend-neutral predicates over entity fields
//! - **Collections** ([`collection`]) - Collection handles and the resolver capability
//! - **Database context** ([`context`]) - Lazily initialized holder of the backend handle
//! - **Repositories** ([`repository`]) - Typed CRUD operations over one collection
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: ObjectId,
//!     pub name: String,
//! }
//!
//! let context = DbContext::<InMemoryStore>::with_settings(&settings).await?;
//! let users = EntityRepository::<User, _>::new(&context).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_core;

pub mod backend;
pub mod collection;
pub mod context;
pub mod entity;
pub mod error;
pub mod query;
pub mod repository;
pub mod settings;
