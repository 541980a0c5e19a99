//! MongoDB backend implementation for docrepo.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait
//! on top of the official async driver. Filters are translated into MongoDB
//! query documents and executed by the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docrepo = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Collections
//!
//! Each entity type maps to a collection named exactly like the type. Names
//! are passed to the server unchanged.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::{prelude::*, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConnectionSettings::new("mongodb://localhost:27017", "my_database");
//!     let context = DbContext::<MongoDbStore>::with_settings(&settings).await?;
//!
//!     let users = EntityRepository::<User, _>::new(&context).await?;
//!     println!("{} users", users.count().await?);
//!
//!     context.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_mongodb;

pub mod store;
pub(crate) mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
