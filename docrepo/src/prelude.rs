//! Convenient re-exports of commonly used types from docrepo.
//!
//! ```ignore
//! use docrepo::prelude::*;
//! ```

pub use docrepo_core::{
    backend::{Connect, ReplaceOutcome, StoreBackend, StoreBackendBuilder},
    collection::{Collection, CollectionResolver},
    context::DbContext,
    entity::{Entity, EntityExt, empty_id},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    repository::{EntityRepository, WriteOutcome},
    settings::ConnectionSettings,
};
pub use docrepo_macros::Entity;
