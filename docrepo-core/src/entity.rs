//! Core traits for entity representation and serialization.
//!
//! Every record managed by a repository is an [`Entity`]: a serde type carrying a
//! 12-byte [`ObjectId`] identifier and living in exactly one collection.

use bson::{Bson, Document, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Document key under which the entity identifier is stored.
pub const ID_FIELD: &str = "_id";

/// Returns the all-zero identifier, which marks an entity that has not been persisted yet.
pub fn empty_id() -> ObjectId {
    ObjectId::from_bytes([0; 12])
}

/// Core trait that all entities stored through a repository must implement.
///
/// The identifier is stored under `_id`. An entity whose identifier equals
/// [`empty_id()`] is considered new; repositories assign a fresh identifier on
/// insert.
///
/// The collection name defaults to the unqualified type name, case as declared,
/// so `User` lives in the `User` collection.
///
/// # Example
///
/// ```ignore
/// use docrepo::entity::Entity;
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id")]
///     pub id: ObjectId,
///     pub name: String,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> ObjectId {
///         self.id
///     }
///
///     fn set_id(&mut self, id: ObjectId) {
///         self.id = id;
///     }
/// }
/// ```
pub trait Entity: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns this entity's identifier.
    fn id(&self) -> ObjectId;

    /// Replaces this entity's identifier.
    fn set_id(&mut self, id: ObjectId);

    /// Returns the name of the collection this entity belongs to.
    fn collection_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Returns `true` if this entity carries a non-empty identifier.
    fn is_persisted(&self) -> bool {
        self.id() != empty_id()
    }
}

/// Extension trait providing conversions for entities.
///
/// Automatically implemented for every [`Entity`].
pub trait EntityExt: Entity {
    /// Converts this entity into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the entity does not serialize to a document.
    fn to_document(&self) -> DocumentStoreResult<Document>;

    /// Creates an entity from a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    fn from_document(document: Document) -> DocumentStoreResult<Self>;

    /// Converts this entity to a JSON value.
    fn to_json(&self) -> DocumentStoreResult<Value>;

    /// Creates an entity from a JSON value.
    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> DocumentStoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "{} serialized to {:?}, expected a document",
                E::collection_name(),
                other.element_type()
            ))),
        }
    }

    fn from_document(document: Document) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// Returns the type name of `T` without its module path or generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);

    base.rsplit("::").next().unwrap_or(base)
}
