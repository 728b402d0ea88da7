//! Document persistence.
//!
//! Every resource is stored as a JSON object inside a [`Collection`]. Stores
//! assign the document id (a ULID string) on insert and expose it to clients as
//! the `_id` field. Collections may declare a unique field; a store rejects an
//! insert that would duplicate it with [`StoreError::Conflict`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

/// Field name under which the document id is exposed.
pub const ID_FIELD: &str = "_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Composers,
    Persons,
    Teams,
    Customers,
    Users,
}

impl Collection {
    pub const ALL: [Self; 5] = [
        Self::Composers,
        Self::Persons,
        Self::Teams,
        Self::Customers,
        Self::Users,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Composers => "composers",
            Self::Persons => "persons",
            Self::Teams => "teams",
            Self::Customers => "customers",
            Self::Users => "users",
        }
    }

    /// Document field that must be unique across the collection, if any.
    #[must_use]
    pub const fn unique_field(self) -> Option<&'static str> {
        match self {
            Self::Users => Some("username"),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}: duplicate value for unique field {field}")]
    Conflict {
        collection: Collection,
        field: &'static str,
    },
    #[error("document body must be a JSON object")]
    NotAnObject,
    #[error("{collection}: field {field} is not an array")]
    NotAnArray {
        collection: Collection,
        field: String,
    },
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored document: its id plus the JSON object body (without `_id`).
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Map<String, Value>,
}

impl Document {
    /// Build a document from an id and a body, dropping any `_id` in the body.
    ///
    /// # Errors
    /// Returns [`StoreError::NotAnObject`] if `body` is not a JSON object.
    pub fn new(id: String, body: Value) -> Result<Self, StoreError> {
        match body {
            Value::Object(mut body) => {
                body.remove(ID_FIELD);
                Ok(Self { id, body })
            }
            _ => Err(StoreError::NotAnObject),
        }
    }

    /// JSON representation with the id merged in as `_id`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = Map::with_capacity(self.body.len() + 1);
        body.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        body.extend(self.body.clone());
        Value::Object(body)
    }

    /// Decode the document into a typed record.
    ///
    /// # Errors
    /// Returns [`StoreError::Decode`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Stored<T>, StoreError> {
        Ok(serde_json::from_value(self.to_json())?)
    }

    /// String value of a top-level field, used for lookups.
    #[must_use]
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }
}

/// A typed record together with its store id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stored<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub record: T,
}

/// Serialize a typed record into a document body.
///
/// # Errors
/// Returns an error if `record` does not serialize to a JSON object.
pub fn to_body<T: Serialize>(record: &T) -> Result<Value, StoreError> {
    let value = serde_json::to_value(record)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(StoreError::NotAnObject)
    }
}

/// Generic document-store collaborator shared by all handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return it with its assigned id.
    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError>;

    /// All documents of a collection in insertion order.
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// First document whose top-level string `field` equals `value`.
    async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Replace the body of an existing document. `None` when the id is unknown.
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        body: Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Append `value` to the array `field` of a document as one atomic update,
    /// creating the array when the field is absent. `None` when the id is unknown.
    async fn push(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Remove a document and return what was removed. `None` when the id is unknown.
    async fn delete(&self, collection: Collection, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// New document id.
#[must_use]
pub fn new_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}
