//! Models and records - the conversion layer between application values and
//! their persisted representation.
//!
//! A [`Record`] is what the store holds; a [`Model`] is what the rest of the
//! application works with. Each model names exactly one record type and the
//! two convert into each other with pure functions.
//!
//! ## Example
//!
//! ```ignore
//! use record_store::{Model, Persistable, Record};
//!
//! #[derive(Clone, Serialize, Deserialize, Persistable)]
//! #[persistable(collection = "users")]
//! struct UserRecord {
//!     id: String,
//!     name: String,
//! }
//!
//! #[derive(Clone, PartialEq)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Record for UserRecord {
//!     type Model = User;
//!     fn to_model(&self) -> User {
//!         User { id: self.id.clone(), name: self.name.clone() }
//!     }
//! }
//!
//! impl Model for User {
//!     type Record = UserRecord;
//!     fn to_record(&self) -> UserRecord {
//!         UserRecord { id: self.id.clone(), name: self.name.clone() }
//!     }
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be written to a store.
pub trait Persistable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name for this record type (e.g., "users", "downloads").
    /// Maps to an object type in an object store, a table in SQL, a key prefix in KV stores.
    const COLLECTION: &'static str;

    /// Returns the primary key of this record.
    fn id(&self) -> &str;
}

/// A persisted representation that converts to an application model.
///
/// `to_model` must be total and must not perform I/O.
pub trait Record: Persistable {
    type Model: Model;

    fn to_model(&self) -> Self::Model;
}

/// An application-facing value backed by exactly one record type.
///
/// For every record `r` the store can hold, `r.to_model().to_record()` must
/// be field-for-field equal to `r`.
pub trait Model: Clone + Send + Sync + 'static {
    type Record: Record<Model = Self>;

    fn to_record(&self) -> Self::Record;
}
