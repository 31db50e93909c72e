//! Document store
//!
//! Every backend stores JSON documents keyed by `(collection, id)`. Backends
//! that can push changes hand out a [`Subscription`] that yields the complete
//! current contents of a collection after every change.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

pub mod local;
pub mod memory;
pub mod postgres;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Catalog parts, one document per part id
    Parts,

    /// Categories, one document per category name
    Categories,

    /// The session cart, a single document
    Cart,

    /// Placed orders, one document per order id
    Orders,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 4] = [Self::Parts, Self::Categories, Self::Cart, Self::Orders];

    /// Collection name used in the database and notification payloads.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Parts => "parts",
            Self::Categories => "categories",
            Self::Cart => "cart",
            Self::Orders => "orders",
        }
    }

    /// Well-known key for file-backed storage.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Parts => "gamepart_inventory_v1",
            Self::Categories => "gamepart_categories_v1",
            Self::Cart => "gamepart_cart_v1",
            Self::Orders => "gamepart_orders_v1",
        }
    }

    /// Reverse of [`Collection::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.name() == name)
    }
}

/// A stored JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, unique within its collection
    pub id: String,

    /// Document body
    pub body: serde_json::Value,
}

impl Document {
    /// Serialize `value` into a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] when `value` cannot be represented as JSON.
    pub fn encode<T: Serialize>(id: impl Into<String>, value: &T) -> Result<Self, StoreError> {
        Ok(Self {
            id: id.into(),
            body: serde_json::to_value(value)?,
        })
    }

    /// Deserialize the document body.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] when the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(T::deserialize(&self.body)?)
    }
}

/// Deserialize every document of a delivery.
///
/// # Errors
///
/// Fails on the first malformed document.
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Result<Vec<T>, StoreError> {
    documents.iter().map(Document::decode).collect()
}

/// A single write within a [`Batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Insert or replace a document
    Put {
        /// Target collection
        collection: Collection,
        /// Document to write
        document: Document,
    },

    /// Delete a document if present
    Delete {
        /// Target collection
        collection: Collection,
        /// Document id
        id: String,
    },
}

/// Writes applied together. Backends that push deliver one snapshot per
/// touched collection once the whole batch is stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    writes: Vec<Write>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put.
    pub fn put(&mut self, collection: Collection, document: Document) -> &mut Self {
        self.writes.push(Write::Put {
            collection,
            document,
        });

        self
    }

    /// Queue a delete.
    pub fn delete(&mut self, collection: Collection, id: impl Into<String>) -> &mut Self {
        self.writes.push(Write::Delete {
            collection,
            id: id.into(),
        });

        self
    }

    /// Queued writes, in order.
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Distinct collections touched, in first-touched order.
    pub fn collections(&self) -> Vec<Collection> {
        let mut collections = Vec::new();

        for write in &self.writes {
            let collection = match write {
                Write::Put { collection, .. } | Write::Delete { collection, .. } => *collection,
            };

            if !collections.contains(&collection) {
                collections.push(collection);
            }
        }

        collections
    }
}

/// Replace the document with the same id in place, or append it.
pub(crate) fn upsert(documents: &mut Vec<Document>, document: Document) {
    match documents.iter_mut().find(|existing| existing.id == document.id) {
        Some(existing) => *existing = document,
        None => documents.push(document),
    }
}

/// Remove the document with the given id, if present.
pub(crate) fn remove(documents: &mut Vec<Document>, id: &str) {
    documents.retain(|document| document.id != id);
}

/// A push delivery: the complete current contents of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Delivered collection
    pub collection: Collection,

    /// Every document in the collection
    pub documents: Vec<Document>,
}

/// Live feed of snapshots for one collection. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a receiver fed by the store itself.
    #[must_use]
    pub fn new(receiver: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self {
            receiver,
            task: None,
        }
    }

    /// Wrap a receiver fed by a background task that is aborted on drop.
    #[must_use]
    pub fn with_task(receiver: mpsc::UnboundedReceiver<Snapshot>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task: Some(task),
        }
    }

    /// Wait for the next delivery. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or failed the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the operation for lack of privileges.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A document could not be converted to or from JSON.
    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this is [`StoreError::PermissionDenied`].
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(error.to_string()),
            _ => Self::Unavailable(error.to_string()),
        }
    }
}

/// Persistent document storage.
#[automock]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection, in insertion order.
    async fn get_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Insert or replace one document.
    async fn put(&self, collection: Collection, document: Document) -> Result<(), StoreError>;

    /// Delete one document. Deleting a missing document succeeds.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Apply a batch of writes.
    async fn commit(&self, batch: Batch) -> Result<(), StoreError>;

    /// Subscribe to a collection. `None` when the backend cannot push.
    async fn subscribe(&self, collection: Collection)
    -> Result<Option<Subscription>, StoreError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn storage_keys_are_versioned() {
        assert_eq!(Collection::Parts.storage_key(), "gamepart_inventory_v1");
        assert_eq!(Collection::Categories.storage_key(), "gamepart_categories_v1");
        assert_eq!(Collection::Cart.storage_key(), "gamepart_cart_v1");
    }

    #[test]
    fn collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_name(collection.name()), Some(collection));
        }

        assert_eq!(Collection::from_name("widgets"), None);
    }

    #[test]
    fn batch_reports_touched_collections_once() {
        let mut batch = Batch::new();

        batch
            .delete(Collection::Parts, "a")
            .delete(Collection::Categories, "PS5")
            .delete(Collection::Parts, "b");

        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.collections(),
            [Collection::Parts, Collection::Categories]
        );
    }

    #[test]
    fn decode_rejects_mismatched_bodies() -> TestResult {
        let document = Document::encode("x", &serde_json::json!({ "name": 1 }))?;

        let result = document.decode::<gamepart::catalog::Category>();

        assert!(matches!(result, Err(StoreError::Decode(_))));

        Ok(())
    }

    #[test]
    fn io_permission_errors_map_to_permission_denied() {
        let error = StoreError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));

        assert!(error.is_permission_denied());
    }
}
