//! In-process store

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, mpsc};

use crate::store::{
    Batch, Collection, Document, DocumentStore, Snapshot, StoreError, Subscription, Write, remove,
    upsert,
};

#[derive(Debug, Default)]
struct State {
    collections: FxHashMap<Collection, Vec<Document>>,
    subscribers: Vec<(Collection, mpsc::UnboundedSender<Snapshot>)>,
}

impl State {
    fn snapshot(&self, collection: Collection) -> Snapshot {
        Snapshot {
            collection,
            documents: self
                .collections
                .get(&collection)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn notify(&mut self, collection: Collection) {
        let snapshot = self.snapshot(collection);

        self.subscribers.retain(|(subscribed, sender)| {
            *subscribed != collection || sender.send(snapshot.clone()).is_ok()
        });
    }
}

/// Documents held in memory, optionally pushing changes to subscribers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    push: bool,
    state: Mutex<State>,
}

impl MemoryStore {
    /// A store without push support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that pushes a snapshot to subscribers after every change.
    #[must_use]
    pub fn with_push() -> Self {
        Self {
            push: true,
            state: Mutex::default(),
        }
    }

    /// Number of live subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock().await;

        state.subscribers.retain(|(_, sender)| !sender.is_closed());
        state.subscribers.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        Ok(self.state.lock().await.snapshot(collection).documents)
    }

    async fn put(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let mut batch = Batch::new();
        batch.put(collection, document);

        self.commit(batch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut batch = Batch::new();
        batch.delete(collection, id);

        self.commit(batch).await
    }

    async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        for write in batch.writes() {
            match write {
                Write::Put {
                    collection,
                    document,
                } => upsert(
                    state.collections.entry(*collection).or_default(),
                    document.clone(),
                ),
                Write::Delete { collection, id } => {
                    remove(state.collections.entry(*collection).or_default(), id);
                }
            }
        }

        for collection in batch.collections() {
            state.notify(collection);
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<Option<Subscription>, StoreError> {
        if !self.push {
            return Ok(None);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock().await;

        sender
            .send(state.snapshot(collection))
            .map_err(|error| StoreError::Unavailable(error.to_string()))?;

        state.subscribers.push((collection, sender));

        Ok(Some(Subscription::new(receiver)))
    }
}
