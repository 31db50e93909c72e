//! File-backed store
//!
//! One JSON file per collection, named after the collection's storage key.
//! Files are replaced atomically by writing a sibling temp file and renaming it
//! over the original.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::{fs, sync::Mutex};

use crate::store::{
    Batch, Collection, Document, DocumentStore, StoreError, Subscription, Write, remove, upsert,
};

/// JSON files under a data directory. Cannot push.
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    /// Store files under `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// Data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.storage_key()))
    }

    async fn read(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        match fs::read(self.path(collection)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn write(&self, collection: Collection, documents: &[Document]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path(collection);
        let temp = path.with_extension("json.tmp");

        fs::write(&temp, serde_json::to_vec_pretty(documents)?).await?;
        fs::rename(&temp, &path).await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let _guard = self.lock.lock().await;

        self.read(collection).await
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
        let _guard = self.lock.lock().await;

        let mut staged: FxHashMap<Collection, Vec<Document>> = FxHashMap::default();

        for collection in batch.collections() {
            staged.insert(collection, self.read(collection).await?);
        }

        for write in batch.writes() {
            match write {
                Write::Put {
                    collection,
                    document,
                } => {
                    if let Some(documents) = staged.get_mut(collection) {
                        upsert(documents, document.clone());
                    }
                }
                Write::Delete { collection, id } => {
                    if let Some(documents) = staged.get_mut(collection) {
                        remove(documents, id);
                    }
                }
            }
        }

        for collection in batch.collections() {
            if let Some(documents) = staged.get(&collection) {
                self.write(collection, documents).await?;
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        _collection: Collection,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(None)
    }
}
