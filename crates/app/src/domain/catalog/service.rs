//! Catalog service.

use std::sync::Arc;

use async_trait::async_trait;
use gamepart::{
    catalog::{Catalog, CatalogChange, CatalogError, Category},
    fixtures::default_catalog,
    parts::{Part, PartData, PartId},
    replica::{Replica, SyncMode},
};
use mockall::automock;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    domain::catalog::errors::CatalogServiceError,
    store::{
        Batch, Collection, Document, DocumentStore, Snapshot, StoreError, Subscription, decode_all,
    },
};

/// Catalog backed by a [`DocumentStore`].
///
/// Mutations hold the replica lock until their writes settle, so conflicting
/// edits from the same process are applied one after another.
pub struct StoreCatalogService {
    store: Arc<dyn DocumentStore>,
    replica: Mutex<Replica>,
    revision: watch::Sender<u64>,
}

impl std::fmt::Debug for StoreCatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCatalogService")
            .field("revision", &*self.revision.borrow())
            .finish_non_exhaustive()
    }
}

impl StoreCatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, replica: Replica) -> Self {
        Self {
            store,
            replica: Mutex::new(replica),
            revision: watch::Sender::new(0),
        }
    }

    /// Load the catalog from `store`, seeding a fresh store with the default
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read, holds malformed
    /// documents, or rejects the seed.
    pub async fn load(
        store: Arc<dyn DocumentStore>,
        mode: SyncMode,
    ) -> Result<Self, CatalogServiceError> {
        let parts = store.get_all(Collection::Parts).await?;
        let categories = store.get_all(Collection::Categories).await?;

        let catalog = if parts.is_empty() && categories.is_empty() {
            let seed = default_catalog()?;

            store.commit(seed_batch(&seed)?).await?;

            info!(
                parts = seed.parts().len(),
                categories = seed.category_entries().len(),
                "seeded empty store with default catalog"
            );

            seed
        } else {
            let mut catalog = Catalog::new();

            catalog.apply_categories_snapshot(decode_all::<Category>(&categories)?);
            catalog.apply_parts_snapshot(decode_all::<Part>(&parts)?);

            catalog
        };

        Ok(Self::new(store, Replica::new(mode, catalog)))
    }

    async fn mutate<F>(&self, mutation: F) -> Result<CatalogChange, CatalogServiceError>
    where
        F: FnOnce(&mut Catalog) -> Result<CatalogChange, CatalogError> + Send,
    {
        let mut replica = self.replica.lock().await;

        let change = replica.stage(mutation)?;

        let stored = match change_batch(&change) {
            Ok(batch) => self.store.commit(batch).await,
            Err(error) => Err(error),
        };

        match stored {
            Ok(()) => {
                replica.acknowledge();

                if replica.mode() == SyncMode::Optimistic {
                    self.bump_revision();
                }

                info!(event = ?change.event, writes = change.write_count(), "catalog change stored");

                Ok(change)
            }
            Err(error) => {
                replica.rollback();

                warn!(%error, event = ?change.event, "catalog change rolled back");

                Err(error.into())
            }
        }
    }

    fn bump_revision(&self) {
        self.revision
            .send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

fn seed_batch(catalog: &Catalog) -> Result<Batch, StoreError> {
    let mut batch = Batch::new();

    for category in catalog.category_entries() {
        batch.put(
            Collection::Categories,
            Document::encode(category.name.clone(), category)?,
        );
    }

    for part in catalog.parts() {
        batch.put(Collection::Parts, Document::encode(part.id.to_string(), part)?);
    }

    Ok(batch)
}

/// Exactly the documents a change touched.
fn change_batch(change: &CatalogChange) -> Result<Batch, StoreError> {
    let mut batch = Batch::new();

    for part in &change.upserted_parts {
        batch.put(Collection::Parts, Document::encode(part.id.to_string(), part)?);
    }

    for id in &change.removed_parts {
        batch.delete(Collection::Parts, id.to_string());
    }

    for name in &change.removed_categories {
        batch.delete(Collection::Categories, name.clone());
    }

    for category in &change.upserted_categories {
        batch.put(
            Collection::Categories,
            Document::encode(category.name.clone(), category)?,
        );
    }

    Ok(batch)
}

#[async_trait]
impl CatalogService for StoreCatalogService {
    async fn catalog(&self) -> Catalog {
        self.replica.lock().await.view().clone()
    }

    async fn add_category(&self, name: String) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.add_category(&name)).await
    }

    async fn rename_category(
        &self,
        from: String,
        to: String,
    ) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.rename_category(&from, &to))
            .await
    }

    async fn delete_category(&self, name: String) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.delete_category(&name)).await
    }

    async fn create_part(&self, data: PartData) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.create_part(data)).await
    }

    async fn update_part(
        &self,
        id: PartId,
        data: PartData,
    ) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.update_part(id, data)).await
    }

    async fn delete_part(&self, id: PartId) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.delete_part(id)).await
    }

    async fn rename_subcategory(
        &self,
        category: String,
        from: String,
        to: String,
    ) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.rename_subcategory(&category, &from, &to))
            .await
    }

    async fn delete_subcategory(
        &self,
        category: String,
        subcategory: String,
    ) -> Result<CatalogChange, CatalogServiceError> {
        self.mutate(|catalog| catalog.delete_subcategory(&category, &subcategory))
            .await
    }

    async fn apply_snapshot(&self, snapshot: Snapshot) -> Result<(), CatalogServiceError> {
        let mut replica = self.replica.lock().await;

        match snapshot.collection {
            Collection::Parts => {
                replica.apply_parts_snapshot(decode_all(&snapshot.documents)?);
            }
            Collection::Categories => {
                replica.apply_categories_snapshot(decode_all(&snapshot.documents)?);
            }
            Collection::Cart | Collection::Orders => return Ok(()),
        }

        debug!(
            collection = snapshot.collection.name(),
            documents = snapshot.documents.len(),
            "applied snapshot"
        );

        self.bump_revision();

        Ok(())
    }

    fn revisions(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// The catalog readers should currently see.
    async fn catalog(&self) -> Catalog;

    /// Appends a category.
    async fn add_category(&self, name: String) -> Result<CatalogChange, CatalogServiceError>;

    /// Renames a category and every part in it.
    async fn rename_category(
        &self,
        from: String,
        to: String,
    ) -> Result<CatalogChange, CatalogServiceError>;

    /// Deletes a category and every part in it.
    async fn delete_category(&self, name: String) -> Result<CatalogChange, CatalogServiceError>;

    /// Creates a part with a fresh id.
    async fn create_part(&self, data: PartData) -> Result<CatalogChange, CatalogServiceError>;

    /// Replaces the editable fields of a part.
    async fn update_part(
        &self,
        id: PartId,
        data: PartData,
    ) -> Result<CatalogChange, CatalogServiceError>;

    /// Deletes a part.
    async fn delete_part(&self, id: PartId) -> Result<CatalogChange, CatalogServiceError>;

    /// Renames a subcategory within a category.
    async fn rename_subcategory(
        &self,
        category: String,
        from: String,
        to: String,
    ) -> Result<CatalogChange, CatalogServiceError>;

    /// Deletes every part in a subcategory.
    async fn delete_subcategory(
        &self,
        category: String,
        subcategory: String,
    ) -> Result<CatalogChange, CatalogServiceError>;

    /// Replaces a whole collection with a store delivery.
    async fn apply_snapshot(&self, snapshot: Snapshot) -> Result<(), CatalogServiceError>;

    /// Counter bumped whenever the visible catalog changes.
    fn revisions(&self) -> watch::Receiver<u64>;
}

/// Background tasks feeding store deliveries into a catalog service. Dropping
/// the listener stops the tasks and releases their subscriptions.
#[derive(Debug)]
pub struct CatalogListener {
    tasks: Vec<JoinHandle<()>>,
}

impl CatalogListener {
    /// Stop `task` together with the listener.
    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }
}

impl Drop for CatalogListener {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Subscribe `service` to the parts and categories collections of `store`.
///
/// Returns `None` when the store cannot push.
///
/// # Errors
///
/// Returns an error when subscribing fails.
pub async fn spawn_listener(
    service: Arc<dyn CatalogService>,
    store: &dyn DocumentStore,
) -> Result<Option<CatalogListener>, StoreError> {
    let mut subscriptions = Vec::new();

    for collection in [Collection::Categories, Collection::Parts] {
        match store.subscribe(collection).await? {
            Some(subscription) => subscriptions.push(subscription),
            None => return Ok(None),
        }
    }

    let tasks = subscriptions
        .into_iter()
        .map(|subscription| tokio::spawn(forward(subscription, Arc::clone(&service))))
        .collect();

    Ok(Some(CatalogListener { tasks }))
}

async fn forward(mut subscription: Subscription, service: Arc<dyn CatalogService>) {
    while let Some(snapshot) = subscription.next().await {
        let collection = snapshot.collection;

        if let Err(error) = service.apply_snapshot(snapshot).await {
            warn!(%error, collection = collection.name(), "discarded snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gamepart::catalog::{CatalogEvent, InvalidInput};
    use testresult::TestResult;
    use tokio::time::timeout;

    use super::*;
    use crate::{
        store::{MemoryStore, MockDocumentStore},
        test::TestContext,
    };

    fn part_data(category: &str, subcategory: &str) -> PartData {
        PartData {
            name: "Stick".to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            price: 450,
            in_stock: true,
            ..PartData::default()
        }
    }

    async fn optimistic() -> Result<(Arc<MemoryStore>, StoreCatalogService), CatalogServiceError> {
        let store = Arc::new(MemoryStore::new());
        let service = StoreCatalogService::load(store.clone(), SyncMode::Optimistic).await?;

        Ok((store, service))
    }

    #[tokio::test]
    async fn load_seeds_an_empty_store() -> TestResult {
        let (store, service) = optimistic().await?;

        assert_eq!(service.catalog().await.parts().len(), 6);
        assert_eq!(store.get_all(Collection::Parts).await?.len(), 6);
        assert_eq!(store.get_all(Collection::Categories).await?.len(), 4);

        Ok(())
    }

    #[tokio::test]
    async fn load_reads_existing_documents_without_seeding() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                Collection::Categories,
                Document::encode(
                    "GAMECUBE",
                    &Category {
                        name: "GAMECUBE".to_string(),
                        position: 0,
                    },
                )?,
            )
            .await?;

        let service = StoreCatalogService::load(store, SyncMode::Optimistic).await?;
        let catalog = service.catalog().await;

        assert_eq!(catalog.categories().collect::<Vec<_>>(), ["GAMECUBE"]);
        assert!(catalog.parts().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn rename_writes_only_touched_documents() -> TestResult {
        let (store, service) = optimistic().await?;

        let change = service
            .rename_category("PS5".to_string(), "PS5-NEW".to_string())
            .await?;

        assert_eq!(change.upserted_parts.len(), 3);

        let categories: Vec<Category> = decode_all(&store.get_all(Collection::Categories).await?)?;
        assert!(categories.iter().any(|category| category.name == "PS5-NEW"));
        assert!(categories.iter().all(|category| category.name != "PS5"));

        let parts: Vec<Part> = decode_all(&store.get_all(Collection::Parts).await?)?;
        assert_eq!(parts.iter().filter(|part| part.category == "PS5-NEW").count(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn validation_failures_do_not_touch_the_store() -> TestResult {
        let mut store = MockDocumentStore::new();
        store.expect_commit().never();

        let service = StoreCatalogService::new(
            Arc::new(store),
            Replica::new(
                SyncMode::Optimistic,
                Catalog::with_contents(["PS5"], Vec::new()),
            ),
        );

        let result = service.add_category("PS5".to_string()).await;

        assert!(matches!(result, Err(CatalogServiceError::Catalog(_))));

        Ok(())
    }

    #[tokio::test]
    async fn failed_writes_roll_back_the_tentative_state() -> TestResult {
        let mut store = MockDocumentStore::new();
        store
            .expect_commit()
            .times(1)
            .returning(|_| Err(StoreError::PermissionDenied("read-only".to_string())));

        let service = StoreCatalogService::new(
            Arc::new(store),
            Replica::new(
                SyncMode::Optimistic,
                Catalog::with_contents(["PS5"], Vec::new()),
            ),
        );
        let before = service.catalog().await;

        let result = service
            .create_part(part_data("PS5", "Analog"))
            .await;

        assert!(matches!(&result, Err(error) if error.is_permission_denied()));
        assert_eq!(service.catalog().await, before);

        Ok(())
    }

    #[tokio::test]
    async fn awaiting_confirmation_shows_pushed_state() -> TestResult {
        let store = Arc::new(MemoryStore::with_push());
        let service: Arc<StoreCatalogService> =
            Arc::new(StoreCatalogService::load(store.clone(), SyncMode::AwaitConfirmation).await?);
        let mut revisions = service.revisions();

        let _listener = spawn_listener(service.clone(), store.as_ref())
            .await?
            .ok_or("push store must listen")?;

        let change = service.add_category("WII".to_string()).await?;
        assert_eq!(change.event, CatalogEvent::CategoryAdded("WII".to_string()));

        timeout(Duration::from_secs(5), async {
            while !service.catalog().await.has_category("WII") {
                revisions.changed().await?;
            }

            Ok::<_, watch::error::RecvError>(())
        })
        .await??;

        assert!(service.catalog().await.has_category("WII"));

        Ok(())
    }

    #[tokio::test]
    async fn follow_up_edits_build_on_accepted_writes() -> TestResult {
        let store = Arc::new(MemoryStore::with_push());
        let service: Arc<StoreCatalogService> =
            Arc::new(StoreCatalogService::load(store.clone(), SyncMode::AwaitConfirmation).await?);
        let mut revisions = service.revisions();

        let _listener = spawn_listener(service.clone(), store.as_ref())
            .await?
            .ok_or("push store must listen")?;

        service.add_category("WII".to_string()).await?;
        service.create_part(part_data("WII", "Remote")).await?;

        let duplicate = service.add_category("WII".to_string()).await;
        assert!(matches!(
            duplicate,
            Err(CatalogServiceError::Catalog(CatalogError::InvalidInput(
                InvalidInput::DuplicateCategory(_)
            )))
        ));

        service
            .rename_category("PS5".to_string(), "PS5-NEW".to_string())
            .await?;
        let change = service.delete_category("PS5-NEW".to_string()).await?;
        assert_eq!(change.removed_parts.len(), 3);

        timeout(Duration::from_secs(5), async {
            loop {
                let catalog = service.catalog().await;

                if catalog.part_count("WII") == 1
                    && !catalog.has_category("PS5-NEW")
                    && catalog.part_count("PS5-NEW") == 0
                {
                    break;
                }

                revisions.changed().await?;
            }

            Ok::<_, watch::error::RecvError>(())
        })
        .await??;

        let catalog = service.catalog().await;
        assert!(!catalog.has_category("PS5"));
        assert_eq!(catalog.part_count("PS5"), 0);

        let stored: Vec<Category> = decode_all(&store.get_all(Collection::Categories).await?)?;
        assert!(stored.iter().all(|category| !category.name.starts_with("PS5")));

        Ok(())
    }

    #[tokio::test]
    async fn listener_is_absent_without_push() -> TestResult {
        let (store, service) = optimistic().await?;

        let listener = spawn_listener(Arc::new(service), store.as_ref()).await?;

        assert!(listener.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn malformed_snapshots_are_rejected_whole() -> TestResult {
        let (_store, service) = optimistic().await?;
        let before = service.catalog().await;

        let result = service
            .apply_snapshot(Snapshot {
                collection: Collection::Parts,
                documents: vec![Document {
                    id: "x".to_string(),
                    body: serde_json::json!({ "name": 42 }),
                }],
            })
            .await;

        assert!(matches!(
            result,
            Err(CatalogServiceError::Store(StoreError::Decode(_)))
        ));
        assert_eq!(service.catalog().await, before);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn postgres_pushes_confirmed_changes() -> TestResult {
        let ctx = TestContext::new().await;
        let service = Arc::new(ctx.catalog(SyncMode::AwaitConfirmation).await);
        let mut revisions = service.revisions();

        let _listener = spawn_listener(service.clone(), ctx.store.as_ref())
            .await?
            .ok_or("postgres store must listen")?;

        service
            .rename_category("PS5".to_string(), "PS5-NEW".to_string())
            .await?;

        timeout(Duration::from_secs(10), async {
            loop {
                let catalog = service.catalog().await;

                if catalog.has_category("PS5-NEW") && catalog.part_count("PS5-NEW") == 3 {
                    break;
                }

                revisions.changed().await?;
            }

            Ok::<_, watch::error::RecvError>(())
        })
        .await??;

        assert!(!service.catalog().await.has_category("PS5"));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn read_only_postgres_rolls_back_with_permission_denied() -> TestResult {
        let ctx = TestContext::new().await;
        drop(ctx.catalog(SyncMode::Optimistic).await);

        let store: Arc<dyn DocumentStore> = Arc::new(ctx.read_only_store().await);
        let service = StoreCatalogService::load(store, SyncMode::Optimistic).await?;
        let before = service.catalog().await;

        let error = service
            .add_category("WII".to_string())
            .await
            .err()
            .ok_or("write as reader must fail")?;

        assert!(error.is_permission_denied());
        assert_eq!(service.catalog().await, before);

        Ok(())
    }
}
