//! Cart service.

use std::sync::Arc;

use async_trait::async_trait;
use gamepart::{
    cart::{Cart, CartItem},
    catalog::{Catalog, CatalogEvent},
    parts::{Part, PartId},
};
use mockall::automock;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    domain::catalog::CatalogService,
    store::{Collection, Document, DocumentStore, StoreError},
};

/// Id of the single cart document.
pub const CART_DOCUMENT_ID: &str = "cart";

/// Cart persisted as one document that is overwritten after every change.
///
/// The in-memory cart is authoritative: a failed write is logged and the
/// change stands.
pub struct StoreCartService {
    store: Arc<dyn DocumentStore>,
    cart: Mutex<Cart>,
}

impl std::fmt::Debug for StoreCartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCartService").finish_non_exhaustive()
    }
}

impl StoreCartService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, cart: Cart) -> Self {
        Self {
            store,
            cart: Mutex::new(cart),
        }
    }

    /// Load the saved cart. A missing or unreadable record starts an empty
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read at all.
    pub async fn load(store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        let documents = store.get_all(Collection::Cart).await?;

        let cart = documents
            .iter()
            .find(|document| document.id == CART_DOCUMENT_ID)
            .map(Document::decode::<Vec<CartItem>>)
            .transpose()
            .unwrap_or_else(|error| {
                warn!(%error, "ignoring unreadable saved cart");

                None
            })
            .map(Cart::from_items)
            .unwrap_or_default();

        Ok(Self::new(store, cart))
    }

    async fn mutate<F>(&self, mutation: F) -> bool
    where
        F: FnOnce(&mut Cart) -> bool + Send,
    {
        let mut cart = self.cart.lock().await;

        let changed = mutation(&mut cart);

        if changed {
            // Best-effort write; the session cart stays authoritative.
            if let Err(error) = self.save(&cart).await {
                warn!(%error, "failed to persist cart");
            }
        }

        changed
    }

    async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        self.store
            .put(Collection::Cart, Document::encode(CART_DOCUMENT_ID, cart)?)
            .await
    }
}

#[async_trait]
impl CartService for StoreCartService {
    async fn cart(&self) -> Cart {
        self.cart.lock().await.clone()
    }

    async fn add(&self, part: Part) -> bool {
        self.mutate(|cart| cart.add(&part)).await
    }

    async fn update_quantity(&self, id: PartId, delta: i64) -> bool {
        self.mutate(|cart| cart.update_quantity(id, delta)).await
    }

    async fn remove(&self, id: PartId) -> bool {
        self.mutate(|cart| cart.remove(id)).await
    }

    async fn clear(&self) {
        self.mutate(|cart| {
            let changed = !cart.is_empty();

            cart.clear();

            changed
        })
        .await;
    }

    async fn apply(&self, event: CatalogEvent) -> bool {
        self.mutate(|cart| cart.apply(&event)).await
    }

    async fn reconcile(&self, catalog: Catalog) -> bool {
        self.mutate(|cart| cart.reconcile(&catalog)).await
    }
}

#[automock]
#[async_trait]
pub trait CartService: Send + Sync {
    /// Current cart contents.
    async fn cart(&self) -> Cart;

    /// Adds one unit of a part. `false` when the part is out of stock.
    async fn add(&self, part: Part) -> bool;

    /// Adjusts an item's quantity, never below one. `false` when absent.
    async fn update_quantity(&self, id: PartId, delta: i64) -> bool;

    /// Removes an item. `false` when absent.
    async fn remove(&self, id: PartId) -> bool;

    /// Empties the cart.
    async fn clear(&self);

    /// Follows a catalog cascade. `true` when the cart changed.
    async fn apply(&self, event: CatalogEvent) -> bool;

    /// Drops items whose part is gone from `catalog`. `true` when the cart
    /// changed.
    async fn reconcile(&self, catalog: Catalog) -> bool;
}

/// Prune `cart` against the catalog after every catalog revision, so parts
/// removed by other clients leave the cart too.
pub fn spawn_cart_reconciler(
    catalog: Arc<dyn CatalogService>,
    cart: Arc<dyn CartService>,
) -> JoinHandle<()> {
    let mut revisions = catalog.revisions();

    tokio::spawn(async move {
        while revisions.changed().await.is_ok() {
            let current = catalog.catalog().await;

            if cart.reconcile(current).await {
                info!("cart dropped parts no longer in the catalog");
            }
        }
    })
}
