//! Storefront session
//!
//! Ties the services together for one user session: catalog mutations are
//! gated on an admin identity and their cascades are fanned out to the cart
//! and the current selection; checkout runs the order write through the
//! checkout state machine.

mod errors;
pub mod notices;

use std::sync::Arc;

use gamepart::{
    cart::Cart,
    catalog::{Catalog, CatalogChange, CatalogError, CatalogEvent},
    checkout::{CheckoutFlow, CheckoutState, Order, Purchaser},
    filter::{CategoryFilter, Selection, visible_parts},
    parts::{Part, PartData, PartId},
};
use jiff::Timestamp;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub use errors::StorefrontError;
pub use notices::{Notice, NoticeLevel};

use crate::{
    auth::{AuthService, Credential, UserIdentity},
    descriptions::{DescriptionRequest, DescriptionService, describe_or_fallback},
    domain::{
        cart::CartService, catalog::CatalogService, catalog::CatalogServiceError,
        orders::OrdersService,
    },
};

/// One user session over shared services.
pub struct Storefront {
    catalog: Arc<dyn CatalogService>,
    cart: Arc<dyn CartService>,
    orders: Arc<dyn OrdersService>,
    auth: Arc<dyn AuthService>,
    descriptions: Arc<dyn DescriptionService>,
    selection: Mutex<Selection>,
    checkout: Mutex<CheckoutFlow>,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront").finish_non_exhaustive()
    }
}

impl Storefront {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        cart: Arc<dyn CartService>,
        orders: Arc<dyn OrdersService>,
        auth: Arc<dyn AuthService>,
        descriptions: Arc<dyn DescriptionService>,
    ) -> Self {
        Self {
            catalog,
            cart,
            orders,
            auth,
            descriptions,
            selection: Mutex::new(Selection::default()),
            checkout: Mutex::new(CheckoutFlow::new()),
        }
    }

    // Identity

    /// # Errors
    ///
    /// Returns [`StorefrontError::Auth`] when the credential is rejected.
    pub async fn sign_in(&self, credential: Credential) -> Result<UserIdentity, StorefrontError> {
        Ok(self.auth.sign_in(credential).await?)
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::Auth`] when the provider refuses the account.
    pub async fn sign_up(&self, credential: Credential) -> Result<UserIdentity, StorefrontError> {
        Ok(self.auth.sign_up(credential).await?)
    }

    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.auth.current_user().await
    }

    async fn require_admin(&self) -> Result<UserIdentity, StorefrontError> {
        match self.auth.current_user().await {
            Some(identity) if identity.is_admin() => Ok(identity),
            _ => Err(StorefrontError::Forbidden),
        }
    }

    // Browsing

    pub async fn catalog(&self) -> Catalog {
        self.catalog.catalog().await
    }

    /// The current selection, cleared of names the catalog no longer has.
    pub async fn selection(&self) -> Selection {
        let catalog = self.catalog.catalog().await;
        let mut selection = self.selection.lock().await;

        selection.reconcile(&catalog);

        selection.clone()
    }

    /// Parts matching the current selection, in catalog order.
    pub async fn visible_parts(&self) -> Vec<Part> {
        let catalog = self.catalog.catalog().await;
        let mut selection = self.selection.lock().await;

        selection.reconcile(&catalog);

        visible_parts(catalog.parts(), &selection).cloned().collect()
    }

    pub async fn select_category(&self, category: CategoryFilter) {
        self.selection.lock().await.select_category(category);
    }

    pub async fn select_subcategory(&self, subcategory: Option<String>) {
        self.selection.lock().await.select_subcategory(subcategory);
    }

    pub async fn set_search(&self, search: impl Into<String> + Send) {
        self.selection.lock().await.set_search(search);
    }

    // Catalog administration

    /// # Errors
    ///
    /// Returns [`StorefrontError::Forbidden`] without an admin identity, or the
    /// catalog error.
    pub async fn add_category(&self, name: String) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self.catalog.add_category(name).await?;

        Ok(self.propagate(change).await)
    }

    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn rename_category(
        &self,
        from: String,
        to: String,
    ) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self.catalog.rename_category(from, to).await?;

        Ok(self.propagate(change).await)
    }

    /// Deletes a category with all of its parts. Callers confirm first with
    /// [`notices::delete_category_prompt`].
    ///
    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn delete_category(&self, name: String) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self.catalog.delete_category(name).await?;

        Ok(self.propagate(change).await)
    }

    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn create_part(&self, data: PartData) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self.catalog.create_part(data).await?;

        Ok(self.propagate(change).await)
    }

    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn update_part(
        &self,
        id: PartId,
        data: PartData,
    ) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self.catalog.update_part(id, data).await?;

        Ok(self.propagate(change).await)
    }

    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn delete_part(&self, id: PartId) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self.catalog.delete_part(id).await?;

        Ok(self.propagate(change).await)
    }

    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn rename_subcategory(
        &self,
        category: String,
        from: String,
        to: String,
    ) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self
            .catalog
            .rename_subcategory(category, from, to)
            .await?;

        Ok(self.propagate(change).await)
    }

    /// # Errors
    ///
    /// See [`Storefront::add_category`].
    pub async fn delete_subcategory(
        &self,
        category: String,
        subcategory: String,
    ) -> Result<CatalogChange, StorefrontError> {
        self.require_admin().await?;

        let change = self
            .catalog
            .delete_subcategory(category, subcategory)
            .await?;

        Ok(self.propagate(change).await)
    }

    /// Generate a description for a part being edited. The text is returned,
    /// not saved.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Forbidden`] without an admin identity and
    /// [`StorefrontError::MissingDescriptionInput`] when the name or category
    /// is blank. Generation failures come back as fallback text.
    pub async fn generate_description(
        &self,
        request: DescriptionRequest,
    ) -> Result<String, StorefrontError> {
        self.require_admin().await?;

        if request.part_name.trim().is_empty() || request.category.trim().is_empty() {
            return Err(StorefrontError::MissingDescriptionInput);
        }

        Ok(describe_or_fallback(self.descriptions.as_ref(), request).await)
    }

    /// Apply a committed change's cascade to the cart and the selection.
    async fn propagate(&self, change: CatalogChange) -> CatalogChange {
        self.follow(&change.event).await;

        change
    }

    async fn follow(&self, event: &CatalogEvent) {
        if self.cart.apply(event.clone()).await {
            info!(?event, "cart followed catalog change");
        }

        self.selection.lock().await.apply(event);
    }

    // Cart

    pub async fn cart(&self) -> Cart {
        self.cart.cart().await
    }

    /// Add one unit of a part. `Ok(false)` when the part is out of stock.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the part is not in the catalog.
    pub async fn add_to_cart(&self, id: PartId) -> Result<bool, StorefrontError> {
        let part = self
            .catalog
            .catalog()
            .await
            .part(id)
            .cloned()
            .ok_or(CatalogServiceError::Catalog(CatalogError::PartNotFound(id)))?;

        Ok(self.cart.add(part).await)
    }

    pub async fn update_quantity(&self, id: PartId, delta: i64) -> bool {
        self.cart.update_quantity(id, delta).await
    }

    pub async fn remove_from_cart(&self, id: PartId) -> bool {
        self.cart.remove(id).await
    }

    pub async fn clear_cart(&self) {
        self.cart.clear().await;
    }

    /// The cart after dropping parts the catalog no longer has.
    async fn reconciled_cart(&self) -> Cart {
        let catalog = self.catalog.catalog().await;

        if self.cart.reconcile(catalog).await {
            info!("cart dropped parts no longer in the catalog");
        }

        self.cart.cart().await
    }

    // Checkout

    pub async fn checkout_state(&self) -> CheckoutState {
        self.checkout.lock().await.state()
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::Checkout`] outside `Idle`.
    pub async fn open_cart(&self) -> Result<(), StorefrontError> {
        Ok(self.checkout.lock().await.open_cart()?)
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::Checkout`] outside `Reviewing` or with an
    /// empty cart.
    pub async fn proceed_to_checkout(&self) -> Result<(), StorefrontError> {
        let cart = self.reconciled_cart().await;

        Ok(self.checkout.lock().await.proceed(&cart)?)
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::Checkout`] from `Idle` or `Processing`.
    pub async fn cancel_checkout(&self) -> Result<(), StorefrontError> {
        Ok(self.checkout.lock().await.cancel()?)
    }

    /// Write the order. On success the cart is cleared and the flow returns to
    /// `Idle`; on failure the cart is untouched and the flow stays in
    /// `Confirming` for a retry.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Checkout`] outside `Confirming` and
    /// [`StorefrontError::Orders`] when the write fails.
    pub async fn confirm_checkout(&self) -> Result<Order, StorefrontError> {
        let mut flow = self.checkout.lock().await;

        let mut cart = self.reconciled_cart().await;
        let purchaser = self
            .auth
            .current_user()
            .await
            .map_or(Purchaser::Anonymous, |identity| identity.purchaser());

        let order = flow.confirm(&cart, purchaser, Timestamp::now())?;

        match self.orders.place_order(order).await {
            Ok(order) => {
                flow.succeed(&mut cart)?;
                self.cart.clear().await;

                info!(order = %order.id, total = order.total, "checkout complete");

                Ok(order)
            }
            Err(error) => {
                flow.fail()?;

                warn!(%error, "checkout failed, cart kept");

                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gamepart::{
        catalog::InvalidInput,
        fixtures::default_catalog,
        replica::{Replica, SyncMode},
    };
    use testresult::TestResult;

    use super::*;
    use crate::{
        auth::{MockAuthService, Role, StaticAdminAuth, hash_secret},
        descriptions::{
            EMPTY_MESSAGE, GenerationError, MISSING_KEY_MESSAGE, MockDescriptionService,
        },
        domain::{
            cart::StoreCartService,
            catalog::StoreCatalogService,
            orders::{MockOrdersService, OrdersServiceError, StoreOrdersService},
        },
        store::{Collection, Document, MemoryStore, Snapshot, StoreError},
    };

    struct Harness {
        storefront: Storefront,
        store: Arc<MemoryStore>,
    }

    async fn harness_with(
        orders: Option<Arc<dyn OrdersService>>,
        descriptions: Arc<dyn DescriptionService>,
    ) -> TestResult<Harness> {
        let store = Arc::new(MemoryStore::new());
        let catalog = StoreCatalogService::new(
            store.clone(),
            Replica::new(SyncMode::Optimistic, default_catalog()?),
        );
        let cart = StoreCartService::load(store.clone()).await?;
        let orders = orders.unwrap_or_else(|| Arc::new(StoreOrdersService::new(store.clone())));

        let storefront = Storefront::new(
            Arc::new(catalog),
            Arc::new(cart),
            orders,
            Arc::new(StaticAdminAuth::new("admin", hash_secret("pw"))),
            descriptions,
        );

        Ok(Harness { storefront, store })
    }

    async fn harness() -> TestResult<Harness> {
        harness_with(None, Arc::new(MockDescriptionService::new())).await
    }

    async fn admin(storefront: &Storefront) -> TestResult {
        storefront.sign_in(Credential::new("admin", "pw")).await?;

        Ok(())
    }

    async fn part_in(storefront: &Storefront, category: &str) -> TestResult<Part> {
        Ok(storefront
            .catalog()
            .await
            .parts()
            .iter()
            .find(|part| part.category == category && part.in_stock)
            .cloned()
            .ok_or("fixture part missing")?)
    }

    #[tokio::test]
    async fn mutations_require_an_admin() -> TestResult {
        let Harness { storefront, .. } = harness().await?;

        let result = storefront.add_category("WII".to_string()).await;

        assert!(matches!(result, Err(StorefrontError::Forbidden)));
        assert!(!storefront.catalog().await.has_category("WII"));

        Ok(())
    }

    #[tokio::test]
    async fn customers_are_forbidden_too() -> TestResult {
        let mut auth = MockAuthService::new();
        auth.expect_current_user().returning(|| {
            Some(UserIdentity {
                uid: "u1".to_string(),
                email: None,
                role: Role::Customer,
            })
        });

        let store = Arc::new(MemoryStore::new());
        let storefront = Storefront::new(
            Arc::new(StoreCatalogService::new(
                store.clone(),
                Replica::new(SyncMode::Optimistic, default_catalog()?),
            )),
            Arc::new(StoreCartService::load(store.clone()).await?),
            Arc::new(StoreOrdersService::new(store)),
            Arc::new(auth),
            Arc::new(MockDescriptionService::new()),
        );

        let result = storefront.delete_category("PS5".to_string()).await;

        assert!(matches!(result, Err(StorefrontError::Forbidden)));

        Ok(())
    }

    #[tokio::test]
    async fn category_rename_reaches_cart_and_selection() -> TestResult {
        let Harness { storefront, .. } = harness().await?;
        admin(&storefront).await?;

        let part = part_in(&storefront, "PS5").await?;
        storefront.add_to_cart(part.id).await?;
        storefront
            .select_category(CategoryFilter::Only("PS5".to_string()))
            .await;

        storefront
            .rename_category("PS5".to_string(), "PS5-NEW".to_string())
            .await?;

        let cart = storefront.cart().await;
        assert_eq!(
            cart.item(part.id).map(|item| item.part.category.as_str()),
            Some("PS5-NEW")
        );
        assert_eq!(
            storefront.selection().await.category,
            CategoryFilter::Only("PS5-NEW".to_string())
        );
        assert!(
            storefront
                .visible_parts()
                .await
                .iter()
                .all(|part| part.category == "PS5-NEW")
        );
        assert_eq!(storefront.visible_parts().await.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn category_delete_empties_cart_and_resets_selection() -> TestResult {
        let Harness { storefront, .. } = harness().await?;
        admin(&storefront).await?;

        let part = part_in(&storefront, "PS4").await?;
        storefront.add_to_cart(part.id).await?;
        storefront
            .select_category(CategoryFilter::Only("PS4".to_string()))
            .await;

        storefront.delete_category("PS4".to_string()).await?;

        assert!(storefront.cart().await.item(part.id).is_none());
        assert_eq!(storefront.selection().await.category, CategoryFilter::All);
        assert!(!storefront.catalog().await.has_category("PS4"));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_edits_leave_everything_unchanged() -> TestResult {
        let Harness { storefront, .. } = harness().await?;
        admin(&storefront).await?;

        let before = storefront.catalog().await;

        let result = storefront
            .create_part(PartData {
                name: "Shell".to_string(),
                category: "PS5".to_string(),
                subcategory: String::new(),
                price: 900,
                in_stock: true,
                ..PartData::default()
            })
            .await;

        let Err(error) = result else {
            return Err("blank subcategory must be rejected".into());
        };

        assert!(matches!(
            &error,
            StorefrontError::Catalog(CatalogServiceError::Catalog(CatalogError::InvalidInput(
                InvalidInput::EmptySubcategory
            )))
        ));
        assert_eq!(Notice::from(&error).message, "請輸入或選擇一個子分類");
        assert_eq!(storefront.catalog().await, before);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_writes_an_order_and_clears_the_cart() -> TestResult {
        let Harness { storefront, store } = harness().await?;

        let part = part_in(&storefront, "PS5").await?;
        storefront.add_to_cart(part.id).await?;
        storefront.add_to_cart(part.id).await?;

        storefront.open_cart().await?;
        storefront.proceed_to_checkout().await?;
        let order = storefront.confirm_checkout().await?;

        assert_eq!(order.total, part.price * 2);
        assert_eq!(order.purchaser, Purchaser::Anonymous);
        assert!(storefront.cart().await.is_empty());
        assert_eq!(storefront.checkout_state().await, CheckoutState::Idle);

        let orders = StoreOrdersService::new(store).list_orders().await?;
        assert_eq!(orders, vec![order]);

        Ok(())
    }

    #[tokio::test]
    async fn snapshots_from_elsewhere_prune_cart_and_selection() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(StoreCatalogService::new(
            store.clone(),
            Replica::new(SyncMode::AwaitConfirmation, default_catalog()?),
        ));
        let storefront = Storefront::new(
            catalog.clone(),
            Arc::new(StoreCartService::load(store.clone()).await?),
            Arc::new(StoreOrdersService::new(store)),
            Arc::new(StaticAdminAuth::new("admin", hash_secret("pw"))),
            Arc::new(MockDescriptionService::new()),
        );

        let kept = part_in(&storefront, "PS5").await?;
        let removed = part_in(&storefront, "PS4").await?;
        storefront.add_to_cart(kept.id).await?;
        storefront.add_to_cart(removed.id).await?;
        storefront
            .select_category(CategoryFilter::Only("PS4".to_string()))
            .await;

        let remaining = catalog.catalog().await;
        let parts = remaining
            .parts()
            .iter()
            .filter(|part| part.category != "PS4")
            .map(|part| Document::encode(part.id.to_string(), part))
            .collect::<Result<Vec<_>, _>>()?;
        let categories = remaining
            .category_entries()
            .iter()
            .filter(|category| category.name != "PS4")
            .map(|category| Document::encode(category.name.clone(), category))
            .collect::<Result<Vec<_>, _>>()?;

        catalog
            .apply_snapshot(Snapshot {
                collection: Collection::Categories,
                documents: categories,
            })
            .await?;
        catalog
            .apply_snapshot(Snapshot {
                collection: Collection::Parts,
                documents: parts,
            })
            .await?;

        assert_eq!(storefront.selection().await.category, CategoryFilter::All);

        storefront.open_cart().await?;
        storefront.proceed_to_checkout().await?;
        let order = storefront.confirm_checkout().await?;

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, kept.price);

        Ok(())
    }

    #[tokio::test]
    async fn failed_checkout_keeps_the_cart_and_allows_retry() -> TestResult {
        let mut orders = MockOrdersService::new();
        let mut attempts = 0;
        orders.expect_place_order().times(2).returning(move |order| {
            attempts += 1;

            if attempts == 1 {
                Err(OrdersServiceError::Store(StoreError::Unavailable(
                    "offline".to_string(),
                )))
            } else {
                Ok(order)
            }
        });

        let Harness { storefront, .. } =
            harness_with(Some(Arc::new(orders)), Arc::new(MockDescriptionService::new())).await?;
        admin(&storefront).await?;

        let part = part_in(&storefront, "SWITCH").await?;
        storefront.add_to_cart(part.id).await?;
        storefront.open_cart().await?;
        storefront.proceed_to_checkout().await?;

        let before = storefront.cart().await;

        let result = storefront.confirm_checkout().await;

        assert!(matches!(result, Err(StorefrontError::Orders(_))));
        assert_eq!(storefront.cart().await, before);
        assert_eq!(storefront.checkout_state().await, CheckoutState::Confirming);

        let order = storefront.confirm_checkout().await?;

        assert!(matches!(order.purchaser, Purchaser::User { ref uid, .. } if uid == "admin"));
        assert!(storefront.cart().await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn out_of_stock_parts_are_not_added() -> TestResult {
        let Harness { storefront, .. } = harness().await?;

        let part = storefront
            .catalog()
            .await
            .parts()
            .iter()
            .find(|part| !part.in_stock)
            .cloned()
            .ok_or("fixture has an out-of-stock part")?;

        assert!(!storefront.add_to_cart(part.id).await?);
        assert!(storefront.cart().await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn descriptions_need_a_name_and_category() -> TestResult {
        let mut descriptions = MockDescriptionService::new();
        descriptions
            .expect_generate()
            .times(1)
            .returning(|_| Err(GenerationError::Empty));

        let Harness { storefront, .. } = harness_with(None, Arc::new(descriptions)).await?;
        admin(&storefront).await?;

        let missing = storefront
            .generate_description(DescriptionRequest::new("", "PS5", None))
            .await;

        assert!(matches!(
            missing,
            Err(StorefrontError::MissingDescriptionInput)
        ));

        let text = storefront
            .generate_description(DescriptionRequest::new("風扇", "PS4", None))
            .await?;

        assert_eq!(text, EMPTY_MESSAGE);
        assert_ne!(text, MISSING_KEY_MESSAGE);

        Ok(())
    }
}
