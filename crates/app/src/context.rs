//! App Context

use std::sync::Arc;

use gamepart::replica::SyncMode;
use thiserror::Error;
use tracing::info;

use crate::{
    auth::{AuthService, IdentityProviderAuth, IdentityProviderConfig, StaticAdminAuth},
    config::{AppConfig, AuthBackend, AuthConfig, StoreBackend, StoreConfig},
    database,
    descriptions::{DescriptionService, GeminiClient, GeminiConfig},
    domain::{
        cart::{CartService, StoreCartService, spawn_cart_reconciler},
        catalog::{CatalogListener, CatalogService, CatalogServiceError, StoreCatalogService, spawn_listener},
        orders::{OrdersService, StoreOrdersService},
    },
    store::{DocumentStore, LocalStore, MemoryStore, PgDocumentStore, StoreError},
    storefront::Storefront,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("the postgres store needs DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("the static auth backend needs GAMEPART_ADMIN_PASSWORD_SHA256")]
    MissingAdminPassword,

    #[error("the provider auth backend needs IDENTITY_API_KEY")]
    MissingIdentityApiKey,

    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to load catalog")]
    Catalog(#[from] CatalogServiceError),

    #[error("failed to open store")]
    Store(#[from] StoreError),
}

/// Services shared by every session.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn DocumentStore>,
    pub catalog: Arc<dyn CatalogService>,
    pub cart: Arc<dyn CartService>,
    pub orders: Arc<dyn OrdersService>,
    pub auth: Arc<dyn AuthService>,
    pub descriptions: Arc<dyn DescriptionService>,
    pub mode: SyncMode,
    listener: Option<Arc<CatalogListener>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("mode", &self.mode)
            .field("listening", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the context from configuration: open the store, load (or seed)
    /// the catalog and the cart, and start listening for pushes when the
    /// store supports them.
    ///
    /// # Errors
    ///
    /// Returns an error when a required setting is missing or the store
    /// cannot be opened or read.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let (store, mode) = open_store(&config.store).await?;
        let auth = build_auth(&config.auth)?;
        let descriptions: Arc<dyn DescriptionService> =
            Arc::new(GeminiClient::new(GeminiConfig::from(&config.descriptions)));

        Self::with_services(store, mode, auth, descriptions).await
    }

    /// Build the context around an already opened store.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or cart cannot be loaded.
    pub async fn with_services(
        store: Arc<dyn DocumentStore>,
        mode: SyncMode,
        auth: Arc<dyn AuthService>,
        descriptions: Arc<dyn DescriptionService>,
    ) -> Result<Self, AppInitError> {
        let catalog: Arc<dyn CatalogService> =
            Arc::new(StoreCatalogService::load(store.clone(), mode).await?);
        let cart: Arc<dyn CartService> = Arc::new(StoreCartService::load(store.clone()).await?);
        let orders: Arc<dyn OrdersService> = Arc::new(StoreOrdersService::new(store.clone()));

        let listener = spawn_listener(catalog.clone(), store.as_ref())
            .await?
            .map(|mut listener| {
                listener.track(spawn_cart_reconciler(catalog.clone(), cart.clone()));

                Arc::new(listener)
            });

        info!(?mode, listening = listener.is_some(), "app context ready");

        Ok(Self {
            store,
            catalog,
            cart,
            orders,
            auth,
            descriptions,
            mode,
            listener,
        })
    }

    /// Whether store pushes are being applied to the catalog.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// A new session over the shared services.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        Storefront::new(
            self.catalog.clone(),
            self.cart.clone(),
            self.orders.clone(),
            self.auth.clone(),
            self.descriptions.clone(),
        )
    }
}

/// Open the configured store. Push-capable stores confirm through the push;
/// the local store commits optimistically.
async fn open_store(
    config: &StoreConfig,
) -> Result<(Arc<dyn DocumentStore>, SyncMode), AppInitError> {
    match config.backend {
        StoreBackend::Local => Ok((
            Arc::new(LocalStore::new(&config.data_dir)),
            SyncMode::Optimistic,
        )),
        StoreBackend::Memory => Ok((
            Arc::new(MemoryStore::with_push()),
            SyncMode::AwaitConfirmation,
        )),
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(AppInitError::MissingDatabaseUrl)?;

            let pool = database::connect(url)
                .await
                .map_err(AppInitError::Database)?;

            Ok((
                Arc::new(PgDocumentStore::new(pool)),
                SyncMode::AwaitConfirmation,
            ))
        }
    }
}

fn build_auth(config: &AuthConfig) -> Result<Arc<dyn AuthService>, AppInitError> {
    match config.backend {
        AuthBackend::Static => {
            let digest = config
                .admin_password_sha256
                .clone()
                .ok_or(AppInitError::MissingAdminPassword)?;

            Ok(Arc::new(StaticAdminAuth::new(
                config.admin_username.clone(),
                digest,
            )))
        }
        AuthBackend::Provider => {
            let api_key = config
                .identity_api_key
                .clone()
                .ok_or(AppInitError::MissingIdentityApiKey)?;

            Ok(Arc::new(IdentityProviderAuth::new(IdentityProviderConfig {
                endpoint: config.identity_endpoint.trim_end_matches('/').to_string(),
                api_key,
                admin_emails: config.admin_emails.clone(),
            })))
        }
    }
}
