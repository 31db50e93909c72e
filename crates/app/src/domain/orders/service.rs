//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use gamepart::checkout::Order;
use mockall::automock;
use tracing::info;

use crate::{
    domain::orders::errors::OrdersServiceError,
    store::{Collection, Document, DocumentStore, decode_all},
};

/// Orders written as one document each, keyed by order id.
pub struct StoreOrdersService {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for StoreOrdersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOrdersService").finish_non_exhaustive()
    }
}

impl StoreOrdersService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrdersService for StoreOrdersService {
    async fn place_order(&self, order: Order) -> Result<Order, OrdersServiceError> {
        self.store
            .put(
                Collection::Orders,
                Document::encode(order.id.to_string(), &order)?,
            )
            .await?;

        info!(order = %order.id, total = order.total, items = order.items.len(), "order placed");

        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, OrdersServiceError> {
        let mut orders: Vec<Order> = decode_all(&self.store.get_all(Collection::Orders).await?)?;

        orders.sort_by_key(|order| order.created_at);

        Ok(orders)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Writes a pending order.
    async fn place_order(&self, order: Order) -> Result<Order, OrdersServiceError>;

    /// All orders, oldest first.
    async fn list_orders(&self) -> Result<Vec<Order>, OrdersServiceError>;
}
