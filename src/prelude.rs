//! GamePart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartItem},
    catalog::{Catalog, CatalogChange, CatalogError, CatalogEvent, Category, InvalidInput},
    checkout::{
        CheckoutError, CheckoutFlow, CheckoutState, Order, OrderId, OrderStatus, Purchaser,
    },
    filter::{CategoryFilter, Selection, visible_parts},
    fixtures::{DEFAULT_CATEGORIES, FixtureError, default_catalog},
    parts::{Part, PartData, PartId},
    pricing::{PricingError, format_amount},
    replica::{Replica, SyncMode},
    uuids::TypedUuid,
};
