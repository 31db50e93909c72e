//! Cart
//!
//! Cart items are denormalized copies of parts taken at add time. They do not
//! follow later edits to the part, only the catalog cascades below.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, CatalogEvent},
    parts::{Part, PartId},
};

/// A copy of a part plus a quantity of at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Part copy as it was when added
    #[serde(flatten)]
    pub part: Part,

    /// Quantity, never below one
    pub quantity: u32,
}

impl CartItem {
    /// Price multiplied by quantity.
    pub fn subtotal(&self) -> u64 {
        self.part.price.saturating_mul(u64::from(self.quantity))
    }
}

/// Shopping cart with at most one item per part id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted items, merging duplicate part ids and
    /// lifting zero quantities to one.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();

        for item in items {
            let quantity = item.quantity.max(1);

            match cart.item_mut(item.part.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(quantity);
                }
                None => cart.items.push(CartItem { quantity, ..item }),
            }
        }

        cart
    }

    /// Items in the order they were first added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up the item for a part.
    pub fn item(&self, id: PartId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.part.id == id)
    }

    /// Whether the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct parts in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all items.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of price times quantity over all items.
    pub fn total(&self) -> u64 {
        self.items
            .iter()
            .fold(0_u64, |total, item| total.saturating_add(item.subtotal()))
    }

    /// Add one unit of `part`.
    ///
    /// Returns `false` and leaves the cart unchanged when the part is out of
    /// stock.
    pub fn add(&mut self, part: &Part) -> bool {
        if !part.in_stock {
            return false;
        }

        match self.item_mut(part.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                part: part.clone(),
                quantity: 1,
            }),
        }

        true
    }

    /// Adjust the quantity of an item by `delta`, never going below one.
    ///
    /// Returns `false` when the part is not in the cart.
    pub fn update_quantity(&mut self, id: PartId, delta: i64) -> bool {
        let Some(item) = self.item_mut(id) else {
            return false;
        };

        let next = i64::from(item.quantity).saturating_add(delta).max(1);

        item.quantity = u32::try_from(next).unwrap_or(u32::MAX);

        true
    }

    /// Remove the item for a part. Returns `false` when it was absent.
    pub fn remove(&mut self, id: PartId) -> bool {
        let before = self.items.len();

        self.items.retain(|item| item.part.id != id);

        self.items.len() != before
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Relabel items of a renamed category.
    pub fn on_category_renamed(&mut self, from: &str, to: &str) {
        for item in &mut self.items {
            if item.part.category == from {
                to.clone_into(&mut item.part.category);
            }
        }
    }

    /// Drop items of a deleted category.
    pub fn on_category_deleted(&mut self, name: &str) {
        self.items.retain(|item| item.part.category != name);
    }

    /// Relabel items of a renamed subcategory.
    pub fn on_subcategory_renamed(&mut self, category: &str, from: &str, to: &str) {
        for item in &mut self.items {
            if item.part.is_in(category, from) {
                to.clone_into(&mut item.part.subcategory);
            }
        }
    }

    /// Drop items of a deleted subcategory.
    pub fn on_subcategory_deleted(&mut self, category: &str, subcategory: &str) {
        self.items
            .retain(|item| !item.part.is_in(category, subcategory));
    }

    /// Drop the item of a deleted part.
    pub fn on_part_deleted(&mut self, id: PartId) {
        self.remove(id);
    }

    /// Drop items whose part is no longer in `catalog`. Returns `true` when
    /// the cart changed.
    pub fn reconcile(&mut self, catalog: &Catalog) -> bool {
        let before = self.items.len();

        self.items.retain(|item| catalog.part(item.part.id).is_some());

        self.items.len() != before
    }

    /// Follow a catalog cascade. Returns `true` when the cart changed.
    pub fn apply(&mut self, event: &CatalogEvent) -> bool {
        let before = self.clone();

        match event {
            CatalogEvent::CategoryRenamed { from, to } => self.on_category_renamed(from, to),
            CatalogEvent::CategoryDeleted(name) => self.on_category_deleted(name),
            CatalogEvent::SubcategoryRenamed { category, from, to } => {
                self.on_subcategory_renamed(category, from, to);
            }
            CatalogEvent::SubcategoryDeleted {
                category,
                subcategory,
            } => self.on_subcategory_deleted(category, subcategory),
            CatalogEvent::PartDeleted(id) => self.on_part_deleted(*id),
            CatalogEvent::CategoryAdded(_)
            | CatalogEvent::PartCreated(_)
            | CatalogEvent::PartUpdated(_) => {}
        }

        *self != before
    }

    fn item_mut(&mut self, id: PartId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.part.id == id)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::parts::PartData;

    fn part(category: &str, subcategory: &str, price: u64, in_stock: bool) -> Part {
        Part::from_data(
            PartId::new(),
            PartData {
                name: format!("{category} {subcategory}"),
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                price,
                in_stock,
                ..PartData::default()
            },
        )
    }

    #[test]
    fn adding_twice_increments_quantity() -> TestResult {
        let mut cart = Cart::new();
        let stick = part("PS5", "Analog", 450, true);

        assert!(cart.add(&stick));
        assert!(cart.add(&stick));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item(stick.id).ok_or("missing item")?.quantity, 2);
        assert_eq!(cart.total(), 900);

        Ok(())
    }

    #[test]
    fn out_of_stock_parts_are_not_added() {
        let mut cart = Cart::new();
        let fan = part("XBOX", "Cooling", 890, false);

        assert!(!cart.add(&fan));
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_never_drops_below_one() -> TestResult {
        let mut cart = Cart::new();
        let stick = part("PS5", "Analog", 450, true);
        cart.add(&stick);

        cart.update_quantity(stick.id, -5);
        assert_eq!(cart.item(stick.id).ok_or("missing item")?.quantity, 1);

        cart.update_quantity(stick.id, 3);
        assert_eq!(cart.item(stick.id).ok_or("missing item")?.quantity, 4);

        Ok(())
    }

    #[test]
    fn updating_an_absent_item_is_a_no_op() {
        let mut cart = Cart::new();

        assert!(!cart.update_quantity(PartId::new(), 1));
        assert!(cart.is_empty());
    }

    #[test]
    fn copies_do_not_follow_part_edits() -> TestResult {
        let mut cart = Cart::new();
        let mut stick = part("PS5", "Analog", 450, true);
        cart.add(&stick);

        stick.price = 999;

        assert_eq!(cart.item(stick.id).ok_or("missing item")?.part.price, 450);

        Ok(())
    }

    #[test]
    fn category_cascades_relabel_and_drop() {
        let mut cart = Cart::new();
        cart.add(&part("PS5", "Analog", 450, true));
        cart.add(&part("PS4", "PSU", 1200, true));

        cart.apply(&CatalogEvent::CategoryRenamed {
            from: "PS5".to_string(),
            to: "PS5-NEW".to_string(),
        });

        assert!(cart.items().iter().any(|item| item.part.category == "PS5-NEW"));
        assert!(cart.items().iter().all(|item| item.part.category != "PS5"));

        cart.apply(&CatalogEvent::CategoryDeleted("PS4".to_string()));

        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn subcategory_cascades_are_scoped_to_category() {
        let mut cart = Cart::new();
        cart.add(&part("PS5", "Analog", 450, true));
        cart.add(&part("PS4", "Analog", 300, true));

        cart.apply(&CatalogEvent::SubcategoryRenamed {
            category: "PS5".to_string(),
            from: "Analog".to_string(),
            to: "Sticks".to_string(),
        });

        assert!(cart.items().iter().any(|item| item.part.is_in("PS5", "Sticks")));
        assert!(cart.items().iter().any(|item| item.part.is_in("PS4", "Analog")));

        let changed = cart.apply(&CatalogEvent::SubcategoryDeleted {
            category: "PS4".to_string(),
            subcategory: "Analog".to_string(),
        });

        assert!(changed);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn part_deletion_removes_item() {
        let mut cart = Cart::new();
        let stick = part("PS5", "Analog", 450, true);
        cart.add(&stick);

        assert!(cart.apply(&CatalogEvent::PartDeleted(stick.id)));
        assert!(cart.is_empty());
        assert!(!cart.apply(&CatalogEvent::PartDeleted(stick.id)));
    }

    #[test]
    fn reconcile_drops_parts_missing_from_catalog() {
        let stick = part("PS5", "Analog", 450, true);
        let power = part("PS4", "PSU", 1200, true);

        let mut cart = Cart::new();
        cart.add(&stick);
        cart.add(&power);

        let catalog = Catalog::with_contents(["PS5"], vec![stick.clone()]);

        assert!(cart.reconcile(&catalog));
        assert_eq!(cart.len(), 1);
        assert!(cart.item(stick.id).is_some());
        assert!(!cart.reconcile(&catalog));
    }

    #[test]
    fn serializes_as_flat_item_array() -> TestResult {
        let mut cart = Cart::new();
        cart.add(&part("PS5", "Analog", 450, true));

        let json = serde_json::to_value(&cart)?;

        let item = json
            .as_array()
            .and_then(|items| items.first())
            .ok_or("cart must serialize as an array")?;

        assert_eq!(item.get("quantity"), Some(&serde_json::json!(1)));
        assert_eq!(item.get("price"), Some(&serde_json::json!(450)));
        assert_eq!(item.get("category"), Some(&serde_json::json!("PS5")));

        Ok(())
    }

    #[test]
    fn from_items_merges_duplicates() -> TestResult {
        let stick = part("PS5", "Analog", 450, true);

        let cart = Cart::from_items([
            CartItem {
                part: stick.clone(),
                quantity: 2,
            },
            CartItem {
                part: stick.clone(),
                quantity: 0,
            },
        ]);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item(stick.id).ok_or("missing item")?.quantity, 3);

        Ok(())
    }
}
