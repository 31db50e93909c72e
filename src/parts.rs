//! Parts

use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

/// Part identifier. Assigned at creation and never changed.
pub type PartId = TypedUuid<Part>;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Part identifier
    pub id: PartId,

    /// Display name
    pub name: String,

    /// Name of the category the part is filed under
    pub category: String,

    /// Free-form grouping within the category
    pub subcategory: String,

    /// Price in whole currency units
    pub price: u64,

    /// Sales description, possibly generated
    #[serde(default)]
    pub description: String,

    /// Image URL or embedded data URL
    #[serde(default)]
    pub image_url: String,

    /// Availability flag
    pub in_stock: bool,
}

impl Part {
    /// Build a part from its editable fields and an identifier.
    #[must_use]
    pub fn from_data(id: PartId, data: PartData) -> Self {
        let PartData {
            name,
            category,
            subcategory,
            price,
            description,
            image_url,
            in_stock,
        } = data;

        Self {
            id,
            name,
            category,
            subcategory,
            price,
            description,
            image_url,
            in_stock,
        }
    }

    /// Whether the part is filed under the given category and subcategory.
    pub fn is_in(&self, category: &str, subcategory: &str) -> bool {
        self.category == category && self.subcategory == subcategory
    }
}

/// The editable fields of a part, as submitted by the edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartData {
    /// Display name
    pub name: String,

    /// Category name
    pub category: String,

    /// Subcategory name
    pub subcategory: String,

    /// Price in whole currency units
    pub price: u64,

    /// Sales description
    #[serde(default)]
    pub description: String,

    /// Image URL or embedded data URL
    #[serde(default)]
    pub image_url: String,

    /// Availability flag
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

fn in_stock_default() -> bool {
    true
}

impl From<Part> for PartData {
    fn from(part: Part) -> Self {
        Self {
            name: part.name,
            category: part.category,
            subcategory: part.subcategory,
            price: part.price,
            description: part.description,
            image_url: part.image_url,
            in_stock: part.in_stock,
        }
    }
}
