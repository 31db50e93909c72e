//! View filter
//!
//! The visible part list is a pure function of the parts and the current
//! [`Selection`].

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, CatalogEvent},
    parts::Part,
};

/// Category half of the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum CategoryFilter {
    /// Every category
    #[default]
    All,

    /// One named category
    Only(String),
}

impl CategoryFilter {
    /// Whether `category` passes the filter.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == category,
        }
    }

    /// The selected category name, if one is selected.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(name) => Some(name),
        }
    }
}

/// Search text plus active category and subcategory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Free-text search, matched case-insensitively
    pub search: String,

    /// Active category
    pub category: CategoryFilter,

    /// Active subcategory, only meaningful with a selected category
    pub subcategory: Option<String>,
}

impl Selection {
    /// Select a category. Any active subcategory is cleared.
    pub fn select_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.subcategory = None;
    }

    /// Select or clear the active subcategory.
    pub fn select_subcategory(&mut self, subcategory: Option<String>) {
        self.subcategory = subcategory;
    }

    /// Replace the search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Whether a part passes all three criteria.
    pub fn matches(&self, part: &Part) -> bool {
        self.category.matches(&part.category)
            && self
                .subcategory
                .as_deref()
                .is_none_or(|subcategory| part.subcategory == subcategory)
            && matches_search(part, &self.search)
    }

    /// Follow a catalog cascade so the selection never points at a name that
    /// no longer exists.
    pub fn apply(&mut self, event: &CatalogEvent) {
        match event {
            CatalogEvent::CategoryRenamed { from, to } => {
                if self.category.name() == Some(from.as_str()) {
                    self.category = CategoryFilter::Only(to.clone());
                }
            }
            CatalogEvent::CategoryDeleted(name) => {
                if self.category.name() == Some(name.as_str()) {
                    self.select_category(CategoryFilter::All);
                }
            }
            CatalogEvent::SubcategoryRenamed { category, from, to } => {
                if self.is_active_subcategory(category, from) {
                    self.subcategory = Some(to.clone());
                }
            }
            CatalogEvent::SubcategoryDeleted {
                category,
                subcategory,
            } => {
                if self.is_active_subcategory(category, subcategory) {
                    self.subcategory = None;
                }
            }
            CatalogEvent::CategoryAdded(_)
            | CatalogEvent::PartCreated(_)
            | CatalogEvent::PartUpdated(_)
            | CatalogEvent::PartDeleted(_) => {}
        }
    }

    /// Clear a category or subcategory that `catalog` no longer has. Returns
    /// `true` when the selection changed.
    pub fn reconcile(&mut self, catalog: &Catalog) -> bool {
        let before = self.clone();

        if let Some(category) = self.category.name()
            && !catalog.has_category(category)
        {
            self.select_category(CategoryFilter::All);
        }

        if let (Some(category), Some(subcategory)) =
            (self.category.name(), self.subcategory.as_deref())
            && catalog.subcategory_part_count(category, subcategory) == 0
        {
            self.subcategory = None;
        }

        *self != before
    }

    fn is_active_subcategory(&self, category: &str, subcategory: &str) -> bool {
        self.category.name() == Some(category) && self.subcategory.as_deref() == Some(subcategory)
    }
}

fn matches_search(part: &Part, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }

    let needle = search.to_lowercase();

    [&part.name, &part.description, &part.subcategory]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Parts matching `selection`, in repository order.
pub fn visible_parts<'a>(
    parts: &'a [Part],
    selection: &'a Selection,
) -> impl Iterator<Item = &'a Part> + 'a {
    parts.iter().filter(move |part| selection.matches(part))
}
