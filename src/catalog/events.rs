//! Catalog events and change sets

use crate::{
    catalog::Category,
    parts::{Part, PartId},
};

/// What a catalog mutation did, as seen by dependents such as the cart and the
/// active selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A category was appended to the category set.
    CategoryAdded(String),

    /// A category and every part in it were renamed.
    CategoryRenamed {
        /// Previous name
        from: String,
        /// New name
        to: String,
    },

    /// A category and every part in it were deleted.
    CategoryDeleted(String),

    /// Every part in a subcategory was moved to a new subcategory name.
    SubcategoryRenamed {
        /// Owning category
        category: String,
        /// Previous subcategory name
        from: String,
        /// New subcategory name
        to: String,
    },

    /// Every part in a subcategory was deleted.
    SubcategoryDeleted {
        /// Owning category
        category: String,
        /// Deleted subcategory name
        subcategory: String,
    },

    /// A part was created.
    PartCreated(PartId),

    /// A part's editable fields were replaced.
    PartUpdated(PartId),

    /// A part was deleted.
    PartDeleted(PartId),
}

/// The result of a local catalog mutation: the event for dependents plus the
/// documents the persistence layer has to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogChange {
    /// Event to fan out to dependents
    pub event: CatalogEvent,

    /// Parts to write in full
    pub upserted_parts: Vec<Part>,

    /// Parts to delete
    pub removed_parts: Vec<PartId>,

    /// Category documents to write
    pub upserted_categories: Vec<Category>,

    /// Category documents to delete, by name
    pub removed_categories: Vec<String>,
}

impl CatalogChange {
    pub(crate) fn new(event: CatalogEvent) -> Self {
        Self {
            event,
            upserted_parts: Vec::new(),
            removed_parts: Vec::new(),
            upserted_categories: Vec::new(),
            removed_categories: Vec::new(),
        }
    }

    /// Number of document writes needed to persist this change.
    pub fn write_count(&self) -> usize {
        self.upserted_parts.len()
            + self.removed_parts.len()
            + self.upserted_categories.len()
            + self.removed_categories.len()
    }

    /// The part created or updated by this change, if any.
    pub fn part(&self) -> Option<&Part> {
        match &self.event {
            CatalogEvent::PartCreated(id) | CatalogEvent::PartUpdated(id) => {
                self.upserted_parts.iter().find(|part| part.id == *id)
            }
            _ => None,
        }
    }
}
