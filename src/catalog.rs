//! Catalog
//!
//! The catalog owns the part list and the ordered category set. Subcategories
//! are never stored; they are the distinct `subcategory` values of the parts in
//! a category. Every mutation validates first and only then touches state, so a
//! rejected call leaves the catalog exactly as it was.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parts::{Part, PartData, PartId};

pub mod events;

pub use events::{CatalogChange, CatalogEvent};

/// Errors raised by catalog mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Caller-supplied data failed a precondition.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// The named category is not in the category set.
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// No part is filed under the given category and subcategory.
    #[error("subcategory not found: {category} > {subcategory}")]
    SubcategoryNotFound {
        /// Category that was searched
        category: String,
        /// Subcategory that was not found
        subcategory: String,
    },

    /// No part has the given identifier.
    #[error("part not found: {0}")]
    PartNotFound(PartId),
}

/// Validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    /// A category name was empty or blank.
    #[error("category name must not be empty")]
    EmptyCategoryName,

    /// A category with that name already exists.
    #[error("category already exists: {0}")]
    DuplicateCategory(String),

    /// A part name was empty or blank.
    #[error("part name must not be empty")]
    EmptyPartName,

    /// A subcategory name was empty or blank.
    #[error("subcategory must not be empty")]
    EmptySubcategory,

    /// A part referenced a category outside the category set.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// A category document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category name
    pub name: String,

    /// Sort key within the category set
    pub position: u32,
}

/// Parts plus the ordered category set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    parts: Vec<Part>,
    categories: Vec<Category>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from category names (in order) and parts.
    ///
    /// Duplicate category names and duplicate part ids keep their first
    /// occurrence.
    pub fn with_contents<I, S>(categories: I, parts: Vec<Part>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories
            .into_iter()
            .zip(0_u32..)
            .map(|(name, position)| Category {
                name: name.into(),
                position,
            })
            .collect();

        let mut catalog = Self::new();

        catalog.apply_categories_snapshot(categories);
        catalog.apply_parts_snapshot(parts);

        catalog
    }

    /// All parts, in insertion order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Look up a part by id.
    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|part| part.id == id)
    }

    /// Category names, in order.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.iter().map(|category| category.name.as_str())
    }

    /// Category documents, in order.
    pub fn category_entries(&self) -> &[Category] {
        &self.categories
    }

    /// Whether the category set contains `name`.
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category.name == name)
    }

    /// Number of parts filed under `category`.
    pub fn part_count(&self, category: &str) -> usize {
        self.parts
            .iter()
            .filter(|part| part.category == category)
            .count()
    }

    /// Number of parts filed under `category` > `subcategory`.
    pub fn subcategory_part_count(&self, category: &str, subcategory: &str) -> usize {
        self.parts
            .iter()
            .filter(|part| part.is_in(category, subcategory))
            .count()
    }

    /// Distinct subcategories of `category`, in first-seen order.
    ///
    /// The iterator is lazy and can be cloned to restart from the beginning.
    pub fn subcategories<'a>(&'a self, category: &'a str) -> Subcategories<'a> {
        Subcategories {
            parts: self.parts.iter(),
            category,
            seen: FxHashSet::default(),
        }
    }

    /// Append a category.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::EmptyCategoryName`] or
    /// [`InvalidInput::DuplicateCategory`].
    pub fn add_category(&mut self, name: &str) -> Result<CatalogChange, CatalogError> {
        let name = self.new_category_name(name)?;

        let category = Category {
            position: self
                .categories
                .last()
                .map_or(0, |last| last.position.saturating_add(1)),
            name: name.clone(),
        };

        self.categories.push(category.clone());

        let mut change = CatalogChange::new(CatalogEvent::CategoryAdded(name));
        change.upserted_categories.push(category);

        Ok(change)
    }

    /// Rename a category and every part filed under it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] when `new_name` is empty or already taken, and
    /// [`CatalogError::CategoryNotFound`] when `old_name` is absent.
    pub fn rename_category(
        &mut self,
        old_name: &str,
        new_name: &str,
    ) -> Result<CatalogChange, CatalogError> {
        let new_name = self.new_category_name(new_name)?;

        let index = self
            .category_index(old_name)
            .ok_or_else(|| CatalogError::CategoryNotFound(old_name.to_string()))?;

        let mut change = CatalogChange::new(CatalogEvent::CategoryRenamed {
            from: old_name.to_string(),
            to: new_name.clone(),
        });

        if let Some(category) = self.categories.get_mut(index) {
            category.name.clone_from(&new_name);
            change.upserted_categories.push(category.clone());
        }

        change.removed_categories.push(old_name.to_string());

        for part in &mut self.parts {
            if part.category == old_name {
                part.category.clone_from(&new_name);
                change.upserted_parts.push(part.clone());
            }
        }

        Ok(change)
    }

    /// Delete a category together with every part filed under it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CategoryNotFound`] when `name` is absent.
    pub fn delete_category(&mut self, name: &str) -> Result<CatalogChange, CatalogError> {
        let index = self
            .category_index(name)
            .ok_or_else(|| CatalogError::CategoryNotFound(name.to_string()))?;

        self.categories.remove(index);

        let mut change = CatalogChange::new(CatalogEvent::CategoryDeleted(name.to_string()));
        change.removed_categories.push(name.to_string());
        change.removed_parts = self.remove_parts_where(|part| part.category == name);

        Ok(change)
    }

    /// Create a part with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] when the name or subcategory is empty or the
    /// category is not in the category set.
    pub fn create_part(&mut self, data: PartData) -> Result<CatalogChange, CatalogError> {
        let data = self.validate_part(data)?;
        let part = Part::from_data(PartId::new(), data);

        self.parts.push(part.clone());

        let mut change = CatalogChange::new(CatalogEvent::PartCreated(part.id));
        change.upserted_parts.push(part);

        Ok(change)
    }

    /// Replace every editable field of an existing part.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PartNotFound`] for an unknown id, or
    /// [`InvalidInput`] as for [`Catalog::create_part`].
    pub fn update_part(
        &mut self,
        id: PartId,
        data: PartData,
    ) -> Result<CatalogChange, CatalogError> {
        if self.part(id).is_none() {
            return Err(CatalogError::PartNotFound(id));
        }

        let data = self.validate_part(data)?;
        let updated = Part::from_data(id, data);

        let slot = self
            .parts
            .iter_mut()
            .find(|part| part.id == id)
            .ok_or(CatalogError::PartNotFound(id))?;

        slot.clone_from(&updated);

        let mut change = CatalogChange::new(CatalogEvent::PartUpdated(id));
        change.upserted_parts.push(updated);

        Ok(change)
    }

    /// Delete a part.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PartNotFound`] for an unknown id.
    pub fn delete_part(&mut self, id: PartId) -> Result<CatalogChange, CatalogError> {
        let removed = self.remove_parts_where(|part| part.id == id);

        if removed.is_empty() {
            return Err(CatalogError::PartNotFound(id));
        }

        let mut change = CatalogChange::new(CatalogEvent::PartDeleted(id));
        change.removed_parts = removed;

        Ok(change)
    }

    /// Move every part in `category` > `old_name` to `new_name`.
    ///
    /// Renaming onto a subcategory that already exists merges the two groups.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::EmptySubcategory`] for a blank new name and
    /// [`CatalogError::SubcategoryNotFound`] when no part matches.
    pub fn rename_subcategory(
        &mut self,
        category: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<CatalogChange, CatalogError> {
        let new_name = new_name.trim();

        if new_name.is_empty() {
            return Err(InvalidInput::EmptySubcategory.into());
        }

        if self.subcategory_part_count(category, old_name) == 0 {
            return Err(CatalogError::SubcategoryNotFound {
                category: category.to_string(),
                subcategory: old_name.to_string(),
            });
        }

        let mut change = CatalogChange::new(CatalogEvent::SubcategoryRenamed {
            category: category.to_string(),
            from: old_name.to_string(),
            to: new_name.to_string(),
        });

        for part in &mut self.parts {
            if part.is_in(category, old_name) {
                part.subcategory = new_name.to_string();
                change.upserted_parts.push(part.clone());
            }
        }

        Ok(change)
    }

    /// Delete every part in `category` > `subcategory`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::SubcategoryNotFound`] when no part matches.
    pub fn delete_subcategory(
        &mut self,
        category: &str,
        subcategory: &str,
    ) -> Result<CatalogChange, CatalogError> {
        let removed = self.remove_parts_where(|part| part.is_in(category, subcategory));

        if removed.is_empty() {
            return Err(CatalogError::SubcategoryNotFound {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            });
        }

        let mut change = CatalogChange::new(CatalogEvent::SubcategoryDeleted {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        });
        change.removed_parts = removed;

        Ok(change)
    }

    /// Replace the whole part list with a delivery from the store.
    pub fn apply_parts_snapshot(&mut self, parts: Vec<Part>) {
        let mut seen = FxHashSet::default();

        self.parts = parts
            .into_iter()
            .filter(|part| seen.insert(part.id))
            .collect();
    }

    /// Replace the whole category set with a delivery from the store.
    pub fn apply_categories_snapshot(&mut self, mut categories: Vec<Category>) {
        categories.sort_by_key(|category| category.position);

        let mut seen = FxHashSet::default();

        categories.retain(|category| seen.insert(category.name.clone()));

        self.categories = categories;
    }

    fn category_index(&self, name: &str) -> Option<usize> {
        self.categories
            .iter()
            .position(|category| category.name == name)
    }

    fn new_category_name(&self, name: &str) -> Result<String, InvalidInput> {
        let name = name.trim();

        if name.is_empty() {
            return Err(InvalidInput::EmptyCategoryName);
        }

        if self.has_category(name) {
            return Err(InvalidInput::DuplicateCategory(name.to_string()));
        }

        Ok(name.to_string())
    }

    fn validate_part(&self, mut data: PartData) -> Result<PartData, InvalidInput> {
        data.name = data.name.trim().to_string();
        data.subcategory = data.subcategory.trim().to_string();

        if data.name.is_empty() {
            return Err(InvalidInput::EmptyPartName);
        }

        if data.subcategory.is_empty() {
            return Err(InvalidInput::EmptySubcategory);
        }

        if !self.has_category(&data.category) {
            return Err(InvalidInput::UnknownCategory(data.category));
        }

        Ok(data)
    }

    fn remove_parts_where(&mut self, mut predicate: impl FnMut(&Part) -> bool) -> Vec<PartId> {
        let mut removed = Vec::new();

        self.parts.retain(|part| {
            if predicate(part) {
                removed.push(part.id);
                false
            } else {
                true
            }
        });

        removed
    }
}

/// Iterator over the distinct subcategories of one category.
#[derive(Debug, Clone)]
pub struct Subcategories<'a> {
    parts: std::slice::Iter<'a, Part>,
    category: &'a str,
    seen: FxHashSet<&'a str>,
}

impl<'a> Iterator for Subcategories<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let category = self.category;

        self.parts.by_ref().find_map(|part| {
            (part.category == category && self.seen.insert(part.subcategory.as_str()))
                .then_some(part.subcategory.as_str())
        })
    }
}
