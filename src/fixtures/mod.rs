//! Fixtures
//!
//! YAML descriptions of a catalog. The default catalog is compiled into the
//! crate and used to seed an empty store.

use std::{fs, path::Path};

use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogError, InvalidInput},
    fixtures::parts::PartFixture,
    parts::Part,
};

pub mod parts;

pub use parts::parse_price;

const DEFAULT_CATALOG: &str = include_str!("../../fixtures/catalog/default.yml");

/// Category names a fresh store starts with.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["PS5", "PS4", "XBOX", "SWITCH"];

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Price in a currency other than the store currency
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Store currency
        expected: &'static str,
        /// Currency in the fixture
        found: String,
    },

    /// A part failed catalog validation
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Catalog fixture from YAML
#[derive(Debug, serde::Deserialize)]
pub struct CatalogFixture {
    /// Category names, in order
    pub categories: Vec<String>,

    /// Parts, in order
    #[serde(default)]
    pub parts: Vec<PartFixture>,
}

impl CatalogFixture {
    /// Parse a fixture from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Yaml`] when the text is not a catalog fixture.
    pub fn parse(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Read and parse a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::parse(&contents)
    }

    /// Build a catalog, validating every part against the category list.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed prices, blank names or subcategories,
    /// and parts filed under unknown categories.
    pub fn into_catalog(self) -> Result<Catalog, FixtureError> {
        let parts = self
            .parts
            .into_iter()
            .map(Part::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        for part in &parts {
            if part.name.trim().is_empty() {
                return Err(CatalogError::from(InvalidInput::EmptyPartName).into());
            }

            if part.subcategory.trim().is_empty() {
                return Err(CatalogError::from(InvalidInput::EmptySubcategory).into());
            }

            if !self.categories.contains(&part.category) {
                return Err(
                    CatalogError::from(InvalidInput::UnknownCategory(part.category.clone())).into(),
                );
            }
        }

        Ok(Catalog::with_contents(self.categories, parts))
    }
}

/// The compiled-in default catalog: four console categories and six seed parts.
///
/// # Errors
///
/// Only fails if the embedded fixture is malformed.
pub fn default_catalog() -> Result<Catalog, FixtureError> {
    CatalogFixture::parse(DEFAULT_CATALOG)?.into_catalog()
}
