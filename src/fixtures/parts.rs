//! Part Fixtures

use rusty_money::iso::{self, Currency};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    parts::{Part, PartData, PartId},
    pricing::CURRENCY,
};

/// Part fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PartFixture {
    /// Stable identifier, so seeded parts keep their ids across runs
    pub id: PartId,

    /// Part name
    pub name: String,

    /// Category name
    pub category: String,

    /// Subcategory name
    pub subcategory: String,

    /// Part price (e.g., "450 TWD")
    pub price: String,

    /// Sales description
    #[serde(default)]
    pub description: String,

    /// Image URL
    #[serde(default)]
    pub image_url: String,

    /// Availability
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

fn in_stock_default() -> bool {
    true
}

impl TryFrom<PartFixture> for Part {
    type Error = FixtureError;

    fn try_from(fixture: PartFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price)?;

        Ok(Part::from_data(
            fixture.id,
            PartData {
                name: fixture.name,
                category: fixture.category,
                subcategory: fixture.subcategory,
                price,
                description: fixture.description,
                image_url: fixture.image_url,
                in_stock: fixture.in_stock,
            },
        ))
    }
}

/// Parse a price string (e.g., "450 TWD") into whole currency units.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if
/// the amount is not a non-negative integer, or if the currency is unknown or
/// not the store currency.
pub fn parse_price(s: &str) -> Result<u64, FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<u64>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency: &Currency =
        iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    if currency != CURRENCY {
        return Err(FixtureError::CurrencyMismatch {
            expected: CURRENCY.iso_alpha_code,
            found: code.to_string(),
        });
    }

    Ok(amount)
}
