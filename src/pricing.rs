//! Prices

use rusty_money::{Money, MoneyError, iso};
use thiserror::Error;

use crate::cart::{Cart, CartItem};

/// Store currency. Prices are whole New Taiwan dollars.
pub const CURRENCY: &iso::Currency = iso::TWD;

/// Errors that can occur while converting amounts to money.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Amount does not fit the money representation.
    #[error("amount out of range: {0}")]
    OutOfRange(u64),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Convert a whole-unit amount to money in the store currency.
///
/// # Errors
///
/// Returns [`PricingError::OutOfRange`] for amounts above `i64::MAX`.
pub fn to_money(amount: u64) -> Result<Money<'static, iso::Currency>, PricingError> {
    let major = i64::try_from(amount).map_err(|_err| PricingError::OutOfRange(amount))?;

    Ok(Money::from_major(major, CURRENCY))
}

/// Price times quantity for one cart line.
///
/// # Errors
///
/// See [`to_money`].
pub fn line_total(item: &CartItem) -> Result<Money<'static, iso::Currency>, PricingError> {
    to_money(item.subtotal())
}

/// Calculates the total price of a cart
///
/// # Errors
///
/// - [`PricingError::OutOfRange`]: A line total does not fit.
/// - [`PricingError::Money`]: Wrapped money arithmetic error.
pub fn cart_total(cart: &Cart) -> Result<Money<'static, iso::Currency>, PricingError> {
    let total = cart
        .items()
        .iter()
        .try_fold(Money::from_major(0, CURRENCY), |acc, item| {
            Ok::<_, PricingError>(acc.add(line_total(item)?)?)
        })?;

    Ok(total)
}

/// Display string for an amount, e.g. for the price list.
pub fn format_amount(amount: u64) -> String {
    to_money(amount).map_or_else(
        |_err| format!("{amount} {}", CURRENCY.iso_alpha_code),
        |money| money.to_string(),
    )
}
