//! GamePart Hub
//!
//! Domain core for a console repair-parts storefront: the part catalog with its
//! cascading category and subcategory edits, the cart of denormalized part
//! copies, the view filter, and the checkout state machine.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod filter;
pub mod fixtures;
pub mod parts;
pub mod prelude;
pub mod pricing;
pub mod replica;
pub mod uuids;
