//! Shared services, persistence and session state for the GamePart Hub
//! storefront and admin console.

pub mod auth;
pub mod config;
pub mod context;
pub mod database;
pub mod descriptions;
pub mod domain;
pub mod observability;
pub mod store;
pub mod storefront;

#[cfg(test)]
mod test;
