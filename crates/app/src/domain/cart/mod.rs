//! Cart

pub mod service;

pub use service::*;
