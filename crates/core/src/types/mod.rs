//! Core types for Pantry.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod country;
pub mod id;
pub mod price;
pub mod status;

pub use address::Address;
pub use country::{CountryCode, CountryCodeError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
