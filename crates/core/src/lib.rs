//! Pantry Core - checkout domain library.
//!
//! This crate provides the types and rules shared by the Pantry components:
//! - `storefront` - Public-facing shop with cart and multi-step checkout
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure logic - no I/O, no
//! database access, no HTTP. Storage and sessions are supplied by callers.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, country codes and statuses
//! - [`checkout`] - Checkout session and step state machine
//! - [`shipping`] - Shipping methods, zones and the eligibility resolver
//! - [`cart`] - Products, cart lines, quantity rules and render cache keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod shipping;
pub mod types;

pub use types::*;
