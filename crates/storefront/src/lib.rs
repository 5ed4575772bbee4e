//! Pantry Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Modules
//!
//! - [`catalog`] - Cached product and shipping lookups
//! - [`forms`] - Checkout step forms and the add-to-cart form
//! - [`routes`] - Cart and checkout handlers, plus [`routes::app`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
