//! Pantry Core - Shared types library.
//!
//! This crate provides the types shared by the `pantry-cart` store and the
//! `pantry-cli` binary:
//! - [`ProductId`] - Type-safe product identifier
//! - [`Price`] and [`CurrencyCode`] - Decimal amounts with display formatting
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
