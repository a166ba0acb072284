//! Domain types for photoshare: accounts, photos, and the store and media
//! relay traits the HTTP layer is written against.
//!
//! No HTTP or database code lives here.

#![allow(async_fn_in_trait)]

pub mod account;
pub mod error;
pub mod photo;
pub mod relay;
pub mod store;

pub use error::{Error, Result};
