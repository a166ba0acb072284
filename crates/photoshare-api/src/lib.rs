//! JSON REST API for photoshare.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`AccountStore`] and [`PhotoStore`], and any [`MediaRelay`]. TLS, CORS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(photoshare_api::api_router(state))
//! ```

pub mod accounts;
pub mod error;
pub mod photos;
pub mod token;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use photoshare_core::{
  relay::MediaRelay,
  store::{AccountStore, PhotoStore},
};

pub use error::ApiError;
pub use token::TokenIssuer;

/// Shared state threaded through all API handlers.
pub struct ApiState<S, R> {
  pub store:  Arc<S>,
  pub relay:  Arc<R>,
  pub tokens: Arc<TokenIssuer>,
}

// Manual impl: cloning only bumps the `Arc`s, so `S` and `R` need not be
// `Clone`.
impl<S, R> Clone for ApiState<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      relay:  Arc::clone(&self.relay),
      tokens: Arc::clone(&self.tokens),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, R>(state: ApiState<S, R>) -> Router<()>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  Router::new()
    // Accounts
    .route("/signup", post(accounts::signup::<S, R>))
    .route("/login", post(accounts::login::<S, R>))
    // Photos
    .route("/upload", post(photos::upload::<S, R>))
    .route("/like", post(photos::like::<S, R>))
    .route("/photos", get(photos::list::<S, R>))
    .route("/photos/{id}", get(photos::get_one::<S, R>))
    .route("/top-photos", get(photos::top::<S, R>))
    .with_state(state)
}
