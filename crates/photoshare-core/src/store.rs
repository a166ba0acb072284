//! The `AccountStore` and `PhotoStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `photoshare-store-sqlite`). The HTTP layer depends on these abstractions,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount},
  photo::{NewPhoto, Photo, PhotoView},
};

/// Shared error type for a storage backend.
///
/// Both store traits extend this so a backend that implements both exposes a
/// single `Error`.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Persistence for [`Account`] records.
pub trait AccountStore: Store {
  /// Insert a new account. Identifier uniqueness is not checked.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Retrieve an account by id. Returns `None` if not found.
  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// All accounts registered under `identifier`, oldest first.
  fn find_accounts_by_identifier<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + 'a;
}

// ─── Photos ──────────────────────────────────────────────────────────────────

/// Persistence for [`Photo`] records and the like toggle.
///
/// Every read returns a [`PhotoView`] with the owner resolved.
pub trait PhotoStore: Store {
  /// Record an uploaded photo with zero likes.
  fn create_photo(
    &self,
    input: NewPhoto,
  ) -> impl Future<Output = Result<Photo, Self::Error>> + Send + '_;

  /// Retrieve one photo. Returns `None` if not found.
  fn get_photo(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PhotoView>, Self::Error>> + Send + '_;

  /// All photos in upload order.
  fn list_photos(
    &self,
  ) -> impl Future<Output = Result<Vec<PhotoView>, Self::Error>> + Send + '_;

  /// Apply [`Photo::toggle_like`] for `actor_id` and persist the result.
  ///
  /// The read-modify-write must be atomic with respect to other toggles on
  /// the same photo. Returns `None`, with nothing written, if the photo does
  /// not exist.
  fn toggle_like(
    &self,
    photo_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Option<PhotoView>, Self::Error>> + Send + '_;

  /// Up to `limit` photos ordered by likes descending; ties keep upload
  /// order.
  fn top_photos(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PhotoView>, Self::Error>> + Send + '_;
}
