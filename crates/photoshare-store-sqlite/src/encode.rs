//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings and account profiles as compact JSON objects.

use chrono::{DateTime, Utc};
use photoshare_core::{
  account::Account,
  photo::{Photo, PhotoView},
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Like counter ─────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::Decode(format!("like count {n} overflows")))
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative like count: {n}")))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

pub fn encode_profile(profile: &Map<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(profile)?)
}

pub fn decode_profile(s: &str) -> Result<Map<String, Value>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:      String,
  pub identifier:      String,
  pub credential_hash: String,
  pub profile:         String,
  pub created_at:      String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:      decode_uuid(&self.account_id)?,
      identifier:      self.identifier,
      credential_hash: self.credential_hash,
      profile:         decode_profile(&self.profile)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from a `photos` row plus its likers in like order.
pub struct RawPhoto {
  pub photo_id:   String,
  pub url:        String,
  pub owner_id:   String,
  pub likes:      i64,
  pub created_at: String,
  pub liked_by:   Vec<String>,
}

impl RawPhoto {
  pub fn into_photo(self) -> Result<Photo> {
    let liked_by = self
      .liked_by
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<Vec<_>>>()?;

    Ok(Photo::from_parts(
      decode_uuid(&self.photo_id)?,
      self.url,
      decode_uuid(&self.owner_id)?,
      decode_count(self.likes)?,
      liked_by,
      decode_dt(&self.created_at)?,
    )?)
  }
}

/// A [`RawPhoto`] joined with its owner's `accounts` row, if any.
pub struct RawPhotoView {
  pub photo: RawPhoto,
  pub owner: Option<RawAccount>,
}

impl RawPhotoView {
  pub fn into_view(self) -> Result<PhotoView> {
    let photo = self.photo.into_photo()?;
    let owner = self
      .owner
      .map(RawAccount::into_account)
      .transpose()?
      .map(|account| account.view());
    Ok(PhotoView::new(photo, owner))
  }
}
