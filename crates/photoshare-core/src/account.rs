//! Accounts: the identities that own and like photos.
//!
//! The credential is stored only as an argon2 PHC string and never leaves the
//! process: every outward-facing shape goes through [`AccountView`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

/// Profile keys that collide with fields of the serialised [`AccountView`].
pub const RESERVED_PROFILE_FIELDS: &[&str] =
  &["id", "identifier", "credential", "createdAt"];

// ─── Account ─────────────────────────────────────────────────────────────────

/// A registered identity. Never mutated after signup.
#[derive(Debug, Clone)]
pub struct Account {
  pub account_id:      Uuid,
  /// Login name. Not guaranteed unique across accounts.
  pub identifier:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub credential_hash: String,
  /// Extra fields supplied at signup, kept verbatim.
  pub profile:         Map<String, Value>,
  pub created_at:      DateTime<Utc>,
}

impl Account {
  /// The public projection of this account.
  pub fn view(&self) -> AccountView {
    AccountView {
      account_id: self.account_id,
      identifier: self.identifier.clone(),
      profile:    self.profile.clone(),
      created_at: self.created_at,
    }
  }
}

/// Everything about an account except its credential.
///
/// Serialises as `{"id", "identifier", "createdAt", ...profile}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
  #[serde(rename = "id")]
  pub account_id: Uuid,
  pub identifier: String,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub profile:    Map<String, Value>,
}

// ─── NewAccount ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::AccountStore::create_account`].
/// `account_id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub identifier:      String,
  pub credential_hash: String,
  pub profile:         Map<String, Value>,
}

impl NewAccount {
  /// Build a new account, rejecting profile fields that would shadow the
  /// account's own fields on the wire.
  pub fn new(
    identifier: impl Into<String>,
    credential_hash: impl Into<String>,
    profile: Map<String, Value>,
  ) -> Result<Self> {
    if let Some(key) = profile
      .keys()
      .find(|k| RESERVED_PROFILE_FIELDS.contains(&k.as_str()))
    {
      return Err(Error::ReservedProfileField(key.clone()));
    }

    Ok(Self {
      identifier: identifier.into(),
      credential_hash: credential_hash.into(),
      profile,
    })
  }
}
