//! Handlers for `/signup` and `/login`, plus credential hashing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/signup` | Body: [`SignupBody`]; returns the new account |
//! | `POST` | `/login`  | Body: [`LoginBody`]; returns `{"token": ...}` or 401 |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use photoshare_core::{
  account::{Account, AccountView, NewAccount},
  relay::MediaRelay,
  store::{AccountStore, PhotoStore},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ApiState, error::ApiError};

// ─── Credentials ──────────────────────────────────────────────────────────────

/// Hash `credential` into an argon2 PHC string.
pub fn hash_credential(credential: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(credential.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// `false` for a wrong credential and for an unparseable stored hash.
pub fn verify_credential(hash: &str, credential: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| {
      Argon2::default().verify_password(credential.as_bytes(), &parsed)
    })
    .is_ok()
}

/// The first account registered under `identifier` whose credential matches.
///
/// Identifiers are not unique, so every candidate is checked in signup order.
/// Hash verification runs on the blocking pool.
pub async fn find_by_credentials<S>(
  store: &S,
  identifier: &str,
  credential: &str,
) -> Result<Option<Account>, ApiError>
where
  S: AccountStore,
{
  let candidates = store
    .find_accounts_by_identifier(identifier)
    .await
    .map_err(ApiError::store)?;
  if candidates.is_empty() {
    return Ok(None);
  }

  let credential = credential.to_owned();
  tokio::task::spawn_blocking(move || {
    candidates
      .into_iter()
      .find(|a| verify_credential(&a.credential_hash, &credential))
  })
  .await
  .map_err(|e| ApiError::Internal(e.to_string()))
}

// ─── Signup ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /signup`. Any extra fields are kept as the
/// account's profile.
#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub identifier: String,
  pub credential: String,
  #[serde(flatten)]
  pub profile:    Map<String, Value>,
}

/// `POST /signup`: returns the created account without its credential.
pub async fn signup<S, R>(
  State(state): State<ApiState<S, R>>,
  body: Result<Json<SignupBody>, JsonRejection>,
) -> Result<Json<AccountView>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  if body.identifier.is_empty() || body.credential.is_empty() {
    return Err(ApiError::BadRequest(
      "identifier and credential are required".to_owned(),
    ));
  }

  let credential = body.credential;
  let hash = tokio::task::spawn_blocking(move || hash_credential(&credential))
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

  let input = NewAccount::new(body.identifier, hash, body.profile)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let account = state
    .store
    .create_account(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account_id = %account.account_id, "account created");
  Ok(Json(account.view()))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub identifier: String,
  pub credential: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub token: String,
}

/// `POST /login`: 401 unless some account matches both fields.
pub async fn login<S, R>(
  State(state): State<ApiState<S, R>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  let account =
    find_by_credentials(state.store.as_ref(), &body.identifier, &body.credential)
      .await?
      .ok_or(ApiError::Unauthorized)?;

  let token = state
    .tokens
    .issue(account.account_id)
    .map_err(|e| ApiError::Internal(format!("jwt encode: {e}")))?;
  Ok(Json(TokenResponse { token }))
}
