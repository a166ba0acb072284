//! Bearer tokens issued on login.
//!
//! HS256 JWTs carrying the account id as `userId`.

use chrono::Utc;
use jsonwebtoken::{
  DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default validity of an issued token, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// What's inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  #[serde(rename = "userId")]
  pub user_id: Uuid,
  /// Issued at (unix timestamp).
  pub iat:     i64,
  /// Expiration (unix timestamp).
  pub exp:     i64,
}

/// Signs and checks tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation:   Validation,
  ttl_secs:     i64,
}

impl TokenIssuer {
  pub fn new(secret: &str, ttl_secs: i64) -> Self {
    Self {
      encoding_key: EncodingKey::from_secret(secret.as_bytes()),
      decoding_key: DecodingKey::from_secret(secret.as_bytes()),
      validation: Validation::default(),
      ttl_secs,
    }
  }

  /// Issue a signed token for `user_id`.
  pub fn issue(&self, user_id: Uuid) -> Result<String, Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      user_id,
      iat: now,
      exp: now + self.ttl_secs,
    };
    encode(&Header::default(), &claims, &self.encoding_key)
  }

  /// Check signature and expiry and return the claims.
  pub fn verify(&self, token: &str) -> Result<Claims, Error> {
    decode::<Claims>(token, &self.decoding_key, &self.validation)
      .map(|data| data.claims)
  }
}
