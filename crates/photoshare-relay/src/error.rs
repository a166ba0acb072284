//! Error type for `photoshare-relay`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The media host answered with a non-success status.
  #[error("upload rejected ({status}): {message}")]
  Rejected { status: u16, message: String },

  #[error("invalid content type: {0:?}")]
  InvalidContentType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
