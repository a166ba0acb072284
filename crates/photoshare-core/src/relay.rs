//! The `MediaRelay` trait: the hosted service that stores image bytes.
//!
//! The backend never keeps binary data. It hands the upload to a relay and
//! records only the durable URL that comes back.

use std::future::Future;

use bytes::Bytes;

/// A file received from a client, ready to be forwarded.
#[derive(Debug, Clone)]
pub struct MediaUpload {
  pub data:         Bytes,
  /// Original client-side file name, if the client sent one.
  pub file_name:    Option<String>,
  pub content_type: Option<String>,
}

/// Where the relay put the media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMedia {
  /// HTTPS URL suitable for embedding.
  pub url:       String,
  /// The relay's own handle for the asset.
  pub public_id: String,
}

/// Abstraction over a hosted media service.
///
/// Implementations do not retry; a failed upload is reported to the caller
/// as-is.
pub trait MediaRelay: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upload `media` and return its durable location.
  fn upload(
    &self,
    media: MediaUpload,
  ) -> impl Future<Output = Result<HostedMedia, Self::Error>> + Send + '_;
}
