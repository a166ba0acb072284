//! Signed uploads to Cloudinary.
//!
//! Requests are signed with SHA-1 unless the configuration selects SHA-256,
//! which must then also be enabled on the Cloudinary account.

use std::time::Duration;

use chrono::Utc;
use photoshare_core::relay::{HostedMedia, MediaRelay, MediaUpload};
use reqwest::{
  Body, Client,
  multipart::{Form, Part},
};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Digest used for request signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
  /// Cloudinary's account default.
  #[default]
  Sha1,
  Sha256,
}

/// Connection settings for a Cloudinary account.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
  pub cloud_name: String,
  pub api_key:    String,
  pub api_secret: String,
  /// Base URL without the cloud name, e.g. `https://api.cloudinary.com/v1_1`.
  pub api_base:   String,
  /// Optional destination folder for uploaded assets.
  pub folder:     Option<String>,
  pub timeout:    Duration,
  pub signature:  SignatureAlgorithm,
}

/// Async client for Cloudinary's upload endpoint.
///
/// Clones share the inner [`reqwest::Client`].
#[derive(Clone)]
pub struct CloudinaryRelay {
  client: Client,
  config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
  secure_url: String,
  public_id:  String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
  message: String,
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
  let mut hasher = D::new();
  hasher.update(to_sign.as_bytes());
  hasher.update(api_secret.as_bytes());
  hex::encode(hasher.finalize())
}

/// Cloudinary request signature: hex digest over the `k=v` pairs sorted by
/// key and joined with `&`, followed directly by the API secret.
///
/// `file`, `api_key`, `cloud_name` and `resource_type` must not be included.
pub fn sign(
  params: &[(&str, &str)],
  api_secret: &str,
  algorithm: SignatureAlgorithm,
) -> String {
  let mut sorted = params.to_vec();
  sorted.sort_by_key(|(k, _)| *k);

  let to_sign = sorted
    .iter()
    .map(|(k, v)| format!("{k}={v}"))
    .collect::<Vec<_>>()
    .join("&");

  match algorithm {
    SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
    SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
  }
}

/// Pull Cloudinary's `{"error":{"message":...}}` out of a failure body,
/// falling back to the raw text.
fn error_message(body: &str) -> String {
  serde_json::from_str::<ErrorBody>(body)
    .map(|b| b.error.message)
    .unwrap_or_else(|_| body.trim().to_owned())
}

impl CloudinaryRelay {
  pub fn new(config: CloudinaryConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  /// `resource_type` is `auto` so images and videos share one endpoint.
  fn upload_url(&self) -> String {
    format!(
      "{}/{}/auto/upload",
      self.config.api_base.trim_end_matches('/'),
      self.config.cloud_name
    )
  }

  fn file_part(media: MediaUpload) -> Result<Part> {
    let len = media.data.len() as u64;
    let part = Part::stream_with_length(Body::from(media.data), len)
      .file_name(media.file_name.unwrap_or_else(|| "upload".to_owned()));

    match media.content_type {
      Some(ct) => part
        .mime_str(&ct)
        .map_err(|_| Error::InvalidContentType(ct.clone())),
      None => Ok(part),
    }
  }
}

impl MediaRelay for CloudinaryRelay {
  type Error = Error;

  async fn upload(&self, media: MediaUpload) -> Result<HostedMedia> {
    let timestamp = Utc::now().timestamp().to_string();

    let mut signed: Vec<(&str, &str)> = vec![("timestamp", timestamp.as_str())];
    if let Some(folder) = self.config.folder.as_deref() {
      signed.push(("folder", folder));
    }
    let signature = sign(&signed, &self.config.api_secret, self.config.signature);

    let mut form = Form::new()
      .text("api_key", self.config.api_key.clone())
      .text("timestamp", timestamp.clone())
      .text("signature", signature);
    if let Some(folder) = &self.config.folder {
      form = form.text("folder", folder.clone());
    }
    let size = media.data.len();
    let form = form.part("file", Self::file_part(media)?);

    tracing::debug!(size, url = %self.upload_url(), "uploading media");
    let resp = self
      .client
      .post(self.upload_url())
      .multipart(form)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Rejected {
        status:  status.as_u16(),
        message: error_message(&body),
      });
    }

    let body: UploadResponse = resp.json().await?;
    Ok(HostedMedia {
      url:       body.secure_url,
      public_id: body.public_id,
    })
  }
}
