//! Process host for photoshare: configuration, the outer router and
//! shutdown handling.
//!
//! The binary in `main.rs` wires these together with a [`SqliteStore`] and a
//! [`CloudinaryRelay`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use photoshare_api::{ApiState, TokenIssuer, api_router, token::DEFAULT_TOKEN_TTL_SECS};
use photoshare_relay::{CloudinaryConfig, CloudinaryRelay, SignatureAlgorithm};
use photoshare_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::signal::{self, ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PHOTOSHARE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                           String,
  #[serde(default = "default_port")]
  pub port:                           u16,
  #[serde(default = "default_database_path")]
  pub database_path:                  PathBuf,
  pub jwt_secret:                     String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs:                 i64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:               usize,
  pub cloudinary_cloud_name:          String,
  pub cloudinary_api_key:             String,
  pub cloudinary_api_secret:          String,
  #[serde(default = "default_cloudinary_api_base")]
  pub cloudinary_api_base:            String,
  #[serde(default)]
  pub cloudinary_folder:              Option<String>,
  /// `sha1` (Cloudinary's default) or `sha256`.
  #[serde(default)]
  pub cloudinary_signature_algorithm: SignatureAlgorithm,
  #[serde(default = "default_relay_timeout_secs")]
  pub relay_timeout_secs:             u64,
}

fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 5000 }
fn default_database_path() -> PathBuf { PathBuf::from("photoshare.db") }
fn default_token_ttl_secs() -> i64 { DEFAULT_TOKEN_TTL_SECS }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }
fn default_cloudinary_api_base() -> String {
  "https://api.cloudinary.com/v1_1".to_owned()
}
fn default_relay_timeout_secs() -> u64 { 60 }

impl ServerConfig {
  pub fn cloudinary(&self) -> CloudinaryConfig {
    CloudinaryConfig {
      cloud_name: self.cloudinary_cloud_name.clone(),
      api_key:    self.cloudinary_api_key.clone(),
      api_secret: self.cloudinary_api_secret.clone(),
      api_base:   self.cloudinary_api_base.clone(),
      folder:     self.cloudinary_folder.clone(),
      timeout:    Duration::from_secs(self.relay_timeout_secs),
      signature:  self.cloudinary_signature_algorithm,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Database ─────────────────────────────────────────────────────────────────

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

/// Open the configured database. The server cannot run without it, so the
/// caller treats an error here as fatal.
pub async fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(&config.database_path);
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open database at {path:?}"))?;
  tracing::info!(?path, "database opened");
  Ok(store)
}

// ─── Application state ────────────────────────────────────────────────────────

/// The concrete state the binary serves with.
pub type AppState = ApiState<SqliteStore, CloudinaryRelay>;

/// Build the application state from an opened store.
pub fn app_state(
  store: SqliteStore,
  config: &ServerConfig,
) -> photoshare_relay::Result<AppState> {
  Ok(ApiState {
    store:  Arc::new(store),
    relay:  Arc::new(CloudinaryRelay::new(config.cloudinary())?),
    tokens: Arc::new(TokenIssuer::new(&config.jwt_secret, config.token_ttl_secs)),
  })
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API plus `/health`, with body limit, CORS and request tracing.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .merge(api_router(state))
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

// ─── Shutdown ─────────────────────────────────────────────────────────────────

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
  let ctrl_c = async {
    match ctrl_c().await {
      Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
        tracing::info!("received terminate signal, shutting down");
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use config::{Config, File, FileFormat};
  use tower::ServiceExt as _;

  use super::*;

  const MINIMAL: &str = r#"
    jwt_secret            = "secret"
    cloudinary_cloud_name = "demo"
    cloudinary_api_key    = "key"
    cloudinary_api_secret = "shh"
  "#;

  fn load(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  async fn test_router(max_upload_bytes: usize) -> Router {
    let mut config = load(MINIMAL);
    config.max_upload_bytes = max_upload_bytes;
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(app_state(store, &config).unwrap(), &config)
  }

  #[test]
  fn defaults_fill_optional_settings() {
    let config = load(MINIMAL);
    assert_eq!(config.address(), "0.0.0.0:5000");
    assert_eq!(config.database_path, PathBuf::from("photoshare.db"));
    assert_eq!(config.token_ttl_secs, 3600);
    assert!(config.cloudinary_folder.is_none());
    assert_eq!(config.cloudinary_signature_algorithm, SignatureAlgorithm::Sha1);

    let cloudinary = config.cloudinary();
    assert_eq!(cloudinary.api_base, "https://api.cloudinary.com/v1_1");
    assert_eq!(cloudinary.timeout, Duration::from_secs(60));
  }

  #[test]
  fn signature_algorithm_is_configurable() {
    let config = load(&format!("{MINIMAL}\ncloudinary_signature_algorithm = \"sha256\""));
    assert_eq!(config.cloudinary().signature, SignatureAlgorithm::Sha256);
  }

  #[tokio::test]
  async fn unopenable_database_is_an_error() {
    let mut config = load(MINIMAL);
    config.database_path = std::env::temp_dir()
      .join(format!("photoshare-missing-{}", std::process::id()))
      .join("nested")
      .join("photoshare.db");

    let err = open_store(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("failed to open database"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/p.db")), PathBuf::from(home).join("p.db"));
    assert_eq!(expand_tilde(Path::new("/abs/p.db")), PathBuf::from("/abs/p.db"));
  }

  #[test]
  fn missing_secret_is_an_error() {
    let result = Config::builder()
      .add_source(File::from_str("port = 8080", FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn health_is_ok() {
    let resp = test_router(1024)
      .await
      .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn cors_allows_any_origin() {
    let resp = test_router(1024)
      .await
      .oneshot(
        Request::builder()
          .uri("/photos")
          .header(header::ORIGIN, "http://localhost:3000")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "*"
    );
  }

  #[tokio::test]
  async fn oversized_upload_is_rejected() {
    let boundary = "b";
    let mut body = format!(
      "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
       filename=\"big.jpg\"\r\n\r\n"
    )
    .into_bytes();
    body.extend(std::iter::repeat_n(b'x', 4096));
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let resp = test_router(1024)
      .await
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/upload")
          .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
          )
          .body(Body::from(body))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }
}
