//! Handlers for photo endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload` | Multipart: `image` file + `userId` text field |
//! | `POST` | `/like` | Body: [`LikeBody`]; toggles the like, 404 if unknown |
//! | `GET`  | `/photos` | Every photo with its owner, in upload order |
//! | `GET`  | `/photos/{id}` | One photo with its owner, 404 if unknown |
//! | `GET`  | `/top-photos` | The [`TOP_PHOTOS_LIMIT`] most liked photos |

use axum::{
  Json,
  extract::{
    Multipart, Path, State,
    multipart::{MultipartError, MultipartRejection},
    rejection::JsonRejection,
  },
  http::StatusCode,
};
use photoshare_core::{
  photo::{NewPhoto, Photo, PhotoView},
  relay::{MediaRelay, MediaUpload},
  store::{AccountStore, PhotoStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// How many photos `GET /top-photos` returns.
pub const TOP_PHOTOS_LIMIT: usize = 5;

const NO_FILE: &str = "No file uploaded";
const PHOTO_NOT_FOUND: &str = "Photo not found";

/// A photo id that is not a UUID cannot name any photo.
fn parse_photo_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(PHOTO_NOT_FOUND.to_owned()))
}

// ─── Upload ───────────────────────────────────────────────────────────────────

/// The parts of an upload form this server understands.
#[derive(Default)]
struct UploadForm {
  image:   Option<MediaUpload>,
  user_id: Option<String>,
}

fn multipart_error(e: MultipartError) -> ApiError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::TooLarge(e.body_text())
  } else {
    ApiError::BadRequest(e.body_text())
  }
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
  let mut form = UploadForm::default();

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(multipart_error)?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("image") => {
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field
          .bytes()
          .await
          .map_err(multipart_error)?;
        // Browsers send an empty part when no file was picked.
        if !data.is_empty() {
          form.image = Some(MediaUpload { data, file_name, content_type });
        }
      }
      Some("userId") => {
        let text = field
          .text()
          .await
          .map_err(multipart_error)?;
        form.user_id = Some(text);
      }
      _ => {}
    }
  }

  Ok(form)
}

/// `POST /upload`: forwards `image` to the media relay and records the photo
/// under `userId`.
pub async fn upload<S, R>(
  State(state): State<ApiState<S, R>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Photo>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  // Not multipart at all means there is no file either.
  let multipart = multipart.map_err(|_| ApiError::BadRequest(NO_FILE.to_owned()))?;
  let form = read_upload_form(multipart).await?;

  let image = form
    .image
    .ok_or_else(|| ApiError::BadRequest(NO_FILE.to_owned()))?;
  let owner_id = form
    .user_id
    .ok_or_else(|| ApiError::BadRequest("userId is required".to_owned()))?;
  let owner_id = Uuid::parse_str(owner_id.trim())
    .map_err(|_| ApiError::BadRequest(format!("invalid userId: {owner_id:?}")))?;

  let hosted = state
    .relay
    .upload(image)
    .await
    .map_err(|e| ApiError::Upstream(Box::new(e)))?;

  let photo = state
    .store
    .create_photo(NewPhoto { url: hosted.url, owner_id })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    photo_id = %photo.photo_id,
    %owner_id,
    public_id = %hosted.public_id,
    "photo uploaded"
  );
  Ok(Json(photo))
}

// ─── Like ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /like`.
#[derive(Debug, Deserialize)]
pub struct LikeBody {
  /// Parsed by the handler; an unparseable id is reported as not found.
  #[serde(rename = "photoId")]
  pub photo_id: String,
  /// Not checked against the account table.
  #[serde(rename = "userId")]
  pub user_id:  Uuid,
}

/// `POST /like`: like if `userId` has not liked the photo yet, unlike
/// otherwise.
pub async fn like<S, R>(
  State(state): State<ApiState<S, R>>,
  body: Result<Json<LikeBody>, JsonRejection>,
) -> Result<Json<PhotoView>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let photo_id = parse_photo_id(&body.photo_id)?;

  let view = state
    .store
    .toggle_like(photo_id, body.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(PHOTO_NOT_FOUND.to_owned()))?;
  Ok(Json(view))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /photos`
pub async fn list<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<Vec<PhotoView>>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  let photos = state.store.list_photos().await.map_err(ApiError::store)?;
  Ok(Json(photos))
}

/// `GET /photos/{id}`
pub async fn get_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<String>,
) -> Result<Json<PhotoView>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  let id = parse_photo_id(&id)?;
  let photo = state
    .store
    .get_photo(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(PHOTO_NOT_FOUND.to_owned()))?;
  Ok(Json(photo))
}

/// `GET /top-photos`
pub async fn top<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<Vec<PhotoView>>, ApiError>
where
  S: AccountStore + PhotoStore + 'static,
  R: MediaRelay + 'static,
{
  let photos = state
    .store
    .top_photos(TOP_PHOTOS_LIMIT)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(photos))
}
