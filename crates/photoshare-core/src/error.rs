//! Error types for `photoshare-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("profile field {0:?} is reserved")]
  ReservedProfileField(String),

  #[error("photo {photo_id} has likes = {likes} but {liked_by} likers")]
  InconsistentLikes {
    photo_id: Uuid,
    likes:    u64,
    liked_by: usize,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
