//! Photos: references to externally hosted media, with ownership and likes.
//!
//! A photo's URL and owner never change after upload. The only mutation is
//! the like toggle, which keeps `likes` equal to the number of likers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, account::AccountView};

// ─── Photo ───────────────────────────────────────────────────────────────────

/// A stored photo record. `user` on the wire is the owner's account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  #[serde(rename = "id")]
  pub photo_id:   Uuid,
  /// Durable URL returned by the media relay.
  pub url:        String,
  /// Not checked against the account table.
  #[serde(rename = "user")]
  pub owner_id:   Uuid,
  pub likes:      u64,
  /// Likers in the order they liked; never contains duplicates.
  #[serde(rename = "likedBy")]
  pub liked_by:   Vec<Uuid>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
}

/// Which way a [`Photo::toggle_like`] went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
  Liked,
  Unliked,
}

impl Photo {
  /// Reassemble a photo from stored parts, checking the like invariant.
  pub fn from_parts(
    photo_id: Uuid,
    url: String,
    owner_id: Uuid,
    likes: u64,
    liked_by: Vec<Uuid>,
    created_at: DateTime<Utc>,
  ) -> Result<Self> {
    if likes != liked_by.len() as u64 {
      return Err(Error::InconsistentLikes {
        photo_id,
        likes,
        liked_by: liked_by.len(),
      });
    }
    Ok(Self { photo_id, url, owner_id, likes, liked_by, created_at })
  }

  /// Flip `actor`'s like: remove it if present, append it otherwise.
  ///
  /// The caller cannot pick a direction; current membership decides.
  pub fn toggle_like(&mut self, actor: Uuid) -> LikeToggle {
    let outcome = match self.liked_by.iter().position(|id| *id == actor) {
      Some(index) => {
        self.liked_by.remove(index);
        LikeToggle::Unliked
      }
      None => {
        self.liked_by.push(actor);
        LikeToggle::Liked
      }
    };
    self.likes = self.liked_by.len() as u64;
    outcome
  }
}

// ─── NewPhoto ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::PhotoStore::create_photo`].
/// Photos always start with no likes.
#[derive(Debug, Clone)]
pub struct NewPhoto {
  pub url:      String,
  pub owner_id: Uuid,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A photo with its owner resolved. Derived on read, never stored.
///
/// `user` is `null` when the owner id does not match any account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoView {
  #[serde(rename = "id")]
  pub photo_id:   Uuid,
  pub url:        String,
  #[serde(rename = "user")]
  pub owner:      Option<AccountView>,
  pub likes:      u64,
  #[serde(rename = "likedBy")]
  pub liked_by:   Vec<Uuid>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
}

impl PhotoView {
  pub fn new(photo: Photo, owner: Option<AccountView>) -> Self {
    Self {
      photo_id: photo.photo_id,
      url: photo.url,
      owner,
      likes: photo.likes,
      liked_by: photo.liked_by,
      created_at: photo.created_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn photo() -> Photo {
    Photo::from_parts(
      Uuid::new_v4(),
      "https://media.example/p.jpg".into(),
      Uuid::new_v4(),
      0,
      vec![],
      Utc::now(),
    )
    .unwrap()
  }

  #[test]
  fn like_then_unlike_restores_state() {
    let mut p = photo();
    let u1 = Uuid::new_v4();

    assert_eq!(p.toggle_like(u1), LikeToggle::Liked);
    assert_eq!(p.likes, 1);
    assert_eq!(p.liked_by, vec![u1]);

    assert_eq!(p.toggle_like(u1), LikeToggle::Unliked);
    assert_eq!(p.likes, 0);
    assert!(p.liked_by.is_empty());
  }

  #[test]
  fn unlike_keeps_order_of_remaining_likers() {
    let mut p = photo();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    p.toggle_like(a);
    p.toggle_like(b);
    p.toggle_like(c);

    p.toggle_like(b);
    assert_eq!(p.liked_by, vec![a, c]);
    assert_eq!(p.likes, 2);
    assert!(!p.liked_by.contains(&b));
  }

  #[test]
  fn likes_always_match_likers() {
    let mut p = photo();
    let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    for step in [0, 1, 0, 2, 3, 1, 3, 0, 2, 2] {
      p.toggle_like(users[step]);
      assert_eq!(p.likes, p.liked_by.len() as u64);
    }
  }

  #[test]
  fn from_parts_rejects_mismatched_count() {
    let err = Photo::from_parts(
      Uuid::nil(),
      "u".into(),
      Uuid::nil(),
      2,
      vec![Uuid::new_v4()],
      Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InconsistentLikes { likes: 2, liked_by: 1, .. }));
  }

  #[test]
  fn wire_shape_uses_camel_case_field_names() {
    let p = photo();
    let value = serde_json::to_value(&p).unwrap();
    for key in ["id", "url", "user", "likes", "likedBy", "createdAt"] {
      assert!(value.get(key).is_some(), "missing {key}");
    }

    let view = serde_json::to_value(PhotoView::new(p, None)).unwrap();
    assert!(view["user"].is_null());
  }
}
