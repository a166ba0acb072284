//! [`SqliteStore`], the SQLite implementation of [`AccountStore`] and
//! [`PhotoStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use photoshare_core::{
  account::{Account, NewAccount},
  photo::{LikeToggle, NewPhoto, Photo, PhotoView},
  store::{AccountStore, PhotoStore, Store},
};

use crate::{
  Result,
  encode::{
    RawAccount, RawPhoto, RawPhotoView, encode_count, encode_dt,
    encode_profile, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run on the database thread, inside `Connection::call` closures.

const PHOTO_VIEW_SELECT: &str = "
  SELECT p.photo_id, p.url, p.owner_id, p.likes, p.created_at,
         a.account_id, a.identifier, a.credential_hash, a.profile, a.created_at
  FROM photos p
  LEFT JOIN accounts a ON a.account_id = p.owner_id";

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAccount> {
  Ok(RawAccount {
    account_id:      row.get(0)?,
    identifier:      row.get(1)?,
    credential_hash: row.get(2)?,
    profile:         row.get(3)?,
    created_at:      row.get(4)?,
  })
}

fn photo_view_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPhotoView> {
  let owner_account_id: Option<String> = row.get(5)?;
  let owner = match owner_account_id {
    Some(account_id) => Some(RawAccount {
      account_id,
      identifier:      row.get(6)?,
      credential_hash: row.get(7)?,
      profile:         row.get(8)?,
      created_at:      row.get(9)?,
    }),
    None => None,
  };

  Ok(RawPhotoView {
    photo: RawPhoto {
      photo_id:   row.get(0)?,
      url:        row.get(1)?,
      owner_id:   row.get(2)?,
      likes:      row.get(3)?,
      created_at: row.get(4)?,
      liked_by:   Vec::new(),
    },
    owner,
  })
}

fn read_likers(
  conn: &rusqlite::Connection,
  photo_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT account_id FROM photo_likes WHERE photo_id = ?1 ORDER BY rowid",
  )?;
  stmt
    .query_map(rusqlite::params![photo_id], |r| r.get(0))?
    .collect()
}

fn read_photo(
  conn: &rusqlite::Connection,
  photo_id: &str,
) -> rusqlite::Result<Option<RawPhoto>> {
  let raw = conn
    .query_row(
      "SELECT photo_id, url, owner_id, likes, created_at
       FROM photos WHERE photo_id = ?1",
      rusqlite::params![photo_id],
      |row| {
        Ok(RawPhoto {
          photo_id:   row.get(0)?,
          url:        row.get(1)?,
          owner_id:   row.get(2)?,
          likes:      row.get(3)?,
          created_at: row.get(4)?,
          liked_by:   Vec::new(),
        })
      },
    )
    .optional()?;

  match raw {
    Some(mut raw) => {
      raw.liked_by = read_likers(conn, &raw.photo_id)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

/// Run `PHOTO_VIEW_SELECT` with `tail` appended and attach likers.
fn query_photo_views<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  tail: &str,
  params: P,
) -> rusqlite::Result<Vec<RawPhotoView>> {
  let sql = format!("{PHOTO_VIEW_SELECT} {tail}");
  let mut stmt = conn.prepare(&sql)?;
  let mut views = stmt
    .query_map(params, photo_view_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for view in &mut views {
    view.photo.liked_by = read_likers(conn, &view.photo.photo_id)?;
  }
  Ok(views)
}

fn read_photo_view(
  conn: &rusqlite::Connection,
  photo_id: &str,
) -> rusqlite::Result<Option<RawPhotoView>> {
  Ok(
    query_photo_views(conn, "WHERE p.photo_id = ?1", rusqlite::params![photo_id])?
      .pop(),
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A photoshare store backed by a single SQLite file.
///
/// The inner connection is reference-counted, so clones share it.
#[derive(Clone, Debug)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, waiting for queued calls to finish.
  ///
  /// Other clones of this store will fail with a closed-connection error
  /// afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Store for SqliteStore {
  type Error = crate::Error;
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let account = Account {
      account_id:      Uuid::new_v4(),
      identifier:      input.identifier,
      credential_hash: input.credential_hash,
      profile:         input.profile,
      created_at:      Utc::now(),
    };

    let id_str      = encode_uuid(account.account_id);
    let identifier  = account.identifier.clone();
    let hash        = account.credential_hash.clone();
    let profile_str = encode_profile(&account.profile)?;
    let at_str      = encode_dt(account.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (account_id, identifier, credential_hash, profile, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, identifier, hash, profile_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(account)
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, identifier, credential_hash, profile, created_at
               FROM accounts WHERE account_id = ?1",
              rusqlite::params![id_str],
              account_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_accounts_by_identifier(&self, identifier: &str) -> Result<Vec<Account>> {
    let identifier = identifier.to_owned();

    let raws: Vec<RawAccount> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT account_id, identifier, credential_hash, profile, created_at
           FROM accounts WHERE identifier = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![identifier], account_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }
}

// ─── PhotoStore impl ─────────────────────────────────────────────────────────

impl PhotoStore for SqliteStore {
  async fn create_photo(&self, input: NewPhoto) -> Result<Photo> {
    let photo = Photo {
      photo_id:   Uuid::new_v4(),
      url:        input.url,
      owner_id:   input.owner_id,
      likes:      0,
      liked_by:   Vec::new(),
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(photo.photo_id);
    let url       = photo.url.clone();
    let owner_str = encode_uuid(photo.owner_id);
    let at_str    = encode_dt(photo.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO photos (photo_id, url, owner_id, likes, created_at)
           VALUES (?1, ?2, ?3, 0, ?4)",
          rusqlite::params![id_str, url, owner_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(photo)
  }

  async fn get_photo(&self, id: Uuid) -> Result<Option<PhotoView>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPhotoView> = self
      .conn
      .call(move |conn| Ok(read_photo_view(conn, &id_str)?))
      .await?;

    raw.map(RawPhotoView::into_view).transpose()
  }

  async fn list_photos(&self) -> Result<Vec<PhotoView>> {
    let raws: Vec<RawPhotoView> = self
      .conn
      .call(|conn| Ok(query_photo_views(conn, "ORDER BY p.rowid", [])?))
      .await?;

    raws.into_iter().map(RawPhotoView::into_view).collect()
  }

  async fn toggle_like(&self, photo_id: Uuid, actor_id: Uuid) -> Result<Option<PhotoView>> {
    let photo_id_str = encode_uuid(photo_id);
    let actor_id_str = encode_uuid(actor_id);
    let now_str      = encode_dt(Utc::now());

    // Read, toggle and write inside one IMMEDIATE transaction. Decoding
    // failures are carried out as the inner `Result` so the transaction is
    // dropped (rolled back) without writing.
    let outcome: Option<(LikeToggle, RawPhotoView)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(raw) = read_photo(&tx, &photo_id_str)? else {
          return Ok(Ok(None));
        };
        let mut photo = match raw.into_photo() {
          Ok(photo) => photo,
          Err(e) => return Ok(Err(e)),
        };

        let toggle = photo.toggle_like(actor_id);
        let likes = match encode_count(photo.likes) {
          Ok(n) => n,
          Err(e) => return Ok(Err(e)),
        };

        match toggle {
          LikeToggle::Liked => tx.execute(
            "INSERT INTO photo_likes (photo_id, account_id, liked_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![photo_id_str, actor_id_str, now_str],
          )?,
          LikeToggle::Unliked => tx.execute(
            "DELETE FROM photo_likes WHERE photo_id = ?1 AND account_id = ?2",
            rusqlite::params![photo_id_str, actor_id_str],
          )?,
        };
        tx.execute(
          "UPDATE photos SET likes = ?2 WHERE photo_id = ?1",
          rusqlite::params![photo_id_str, likes],
        )?;
        tx.commit()?;

        let view = read_photo_view(conn, &photo_id_str)?;
        Ok(Ok(view.map(|v| (toggle, v))))
      })
      .await??;

    match outcome {
      Some((toggle, raw)) => {
        tracing::debug!(%photo_id, %actor_id, ?toggle, "toggled like");
        raw.into_view().map(Some)
      }
      None => Ok(None),
    }
  }

  async fn top_photos(&self, limit: usize) -> Result<Vec<PhotoView>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawPhotoView> = self
      .conn
      .call(move |conn| {
        Ok(query_photo_views(
          conn,
          "ORDER BY p.likes DESC, p.rowid ASC LIMIT ?1",
          rusqlite::params![limit_val],
        )?)
      })
      .await?;

    raws.into_iter().map(RawPhotoView::into_view).collect()
  }
}
