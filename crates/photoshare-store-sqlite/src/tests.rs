//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use photoshare_core::{
  account::NewAccount,
  photo::NewPhoto,
  store::{AccountStore, PhotoStore},
};
use serde_json::{Map, json};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_account(identifier: &str) -> NewAccount {
  NewAccount::new(identifier, "$argon2id$v=19$stub", Map::new()).unwrap()
}

fn new_photo(owner_id: Uuid, n: usize) -> NewPhoto {
  NewPhoto {
    url: format!("https://media.example/{n}.jpg"),
    owner_id,
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_account() {
  let s = store().await;

  let mut profile = Map::new();
  profile.insert("email".into(), json!("alice@example.com"));
  let input = NewAccount::new("alice", "$argon2id$hash", profile).unwrap();

  let account = s.create_account(input).await.unwrap();
  let fetched = s.get_account(account.account_id).await.unwrap().unwrap();

  assert_eq!(fetched.identifier, "alice");
  assert_eq!(fetched.credential_hash, "$argon2id$hash");
  assert_eq!(fetched.profile["email"], "alice@example.com");
}

#[tokio::test]
async fn get_account_missing_returns_none() {
  let s = store().await;
  assert!(s.get_account(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_identifiers_are_accepted() {
  let s = store().await;
  let first = s.create_account(new_account("bob")).await.unwrap();
  let second = s.create_account(new_account("bob")).await.unwrap();
  s.create_account(new_account("carol")).await.unwrap();

  let found = s.find_accounts_by_identifier("bob").await.unwrap();
  let ids: Vec<Uuid> = found.iter().map(|a| a.account_id).collect();
  assert_eq!(ids, vec![first.account_id, second.account_id]);
}

#[tokio::test]
async fn find_by_unknown_identifier_is_empty() {
  let s = store().await;
  s.create_account(new_account("alice")).await.unwrap();
  assert!(s.find_accounts_by_identifier("mallory").await.unwrap().is_empty());
}

// ─── Photos ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_photo_starts_without_likes() {
  let s = store().await;
  let owner = s.create_account(new_account("alice")).await.unwrap();

  let photo = s.create_photo(new_photo(owner.account_id, 1)).await.unwrap();
  assert_eq!(photo.likes, 0);
  assert!(photo.liked_by.is_empty());

  let view = s.get_photo(photo.photo_id).await.unwrap().unwrap();
  assert_eq!(view.url, photo.url);
  assert_eq!(view.owner.unwrap().account_id, owner.account_id);
}

#[tokio::test]
async fn photo_with_unknown_owner_has_null_user() {
  let s = store().await;
  let photo = s.create_photo(new_photo(Uuid::new_v4(), 1)).await.unwrap();

  let view = s.get_photo(photo.photo_id).await.unwrap().unwrap();
  assert!(view.owner.is_none());
}

#[tokio::test]
async fn list_photos_in_upload_order() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let a = s.create_photo(new_photo(owner, 1)).await.unwrap();
  let b = s.create_photo(new_photo(owner, 2)).await.unwrap();
  let c = s.create_photo(new_photo(owner, 3)).await.unwrap();

  let ids: Vec<Uuid> = s
    .list_photos()
    .await
    .unwrap()
    .into_iter()
    .map(|v| v.photo_id)
    .collect();
  assert_eq!(ids, vec![a.photo_id, b.photo_id, c.photo_id]);
}

// ─── Toggle ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_twice_restores_state() {
  let s = store().await;
  let photo = s.create_photo(new_photo(Uuid::new_v4(), 1)).await.unwrap();
  let u1 = Uuid::new_v4();

  let liked = s.toggle_like(photo.photo_id, u1).await.unwrap().unwrap();
  assert_eq!(liked.likes, 1);
  assert_eq!(liked.liked_by, vec![u1]);

  let unliked = s.toggle_like(photo.photo_id, u1).await.unwrap().unwrap();
  assert_eq!(unliked.likes, 0);
  assert!(unliked.liked_by.is_empty());

  let stored = s.get_photo(photo.photo_id).await.unwrap().unwrap();
  assert_eq!(stored.likes, 0);
  assert!(stored.liked_by.is_empty());
}

#[tokio::test]
async fn toggle_returns_owner_enriched_view() {
  let s = store().await;
  let owner = s.create_account(new_account("alice")).await.unwrap();
  let photo = s.create_photo(new_photo(owner.account_id, 1)).await.unwrap();

  let view = s
    .toggle_like(photo.photo_id, Uuid::new_v4())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.owner.unwrap().identifier, "alice");
}

#[tokio::test]
async fn toggle_unknown_photo_returns_none_and_writes_nothing() {
  let s = store().await;
  let photo = s.create_photo(new_photo(Uuid::new_v4(), 1)).await.unwrap();

  let result = s.toggle_like(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());

  let untouched = s.get_photo(photo.photo_id).await.unwrap().unwrap();
  assert_eq!(untouched.likes, 0);
  assert!(untouched.liked_by.is_empty());
}

#[tokio::test]
async fn likers_keep_like_order_after_unlike() {
  let s = store().await;
  let photo = s.create_photo(new_photo(Uuid::new_v4(), 1)).await.unwrap();
  let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

  for u in [a, b, c] {
    s.toggle_like(photo.photo_id, u).await.unwrap();
  }
  let view = s.toggle_like(photo.photo_id, b).await.unwrap().unwrap();

  assert_eq!(view.liked_by, vec![a, c]);
  assert_eq!(view.likes, 2);
}

#[tokio::test]
async fn concurrent_toggles_do_not_lose_updates() {
  let s = store().await;
  let photo = s.create_photo(new_photo(Uuid::new_v4(), 1)).await.unwrap();
  let users: Vec<Uuid> = (0..32).map(|_| Uuid::new_v4()).collect();

  let mut handles = Vec::new();
  for user in users.iter().copied() {
    let s = s.clone();
    let photo_id = photo.photo_id;
    handles.push(tokio::spawn(async move {
      s.toggle_like(photo_id, user).await.unwrap()
    }));
  }
  for h in handles {
    h.await.unwrap();
  }

  let view = s.get_photo(photo.photo_id).await.unwrap().unwrap();
  assert_eq!(view.likes, users.len() as u64);
  assert_eq!(view.liked_by.len(), users.len());
  let likers: HashSet<Uuid> = view.liked_by.into_iter().collect();
  assert_eq!(likers, users.into_iter().collect());
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn top_photos_sorted_and_bounded() {
  let s = store().await;
  let owner = Uuid::new_v4();

  // Photo i receives `likes[i]` likes.
  let likes = [2usize, 0, 5, 1, 5, 3, 4];
  let mut ids = Vec::new();
  for (n, count) in likes.iter().enumerate() {
    let photo = s.create_photo(new_photo(owner, n)).await.unwrap();
    for _ in 0..*count {
      s.toggle_like(photo.photo_id, Uuid::new_v4()).await.unwrap();
    }
    ids.push(photo.photo_id);
  }

  let top = s.top_photos(5).await.unwrap();
  assert_eq!(top.len(), 5);
  assert!(top.windows(2).all(|w| w[0].likes >= w[1].likes));

  // Ties keep upload order: photo 2 before photo 4.
  let top_ids: Vec<Uuid> = top.iter().map(|v| v.photo_id).collect();
  assert_eq!(top_ids, vec![ids[2], ids[4], ids[6], ids[5], ids[0]]);
}

#[tokio::test]
async fn top_photos_with_fewer_photos_than_limit() {
  let s = store().await;
  s.create_photo(new_photo(Uuid::new_v4(), 1)).await.unwrap();
  s.create_photo(new_photo(Uuid::new_v4(), 2)).await.unwrap();

  assert_eq!(s.top_photos(5).await.unwrap().len(), 2);
  assert!(s.top_photos(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn closed_store_rejects_calls() {
  let s = store().await;
  let other = s.clone();
  s.close().await.unwrap();
  assert!(other.list_photos().await.is_err());
}

#[tokio::test]
async fn open_in_missing_directory_fails() {
  let path = std::env::temp_dir()
    .join(format!("photoshare-absent-{}", Uuid::new_v4()))
    .join("photoshare.db");
  assert!(SqliteStore::open(&path).await.is_err());
}
