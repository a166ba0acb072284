//! SQL schema for the photoshare SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- identifier is deliberately not UNIQUE.
CREATE TABLE IF NOT EXISTS accounts (
    account_id      TEXT PRIMARY KEY,
    identifier      TEXT NOT NULL,
    credential_hash TEXT NOT NULL,   -- argon2 PHC string
    profile         TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL
);

-- owner_id is not a foreign key: uploads may name any account id.
CREATE TABLE IF NOT EXISTS photos (
    photo_id   TEXT PRIMARY KEY,
    url        TEXT NOT NULL,
    owner_id   TEXT NOT NULL,
    likes      INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
    created_at TEXT NOT NULL
);

-- One row per (photo, liker). rowid order is like order.
CREATE TABLE IF NOT EXISTS photo_likes (
    photo_id   TEXT NOT NULL REFERENCES photos(photo_id),
    account_id TEXT NOT NULL,
    liked_at   TEXT NOT NULL,
    PRIMARY KEY (photo_id, account_id)
);

CREATE INDEX IF NOT EXISTS accounts_identifier_idx ON accounts(identifier);
CREATE INDEX IF NOT EXISTS photos_likes_idx        ON photos(likes DESC);

PRAGMA user_version = 1;
";
