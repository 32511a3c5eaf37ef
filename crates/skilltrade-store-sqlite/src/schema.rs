//! SQL schema for the SkillTrade SQLite backend.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id         TEXT PRIMARY KEY,
    email              TEXT NOT NULL UNIQUE,   -- trimmed, lower-cased
    password_hash      TEXT NOT NULL,          -- argon2 PHC string
    email_confirmed_at TEXT,
    created_at         TEXT NOT NULL
);

-- The session this installation is signed in as. At most one row.
CREATE TABLE IF NOT EXISTS sessions (
    slot       INTEGER PRIMARY KEY CHECK (slot = 1),
    account_id TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    started_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL UNIQUE REFERENCES accounts(account_id),
    name             TEXT NOT NULL,
    email            TEXT NOT NULL,
    bio              TEXT,
    location         TEXT,
    profile_picture  TEXT,
    skills_i_have    TEXT NOT NULL DEFAULT '[]',   -- JSON array, order kept
    skills_i_want    TEXT NOT NULL DEFAULT '[]',
    top_skills       TEXT NOT NULL DEFAULT '[]',
    experience_level TEXT,                         -- snake_case variant name
    availability     TEXT,
    preferred_work   TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

PRAGMA user_version = 1;
";
