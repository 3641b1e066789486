//! SQL schema for the Gatehouse SQLite directory.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    company_id       TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    model_preference TEXT,
    created_at       TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- One company per domain. Concurrent first-login provisioning resolves its
-- races on this constraint.
CREATE TABLE IF NOT EXISTS company_domains (
    domain     TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(company_id)
);

CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY,
    email            TEXT NOT NULL UNIQUE,
    first_name       TEXT NOT NULL,
    last_name        TEXT NOT NULL,
    external_subject TEXT UNIQUE,     -- NULL until first perimeter login
    company_id       TEXT NOT NULL REFERENCES companies(company_id),
    avatar_url       TEXT,
    display_name     TEXT,
    created_by       TEXT NOT NULL,   -- 'system' | 'admin'
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES users(user_id),
    expires_at       TEXT NOT NULL,
    client_ip        TEXT,
    user_agent       TEXT,
    created_at       TEXT NOT NULL,
    last_accessed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_company_idx  ON users(company_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx  ON sessions(user_id);

PRAGMA user_version = 1;
";
