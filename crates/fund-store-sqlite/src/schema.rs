//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Removal cascades are expressed as `ON DELETE CASCADE` foreign keys, so
//! deleting a project or a comment takes its dependents with it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS principals (
    principal_id  TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    is_staff      INTEGER NOT NULL DEFAULT 0,
    is_superuser  INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a token identifier is stored.
-- At most one token of each kind per owner.
CREATE TABLE IF NOT EXISTS tokens (
    token_digest TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,   -- 'activation' | 'password_reset'
    owner_id     TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    issued_at    TEXT NOT NULL,
    UNIQUE (owner_id, kind)
);

-- Opaque per-session key/value pairs. Each identity slot is one row.
-- Rows written before the reader's cutoff are treated as absent.
CREATE TABLE IF NOT EXISTS session_values (
    session_key TEXT NOT NULL,
    value_key   TEXT NOT NULL,
    value       TEXT NOT NULL,
    written_at  TEXT NOT NULL,
    PRIMARY KEY (session_key, value_key)
);

CREATE TABLE IF NOT EXISTS projects (
    project_id    TEXT PRIMARY KEY,
    creator_id    TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'active',  -- 'active' | 'canceled' | 'completed'
    start_at      TEXT NOT NULL,
    end_at        TEXT NOT NULL,
    target_amount TEXT NOT NULL,                   -- decimal string
    created_at    TEXT NOT NULL,
    CHECK (end_at > start_at)
);

-- The donation ledger. A project's raised amount is always summed from here.
CREATE TABLE IF NOT EXISTS donations (
    donation_id TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    donor_id    TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    amount      TEXT NOT NULL,                     -- decimal string
    donated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    author_id  TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    parent_id  TEXT REFERENCES comments(comment_id) ON DELETE CASCADE,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- One rating per (project, rater); rating again overwrites.
CREATE TABLE IF NOT EXISTS ratings (
    project_id TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    rater_id   TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    value      INTEGER NOT NULL CHECK (value BETWEEN 1 AND 5),
    rated_at   TEXT NOT NULL,
    PRIMARY KEY (project_id, rater_id)
);

CREATE TABLE IF NOT EXISTS project_reports (
    report_id   TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    reporter_id TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    reason      TEXT NOT NULL,
    reported_at TEXT NOT NULL,
    UNIQUE (reporter_id, project_id)
);

CREATE TABLE IF NOT EXISTS comment_reports (
    report_id   TEXT PRIMARY KEY,
    comment_id  TEXT NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    reporter_id TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    reason      TEXT NOT NULL,
    reported_at TEXT NOT NULL,
    UNIQUE (reporter_id, comment_id)
);

CREATE INDEX IF NOT EXISTS tokens_issued_idx          ON tokens(kind, issued_at);
CREATE INDEX IF NOT EXISTS session_values_written_idx ON session_values(written_at);
CREATE INDEX IF NOT EXISTS donations_project_idx      ON donations(project_id);
CREATE INDEX IF NOT EXISTS comments_project_idx       ON comments(project_id);
CREATE INDEX IF NOT EXISTS comments_parent_idx        ON comments(parent_id);
CREATE INDEX IF NOT EXISTS project_reports_target_idx ON project_reports(project_id);
CREATE INDEX IF NOT EXISTS comment_reports_target_idx ON comment_reports(comment_id);

PRAGMA user_version = 2;
";
