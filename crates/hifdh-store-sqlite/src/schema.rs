//! SQL schema for the hifdh SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`; [`migrate`] runs at
//! every connection startup and upgrades older files in place.

/// The version a freshly created database carries.
pub const SCHEMA_VERSION: i64 = 2;

/// Full current schema DDL, applied to version-0 (empty) files.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,  -- always stored lowercase
    password_hash TEXT NOT NULL,         -- argon2id PHC string
    role          TEXT NOT NULL,         -- 'admin' | 'student'

    -- Mirror of the most recently saved daily log.
    current_sabak               TEXT NOT NULL DEFAULT '',
    current_sabak_dhor          TEXT NOT NULL DEFAULT '',
    current_dhor                TEXT NOT NULL DEFAULT '',
    current_sabak_dhor_mistakes TEXT NOT NULL DEFAULT '',
    current_dhor_mistakes       TEXT NOT NULL DEFAULT '',

    weekly_goal                    TEXT NOT NULL DEFAULT '',
    weekly_goal_week_key           TEXT NOT NULL DEFAULT '',
    weekly_goal_start_date_key     TEXT,
    weekly_goal_completed_date_key TEXT,
    weekly_goal_duration_days      INTEGER,

    last_updated_by TEXT,
    created_at      TEXT NOT NULL,      -- ISO 8601 UTC
    updated_at      TEXT NOT NULL
);

-- One row per student per civil day in class time.
-- Rewritten in place when the same day is saved again.
CREATE TABLE IF NOT EXISTS daily_logs (
    user_id  TEXT NOT NULL REFERENCES users(user_id),
    date_key TEXT NOT NULL,             -- YYYY-MM-DD

    sabak               TEXT NOT NULL DEFAULT '',
    sabak_dhor          TEXT NOT NULL DEFAULT '',
    dhor                TEXT NOT NULL DEFAULT '',
    sabak_dhor_mistakes TEXT NOT NULL DEFAULT '',
    dhor_mistakes       TEXT NOT NULL DEFAULT '',

    sabak_read      TEXT,               -- 'Excellent'|'Good'|'Average'|'Poor'
    sabak_dhor_read TEXT,
    dhor_read       TEXT,

    -- Goal state as of this save, frozen for history.
    weekly_goal                    TEXT NOT NULL DEFAULT '',
    weekly_goal_week_key           TEXT NOT NULL DEFAULT '',
    weekly_goal_start_date_key     TEXT,
    weekly_goal_completed_date_key TEXT,
    weekly_goal_duration_days      INTEGER,

    updated_by       TEXT NOT NULL,
    updated_by_email TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,

    PRIMARY KEY (user_id, date_key)
);

CREATE INDEX IF NOT EXISTS users_role_email_idx ON users(role, email);

PRAGMA user_version = 2;
";

/// Version 1 named the reading-quality columns `*_read_quality`.
const MIGRATE_V1_TO_V2: &str = "
ALTER TABLE daily_logs RENAME COLUMN sabak_read_quality      TO sabak_read;
ALTER TABLE daily_logs RENAME COLUMN sabak_dhor_read_quality TO sabak_dhor_read;
ALTER TABLE daily_logs RENAME COLUMN dhor_read_quality       TO dhor_read;

CREATE INDEX IF NOT EXISTS users_role_email_idx ON users(role, email);

PRAGMA user_version = 2;
";

/// Bring a connection's database up to [`SCHEMA_VERSION`], creating it
/// from scratch when empty. Also applies the per-connection pragmas, so
/// call it on every open, not just the first.
pub fn migrate(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  // journal_mode persists in the file; foreign_keys must be re-enabled on
  // every connection.
  conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;

  let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

  if version < 1 {
    conn.execute_batch(SCHEMA)?;
  } else if version == 1 {
    tracing::info!(from = version, to = SCHEMA_VERSION, "migrating database");
    conn.execute_batch(MIGRATE_V1_TO_V2)?;
  } else if version > SCHEMA_VERSION {
    tracing::warn!(
      version,
      supported = SCHEMA_VERSION,
      "database is newer than this build"
    );
  }

  Ok(())
}
