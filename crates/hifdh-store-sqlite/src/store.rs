//! [`SqliteStore`] — the SQLite implementation of [`StudyStore`].

use std::{path::Path, time::Duration};

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use hifdh_core::{
  goal::{self, GoalState},
  record::{
    Actor, Credential, DailyLog, NewEntry, NewProfile, Profile, Role,
    SavedEntry,
  },
  store::StudyStore,
};

use crate::{
  Error, Result,
  encode::{
    RawCredential, RawDailyLog, RawProfile, decode_dt, encode_day, encode_dt,
    encode_quality, encode_role, encode_uuid,
  },
  error::is_busy,
  schema,
};

// ─── Store ───────────────────────────────────────────────────────────────────

const PROFILE_COLUMNS: &str = "user_id, email, role, current_sabak, \
   current_sabak_dhor, current_dhor, current_sabak_dhor_mistakes, \
   current_dhor_mistakes, weekly_goal, weekly_goal_week_key, \
   weekly_goal_start_date_key, weekly_goal_completed_date_key, \
   weekly_goal_duration_days, last_updated_by, created_at, updated_at";

const LOG_COLUMNS: &str = "user_id, date_key, sabak, sabak_dhor, dhor, \
   sabak_dhor_mistakes, dhor_mistakes, sabak_read, sabak_dhor_read, \
   dhor_read, weekly_goal, weekly_goal_week_key, \
   weekly_goal_start_date_key, weekly_goal_completed_date_key, \
   weekly_goal_duration_days, updated_by, updated_by_email, created_at, \
   updated_at";

/// Pause before the single retry of a busy call.
const BUSY_RETRY: Duration = Duration::from_millis(50);

/// A hifdh study store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and every
/// call runs on its dedicated database thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema migration.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  async fn migrate(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        schema::migrate(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the database thread, retrying once after a short pause
  /// when SQLite reports the file busy or locked (another process holds
  /// it; our own calls are already serialised).
  async fn call_retrying<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T, tokio_rusqlite::Error>
      + Clone
      + Send
      + 'static,
    T: Send + 'static,
  {
    match self.conn.call(f.clone()).await {
      Err(err) if is_busy(&err) => {
        tracing::debug!(error = %err, "database busy, retrying once");
        tokio::time::sleep(BUSY_RETRY).await;
        Ok(self.conn.call(f).await?)
      }
      other => Ok(other?),
    }
  }
}

// ─── StudyStore impl ─────────────────────────────────────────────────────────

impl StudyStore for SqliteStore {
  type Error = Error;

  // ── Accounts ───────────────────────────────────────────────────────────────

  async fn create_profile(&self, new_profile: NewProfile) -> Result<Profile> {
    let now = Utc::now();
    let profile = Profile {
      user_id: Uuid::new_v4(),
      email:   new_profile.email,
      role:    new_profile.role,

      current_sabak:               String::new(),
      current_sabak_dhor:          String::new(),
      current_dhor:                String::new(),
      current_sabak_dhor_mistakes: String::new(),
      current_dhor_mistakes:       String::new(),

      goal: GoalState::default(),

      last_updated_by: None,
      created_at:      now,
      updated_at:      now,
    };

    let id_str   = encode_uuid(profile.user_id);
    let email    = profile.email.clone();
    let hash     = new_profile.password_hash;
    let role_str = encode_role(profile.role).to_owned();
    let at_str   = encode_dt(now);

    // Domain errors ride the Ok channel out of the closure so `?` stays
    // reserved for database errors; the outer `await?` unwraps the latter.
    let inserted = self
      .call_retrying(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let taken: Option<i64> = tx
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| row.get(0),
          )
          .optional()?;
        if taken.is_some() {
          return Ok(Err(Error::EmailTaken(email.clone())));
        }

        tx.execute(
          "INSERT INTO users (user_id, email, password_hash, role, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, email, hash, role_str, at_str],
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    inserted?;

    Ok(profile)
  }

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .call_retrying(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn get_credential(&self, email: &str) -> Result<Option<Credential>> {
    let email = email.to_owned();

    let raw: Option<RawCredential> = self
      .call_retrying(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, role FROM users WHERE email = ?1",
              rusqlite::params![email],
              RawCredential::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCredential::into_credential).transpose()
  }

  async fn list_students(&self) -> Result<Vec<Profile>> {
    let role_str = encode_role(Role::Student).to_owned();

    let raws: Vec<RawProfile> = self
      .call_retrying(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM users WHERE role = ?1 ORDER BY email ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Daily entries ──────────────────────────────────────────────────────────

  async fn save_entry(
    &self,
    actor: Actor,
    user_id: Uuid,
    date_key: NaiveDate,
    entry: NewEntry,
  ) -> Result<SavedEntry> {
    let now = Utc::now();

    let saved = self
      .call_retrying(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // The profile is re-read inside the transaction, so concurrent
        // saves serialise: each applies its goal transitions to the state
        // the previous one committed.
        let raw = tx
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![encode_uuid(user_id)],
            RawProfile::from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(Err(Error::ProfileNotFound(user_id)));
        };
        let profile = match raw.into_profile() {
          Ok(p) => p,
          Err(e) => return Ok(Err(e)),
        };

        let mut next_goal = profile.goal.clone();
        if let Some(candidate) = entry.weekly_goal.as_deref() {
          next_goal = goal::propose_goal(&next_goal, candidate, date_key);
        }
        let mark = entry.mark_goal_complete && actor.role.is_admin();
        next_goal = match goal::propose_completion(&next_goal, mark, date_key)
        {
          Ok(g) => g,
          Err(e) => return Ok(Err(e.into())),
        };

        // A rewrite of the same day keeps the first save's created_at.
        let existing: Option<String> = tx
          .query_row(
            "SELECT created_at FROM daily_logs WHERE user_id = ?1 AND date_key = ?2",
            rusqlite::params![encode_uuid(user_id), encode_day(date_key)],
            |row| row.get(0),
          )
          .optional()?;
        let log_created_at = match existing.as_deref().map(decode_dt).transpose() {
          Ok(t) => t.unwrap_or(now),
          Err(e) => return Ok(Err(e)),
        };

        let log = DailyLog {
          user_id,
          date_key,

          sabak:               entry.sabak,
          sabak_dhor:          entry.sabak_dhor,
          dhor:                entry.dhor,
          sabak_dhor_mistakes: entry.sabak_dhor_mistakes,
          dhor_mistakes:       entry.dhor_mistakes,

          sabak_read:      entry.sabak_read,
          sabak_dhor_read: entry.sabak_dhor_read,
          dhor_read:       entry.dhor_read,

          goal: next_goal.clone(),

          updated_by:       actor.user_id,
          updated_by_email: actor.email.clone(),
          created_at:       log_created_at,
          updated_at:       now,
        };

        let updated = Profile {
          current_sabak:               log.sabak.clone(),
          current_sabak_dhor:          log.sabak_dhor.clone(),
          current_dhor:                log.dhor.clone(),
          current_sabak_dhor_mistakes: log.sabak_dhor_mistakes.clone(),
          current_dhor_mistakes:       log.dhor_mistakes.clone(),
          goal:                        next_goal,
          last_updated_by:             Some(actor.user_id),
          updated_at:                  now,
          ..profile
        };

        tx.execute(
          "INSERT INTO daily_logs (
             user_id, date_key,
             sabak, sabak_dhor, dhor, sabak_dhor_mistakes, dhor_mistakes,
             sabak_read, sabak_dhor_read, dhor_read,
             weekly_goal, weekly_goal_week_key, weekly_goal_start_date_key,
             weekly_goal_completed_date_key, weekly_goal_duration_days,
             updated_by, updated_by_email, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     ?13, ?14, ?15, ?16, ?17, ?18, ?19)
           ON CONFLICT (user_id, date_key) DO UPDATE SET
             sabak               = excluded.sabak,
             sabak_dhor          = excluded.sabak_dhor,
             dhor                = excluded.dhor,
             sabak_dhor_mistakes = excluded.sabak_dhor_mistakes,
             dhor_mistakes       = excluded.dhor_mistakes,
             sabak_read          = excluded.sabak_read,
             sabak_dhor_read     = excluded.sabak_dhor_read,
             dhor_read           = excluded.dhor_read,
             weekly_goal         = excluded.weekly_goal,
             weekly_goal_week_key = excluded.weekly_goal_week_key,
             weekly_goal_start_date_key = excluded.weekly_goal_start_date_key,
             weekly_goal_completed_date_key = excluded.weekly_goal_completed_date_key,
             weekly_goal_duration_days = excluded.weekly_goal_duration_days,
             updated_by          = excluded.updated_by,
             updated_by_email    = excluded.updated_by_email,
             updated_at          = excluded.updated_at",
          rusqlite::params![
            encode_uuid(log.user_id),
            encode_day(log.date_key),
            log.sabak,
            log.sabak_dhor,
            log.dhor,
            log.sabak_dhor_mistakes,
            log.dhor_mistakes,
            log.sabak_read.map(encode_quality),
            log.sabak_dhor_read.map(encode_quality),
            log.dhor_read.map(encode_quality),
            log.goal.target,
            log.goal.week_key,
            log.goal.start_date_key.map(encode_day),
            log.goal.completed_date_key.map(encode_day),
            log.goal.duration_days,
            encode_uuid(log.updated_by),
            log.updated_by_email,
            encode_dt(log.created_at),
            encode_dt(log.updated_at),
          ],
        )?;

        tx.execute(
          "UPDATE users SET
             current_sabak               = ?2,
             current_sabak_dhor          = ?3,
             current_dhor                = ?4,
             current_sabak_dhor_mistakes = ?5,
             current_dhor_mistakes       = ?6,
             weekly_goal                 = ?7,
             weekly_goal_week_key        = ?8,
             weekly_goal_start_date_key  = ?9,
             weekly_goal_completed_date_key = ?10,
             weekly_goal_duration_days   = ?11,
             last_updated_by             = ?12,
             updated_at                  = ?13
           WHERE user_id = ?1",
          rusqlite::params![
            encode_uuid(updated.user_id),
            updated.current_sabak,
            updated.current_sabak_dhor,
            updated.current_dhor,
            updated.current_sabak_dhor_mistakes,
            updated.current_dhor_mistakes,
            updated.goal.target,
            updated.goal.week_key,
            updated.goal.start_date_key.map(encode_day),
            updated.goal.completed_date_key.map(encode_day),
            updated.goal.duration_days,
            updated.last_updated_by.map(encode_uuid),
            encode_dt(updated.updated_at),
          ],
        )?;

        tx.commit()?;
        Ok(Ok(SavedEntry { log, profile: updated }))
      })
      .await?;

    saved
  }

  async fn get_entry(
    &self,
    user_id: Uuid,
    date_key: NaiveDate,
  ) -> Result<Option<DailyLog>> {
    let id_str  = encode_uuid(user_id);
    let day_str = encode_day(date_key);

    let raw: Option<RawDailyLog> = self
      .call_retrying(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {LOG_COLUMNS} FROM daily_logs WHERE user_id = ?1 AND date_key = ?2"
              ),
              rusqlite::params![id_str, day_str],
              RawDailyLog::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDailyLog::into_log).transpose()
  }

  async fn list_entries(
    &self,
    user_id: Uuid,
    limit: Option<usize>,
  ) -> Result<Vec<DailyLog>> {
    let id_str = encode_uuid(user_id);
    // SQLite reads a negative LIMIT as "no limit".
    let limit = limit.map_or(-1, |n| n as i64);

    let raws: Vec<RawDailyLog> = self
      .call_retrying(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOG_COLUMNS} FROM daily_logs
           WHERE user_id = ?1 ORDER BY date_key DESC LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit], RawDailyLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailyLog::into_log).collect()
  }
}
