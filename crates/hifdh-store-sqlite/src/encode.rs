//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, day keys as `YYYY-MM-DD`
//! (which sorts chronologically as text), UUIDs as hyphenated lowercase,
//! and the small enums under their wire spellings.

use chrono::{DateTime, NaiveDate, Utc};
use hifdh_core::{
  goal::GoalState,
  record::{Credential, DailyLog, Profile, ReadingQuality, Role},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and day keys ─────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_day(day: NaiveDate) -> String {
  day.format("%Y-%m-%d").to_string()
}

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Roles ───────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Admin => "admin",
    Role::Student => "student",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "student" => Ok(Role::Student),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

// ─── Reading quality ─────────────────────────────────────────────────────────

pub fn encode_quality(quality: ReadingQuality) -> &'static str {
  match quality {
    ReadingQuality::Excellent => "Excellent",
    ReadingQuality::Good => "Good",
    ReadingQuality::Average => "Average",
    ReadingQuality::Poor => "Poor",
  }
}

pub fn decode_quality(s: &str) -> Result<ReadingQuality> {
  match s {
    "Excellent" => Ok(ReadingQuality::Excellent),
    "Good" => Ok(ReadingQuality::Good),
    "Average" => Ok(ReadingQuality::Average),
    "Poor" => Ok(ReadingQuality::Poor),
    other => Err(Error::Decode(format!("unknown reading quality: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// The five goal columns both tables carry under the same names.
pub struct RawGoal {
  pub weekly_goal:                    String,
  pub weekly_goal_week_key:           String,
  pub weekly_goal_start_date_key:     Option<String>,
  pub weekly_goal_completed_date_key: Option<String>,
  pub weekly_goal_duration_days:      Option<i64>,
}

impl RawGoal {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      weekly_goal:                    row.get("weekly_goal")?,
      weekly_goal_week_key:           row.get("weekly_goal_week_key")?,
      weekly_goal_start_date_key:     row.get("weekly_goal_start_date_key")?,
      weekly_goal_completed_date_key: row.get("weekly_goal_completed_date_key")?,
      weekly_goal_duration_days:      row.get("weekly_goal_duration_days")?,
    })
  }

  fn into_goal(self) -> Result<GoalState> {
    Ok(GoalState {
      target:             self.weekly_goal,
      week_key:           self.weekly_goal_week_key,
      start_date_key:     self
        .weekly_goal_start_date_key
        .as_deref()
        .map(decode_day)
        .transpose()?,
      completed_date_key: self
        .weekly_goal_completed_date_key
        .as_deref()
        .map(decode_day)
        .transpose()?,
      duration_days:      self.weekly_goal_duration_days,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawProfile {
  pub user_id: String,
  pub email:   String,
  pub role:    String,

  pub current_sabak:               String,
  pub current_sabak_dhor:          String,
  pub current_dhor:                String,
  pub current_sabak_dhor_mistakes: String,
  pub current_dhor_mistakes:       String,

  pub goal: RawGoal,

  pub last_updated_by: Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawProfile {
  /// Reads by column name, so the SELECT may list columns in any order as
  /// long as all are present.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id: row.get("user_id")?,
      email:   row.get("email")?,
      role:    row.get("role")?,

      current_sabak: row.get("current_sabak")?,
      current_sabak_dhor: row.get("current_sabak_dhor")?,
      current_dhor: row.get("current_dhor")?,
      current_sabak_dhor_mistakes: row.get("current_sabak_dhor_mistakes")?,
      current_dhor_mistakes: row.get("current_dhor_mistakes")?,

      goal: RawGoal::from_row(row)?,

      last_updated_by: row.get("last_updated_by")?,
      created_at: row.get("created_at")?,
      updated_at: row.get("updated_at")?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id: decode_uuid(&self.user_id)?,
      email:   self.email,
      role:    decode_role(&self.role)?,

      current_sabak:               self.current_sabak,
      current_sabak_dhor:          self.current_sabak_dhor,
      current_dhor:                self.current_dhor,
      current_sabak_dhor_mistakes: self.current_sabak_dhor_mistakes,
      current_dhor_mistakes:       self.current_dhor_mistakes,

      goal: self.goal.into_goal()?,

      last_updated_by: self
        .last_updated_by
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row, credential columns only.
pub struct RawCredential {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
}

impl RawCredential {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get("user_id")?,
      email:         row.get("email")?,
      password_hash: row.get("password_hash")?,
      role:          row.get("role")?,
    })
  }

  pub fn into_credential(self) -> Result<Credential> {
    Ok(Credential {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
    })
  }
}

/// Raw strings read directly from a `daily_logs` row.
pub struct RawDailyLog {
  pub user_id:  String,
  pub date_key: String,

  pub sabak:               String,
  pub sabak_dhor:          String,
  pub dhor:                String,
  pub sabak_dhor_mistakes: String,
  pub dhor_mistakes:       String,

  pub sabak_read:      Option<String>,
  pub sabak_dhor_read: Option<String>,
  pub dhor_read:       Option<String>,

  pub goal: RawGoal,

  pub updated_by:       String,
  pub updated_by_email: String,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawDailyLog {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:  row.get("user_id")?,
      date_key: row.get("date_key")?,

      sabak: row.get("sabak")?,
      sabak_dhor: row.get("sabak_dhor")?,
      dhor: row.get("dhor")?,
      sabak_dhor_mistakes: row.get("sabak_dhor_mistakes")?,
      dhor_mistakes: row.get("dhor_mistakes")?,

      sabak_read: row.get("sabak_read")?,
      sabak_dhor_read: row.get("sabak_dhor_read")?,
      dhor_read: row.get("dhor_read")?,

      goal: RawGoal::from_row(row)?,

      updated_by: row.get("updated_by")?,
      updated_by_email: row.get("updated_by_email")?,
      created_at: row.get("created_at")?,
      updated_at: row.get("updated_at")?,
    })
  }

  pub fn into_log(self) -> Result<DailyLog> {
    Ok(DailyLog {
      user_id:  decode_uuid(&self.user_id)?,
      date_key: decode_day(&self.date_key)?,

      sabak:               self.sabak,
      sabak_dhor:          self.sabak_dhor,
      dhor:                self.dhor,
      sabak_dhor_mistakes: self.sabak_dhor_mistakes,
      dhor_mistakes:       self.dhor_mistakes,

      sabak_read:      self.sabak_read.as_deref().map(decode_quality).transpose()?,
      sabak_dhor_read: self
        .sabak_dhor_read
        .as_deref()
        .map(decode_quality)
        .transpose()?,
      dhor_read:       self.dhor_read.as_deref().map(decode_quality).transpose()?,

      goal: self.goal.into_goal()?,

      updated_by:       decode_uuid(&self.updated_by)?,
      updated_by_email: self.updated_by_email,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}
