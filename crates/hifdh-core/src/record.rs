//! Profile and daily-log records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::goal::GoalState;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Account role. Assigned when the account is created and never changed by
/// any later operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Student,
}

impl Role {
  pub fn is_admin(self) -> bool { matches!(self, Self::Admin) }
}

/// The authenticated identity performing a request, as recorded in audit
/// fields on whatever it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
  pub user_id: Uuid,
  pub email:   String,
  pub role:    Role,
}

/// A stored login credential. Holds the password hash, so it stays inside
/// the auth path and is never serialised into a response.
#[derive(Debug, Clone)]
pub struct Credential {
  pub user_id:       Uuid,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

// ─── Reading quality ─────────────────────────────────────────────────────────

/// Teacher's assessment of how well a portion was recited, on the fixed
/// four-point scale historical records use (serialised capitalised).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingQuality {
  Excellent,
  Good,
  Average,
  Poor,
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// One account: identity, role, the goal state, and a mirror of the most
/// recently saved daily log so a dashboard needs only this one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub user_id: Uuid,
  pub email:   String,
  pub role:    Role,

  pub current_sabak:               String,
  pub current_sabak_dhor:          String,
  pub current_dhor:                String,
  pub current_sabak_dhor_mistakes: String,
  pub current_dhor_mistakes:       String,

  #[serde(flatten)]
  pub goal: GoalState,

  /// Who last wrote this profile (via a saved entry), if anyone has.
  pub last_updated_by: Option<Uuid>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Profile {
  pub fn actor(&self) -> Actor {
    Actor {
      user_id: self.user_id,
      email:   self.email.clone(),
      role:    self.role,
    }
  }
}

/// Input to [`crate::store::StudyStore::create_profile`]. The id and
/// timestamps are always chosen by the store.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

// ─── Daily logs ──────────────────────────────────────────────────────────────

/// One day's study record for one student, upserted by day key. The goal
/// fields are a snapshot of the profile's goal state as of the save, so
/// history shows the goal each day was studied under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
  pub user_id:  Uuid,
  pub date_key: NaiveDate,

  pub sabak:               String,
  pub sabak_dhor:          String,
  pub dhor:                String,
  pub sabak_dhor_mistakes: String,
  pub dhor_mistakes:       String,

  pub sabak_read:      Option<ReadingQuality>,
  pub sabak_dhor_read: Option<ReadingQuality>,
  pub dhor_read:       Option<ReadingQuality>,

  #[serde(flatten)]
  pub goal: GoalState,

  pub updated_by:       Uuid,
  pub updated_by_email: String,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Input to [`crate::store::StudyStore::save_entry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEntry {
  pub sabak:               String,
  pub sabak_dhor:          String,
  pub dhor:                String,
  pub sabak_dhor_mistakes: String,
  pub dhor_mistakes:       String,

  pub sabak_read:      Option<ReadingQuality>,
  pub sabak_dhor_read: Option<ReadingQuality>,
  pub dhor_read:       Option<ReadingQuality>,

  /// Candidate weekly-goal target. Blank (or absent) leaves the recorded
  /// goal untouched.
  pub weekly_goal: Option<String>,
  /// Request completion of the open goal. Honoured only when the actor is
  /// an admin.
  pub mark_goal_complete: bool,
}

/// Both records as committed by one save, returned so the caller shows
/// exactly the write that happened rather than re-reading racily.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEntry {
  pub log:     DailyLog,
  pub profile: Profile,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
